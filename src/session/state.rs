//! Session state machine.

/// Lifecycle state of a shell session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Child spawned, initial prompt not seen yet.
    #[default]
    Connecting,
    /// Prompt seen, no command outstanding.
    Ready,
    /// A command was sent and its prompt has not come back.
    Busy,
    /// Child terminated and reaped; the session cannot be reused.
    Closed,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Connecting -> Ready
    /// - Connecting -> Closed
    /// - Ready -> Busy
    /// - Ready -> Closed
    /// - Busy -> Ready
    /// - Busy -> Closed
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Connecting, Ready)
                | (Connecting, Closed)
                | (Ready, Busy)
                | (Ready, Closed)
                | (Busy, Ready)
                | (Busy, Closed)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::SmbError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed)
    }

    /// Whether the initial prompt was seen and the session is still open.
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Ready | SessionState::Busy)
    }

    /// Check if the session can accept a command right now.
    ///
    /// `Busy` outside of a running `ask` means a previous wait was
    /// abandoned midway and the output stream is no longer aligned.
    pub fn can_ask(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}
