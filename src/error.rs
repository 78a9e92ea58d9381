//! Error types for smb-pilot.

use std::fmt;

use thiserror::Error;

use crate::session::SessionState;

/// Why the initial prompt never turned into a usable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    /// The shell reported a status code (bad credentials, unknown share...).
    Status,
    /// The shell reported a timeout or that the server stopped.
    TimedOut,
    /// No recognizable prompt appeared before the timeout or EOF.
    Unrecognized,
    /// The client program could not be started.
    Spawn,
}

impl fmt::Display for ConnectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => write!(f, "status failure"),
            Self::TimedOut => write!(f, "timed out or server stopped"),
            Self::Unrecognized => write!(f, "no recognizable prompt"),
            Self::Spawn => write!(f, "could not start client"),
        }
    }
}

/// Main error type for smb-pilot operations.
///
/// Recognized remote failures (missing file, access denied...) are not
/// errors: they come back as an unsuccessful [`Outcome`](crate::Outcome).
#[derive(Error, Debug)]
pub enum SmbError {
    /// PTY-related error (spawn, clone reader/writer).
    #[error("PTY error: {0}")]
    Pty(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The shell never produced a usable prompt. The child has been reaped.
    #[error("connection failed ({kind}): {}", first_line(.transcript))]
    Connect {
        kind: ConnectFailure,
        transcript: String,
    },

    /// No prompt followed a command. The child has been reaped.
    #[error("no prompt after command `{command}`")]
    Command { command: String, transcript: String },

    /// The session cannot accept a command in its current state.
    #[error("session not connected: current state is {0:?}")]
    NotConnected(SessionState),

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: SessionState, to: SessionState },

    /// A remote path with empty components.
    #[error("invalid remote path: {0:?}")]
    InvalidPath(String),

    /// The session has no shell input left.
    #[error("channel closed")]
    ChannelClosed,
}

impl SmbError {
    /// Text the shell produced before things went wrong, if any.
    pub fn transcript(&self) -> Option<&str> {
        match self {
            Self::Connect { transcript, .. } | Self::Command { transcript, .. } => {
                Some(transcript)
            }
            _ => None,
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("<no output>")
}

/// Convenience Result type for smb-pilot operations.
pub type Result<T> = std::result::Result<T, SmbError>;
