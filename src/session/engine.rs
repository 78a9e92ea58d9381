//! The session engine: one child shell, one command at a time.

use std::sync::LazyLock;
use std::time::Duration;

use regex::bytes::Regex;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use super::config::SessionConfig;
use super::quote::wrap_command;
use super::state::SessionState;
use crate::error::{ConnectFailure, SmbError};
use crate::expect::PatternReader;
use crate::output::OutputSanitizer;
use crate::pty::{ChildProcess, Transport};
use crate::Result;

/// Prompt that ends every response: `smb: \` plus the current directory,
/// at the start of a line. Anchoring on the line start keeps the echo of a
/// command from matching.
pub const PROMPT_PATTERN: &str = r"(?m)^smb:.*\\>";

/// Prompt that ends the connection banner. Banner lines may precede it.
pub const INITIAL_PROMPT_PATTERN: &str = r"(?:.*\n)?smb:.*\\>";

/// Grace period for the child to exit after its input is closed.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROMPT_PATTERN).expect("prompt pattern compiles"));

static INITIAL_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(INITIAL_PROMPT_PATTERN).expect("initial prompt pattern compiles")
});

/// A live connection to an interactive `smbclient`.
///
/// Commands are strictly sequential: [`ask`](Self::ask) takes `&mut self`,
/// and a wait abandoned midway (its future dropped) leaves the session in
/// [`SessionState::Busy`], which refuses further commands because the
/// output stream can no longer be matched to them.
pub struct Session {
    input: Option<mpsc::Sender<Vec<u8>>>,
    reader: PatternReader,
    child: Option<ChildProcess>,
    state: SessionState,
    timeout: Duration,
    depth: usize,
    span: Span,
}

impl Session {
    /// Spawn `smbclient` for `config` and wait for its first prompt.
    pub async fn connect(config: &SessionConfig) -> Result<Session> {
        let span = info_span!("smb_session", host = %config.host, share = %config.share);
        Self::connect_with_span(config, span).await
    }

    /// Like [`connect`](Self::connect), logging under a caller-owned span.
    pub async fn connect_with_span(config: &SessionConfig, span: Span) -> Result<Session> {
        let spec = config.spawn_spec();
        let (transport, child) = {
            let _enter = span.enter();
            info!(program = %spec.program, service = %config.service(), "spawning client");
            Transport::spawn(&spec).map_err(|e| {
                warn!(program = %spec.program, "could not start client: {}", e);
                SmbError::Connect {
                    kind: ConnectFailure::Spawn,
                    transcript: e.to_string(),
                }
            })?
        };
        Self::establish(transport, Some(child), config.command_timeout(), span).await
    }

    /// Run the session over an already running shell, e.g. a scripted one.
    pub async fn attach(transport: Transport, timeout: Duration) -> Result<Session> {
        Self::attach_with_span(transport, timeout, info_span!("smb_session")).await
    }

    /// Like [`attach`](Self::attach), logging under a caller-owned span.
    pub async fn attach_with_span(
        transport: Transport,
        timeout: Duration,
        span: Span,
    ) -> Result<Session> {
        Self::establish(transport, None, timeout, span).await
    }

    async fn establish(
        transport: Transport,
        child: Option<ChildProcess>,
        timeout: Duration,
        span: Span,
    ) -> Result<Session> {
        let mut session = Session {
            input: Some(transport.input),
            reader: PatternReader::new(transport.output),
            child,
            state: SessionState::Connecting,
            timeout,
            depth: 0,
            span: span.clone(),
        };

        let seen = session
            .reader
            .expect(&INITIAL_PROMPT, timeout)
            .instrument(span.clone())
            .await;

        let (failure, transcript) = match seen {
            Ok(banner) => {
                let text = OutputSanitizer::strip_ansi(&banner.raw);
                (classify_banner(&text), text)
            }
            Err(e) => {
                let text = OutputSanitizer::strip_ansi_str(e.partial());
                let kind = classify_banner(&text).unwrap_or(ConnectFailure::Unrecognized);
                (Some(kind), text)
            }
        };

        if let Some(kind) = failure {
            warn!(parent: &span, %kind, "connection failed");
            session.shutdown().await;
            return Err(SmbError::Connect { kind, transcript });
        }

        session.state.transition_to(SessionState::Ready)?;
        info!(parent: &span, pid = ?session.pid(), "connected");
        Ok(session)
    }

    /// Send one command line and return everything printed up to the next
    /// prompt, ANSI sequences stripped.
    ///
    /// The response starts with the tail of the previous prompt and the
    /// terminal's echo of `command`. If no prompt shows up within the
    /// timeout the child is terminated and reaped, and the session is closed.
    pub async fn ask(&mut self, command: &str) -> Result<String> {
        let span = self.span.clone();
        self.ask_inner(command).instrument(span).await
    }

    /// [`ask`](Self::ask) with every argument sanitized and double-quoted.
    pub async fn ask_wrapped(&mut self, command: &str, args: &[&str]) -> Result<String> {
        self.ask(&wrap_command(command, args)).await
    }

    async fn ask_inner(&mut self, command: &str) -> Result<String> {
        if !self.state.can_ask() {
            return Err(SmbError::NotConnected(self.state));
        }
        let input = self.input.clone().ok_or(SmbError::ChannelClosed)?;

        self.state.transition_to(SessionState::Busy)?;
        debug!(command, "sending");

        if input.send(format!("{}\n", command).into_bytes()).await.is_err() {
            warn!(command, "shell input closed");
            self.shutdown().await;
            return Err(SmbError::Command {
                command: command.to_string(),
                transcript: String::new(),
            });
        }

        match self.reader.expect(&PROMPT, self.timeout).await {
            Ok(response) => {
                self.state.transition_to(SessionState::Ready)?;
                let text = OutputSanitizer::strip_ansi(&response.raw);
                debug!(command, bytes = response.raw.len(), "response complete");
                Ok(text)
            }
            Err(e) => {
                warn!(command, "no prompt: {}", e);
                let transcript = OutputSanitizer::strip_ansi_str(e.partial());
                self.shutdown().await;
                Err(SmbError::Command {
                    command: command.to_string(),
                    transcript,
                })
            }
        }
    }

    /// Close the shell's input, wait for it to exit (killing it after a
    /// grace period) and reap it. Closing twice is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Ok(());
        }
        let span = self.span.clone();
        async {
            self.shutdown().await;
            info!("session closed");
        }
        .instrument(span)
        .await;
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.input.take();
        self.reader.close();
        self.state = SessionState::Closed;

        if let Some(child) = self.child.take() {
            let pid = child.pid();
            match tokio::task::spawn_blocking(move || child.terminate(CLOSE_GRACE)).await {
                Ok(Ok(status)) => debug!(pid, ?status, "child reaped"),
                Ok(Err(e)) => warn!(pid, "failed to reap child: {}", e),
                Err(e) => warn!(pid, "reaper task failed: {}", e),
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the initial prompt was seen and the session is still open.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Per-command timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How many directories below the share root the shell's cursor sits,
    /// as far as successful `cd` commands tell.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Child process ID, if a real process backs this session.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(ChildProcess::pid)
    }

    /// The span this session logs under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Apply a successful `cd dir` to the tracked depth.
    pub(crate) fn record_cd(&mut self, dir: &str) {
        if dir.starts_with('/') || dir.starts_with('\\') {
            self.depth = 0;
        }
        for part in dir.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => self.depth = self.depth.saturating_sub(1),
                _ => self.depth += 1,
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            warn!(parent: &self.span, pid = child.pid(), "session dropped without close, reaping child");
            self.input.take();
            std::thread::spawn(move || {
                let _ = child.terminate(CLOSE_GRACE);
            });
        }
    }
}

/// Look for failure markers in the banner that preceded the first prompt.
fn classify_banner(text: &str) -> Option<ConnectFailure> {
    if text.contains("NT_STATUS") {
        Some(ConnectFailure::Status)
    } else if text.contains("timed out") || text.contains("Server stopped") {
        Some(ConnectFailure::TimedOut)
    } else {
        None
    }
}
