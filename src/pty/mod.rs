//! PTY (Pseudo-Terminal) layer.
//!
//! The child shell lives behind a PTY. Its blocking reader and writer are
//! pumped on blocking threads into tokio channels, which together form a
//! [`Transport`]. The session engine only ever sees the channels, so a
//! scripted shell can stand in for the real process in tests.

mod async_adapter;
mod native;

pub use async_adapter::{AsyncPtyReader, AsyncPtyWriter};
pub use native::{ChildProcess, NativePty, SpawnedProcess};

use tokio::sync::mpsc;

/// Channel depth between the PTY threads and the session.
const CHANNEL_CAPACITY: usize = 64;

/// Size of a PTY in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    /// Number of rows (height).
    pub rows: u16,
    /// Number of columns (width).
    pub cols: u16,
}

impl PtySize {
    /// Create a new PtySize with the given dimensions.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for PtySize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Everything needed to launch a program inside a PTY.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    /// Program to execute (looked up on `PATH`).
    pub program: String,
    /// Arguments, passed verbatim (no shell involved).
    pub args: Vec<String>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Terminal size.
    pub size: PtySize,
}

impl SpawnSpec {
    /// Create a spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            size: PtySize::default(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the terminal size.
    pub fn size(mut self, size: PtySize) -> Self {
        self.size = size;
        self
    }
}

/// Byte channels to and from a running shell.
///
/// `input` carries bytes to the shell's stdin; `output` yields whatever the
/// shell prints, in arbitrary chunks. `output` returning `None` means EOF.
#[derive(Debug)]
pub struct Transport {
    pub input: mpsc::Sender<Vec<u8>>,
    pub output: mpsc::Receiver<Vec<u8>>,
}

/// The shell's side of a [`Transport`], used to script a fake shell.
#[derive(Debug)]
pub struct TransportPeer {
    /// Bytes written by the session.
    pub input: mpsc::Receiver<Vec<u8>>,
    /// Bytes to deliver to the session as shell output.
    pub output: mpsc::Sender<Vec<u8>>,
}

impl Transport {
    /// Create a connected transport / peer pair.
    pub fn pair() -> (Transport, TransportPeer) {
        let (input_tx, input_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (output_tx, output_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Transport {
                input: input_tx,
                output: output_rx,
            },
            TransportPeer {
                input: input_rx,
                output: output_tx,
            },
        )
    }

    /// Spawn `spec` in a PTY and wire its reader and writer to a transport.
    ///
    /// Must be called inside a tokio runtime: the pump loops run as tasks.
    pub fn spawn(spec: &SpawnSpec) -> crate::Result<(Transport, ChildProcess)> {
        let mut pty = NativePty::new();
        let spawned = pty.spawn(spec)?;
        let (reader, writer, child) = spawned.into_parts();

        let (transport, peer) = Transport::pair();
        tokio::spawn(AsyncPtyReader::new(reader, peer.output).run());
        tokio::spawn(AsyncPtyWriter::new(writer, peer.input).run());

        Ok((transport, child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pty_size_default() {
        let size = PtySize::default();
        assert_eq!(size.rows, 24);
        assert_eq!(size.cols, 80);
    }

    #[test]
    fn test_spawn_spec_builder() {
        let spec = SpawnSpec::new("smbclient")
            .arg("//127.0.0.1/share")
            .arg("-N")
            .env("COLUMNS", "132")
            .size(PtySize::new(24, 132));

        assert_eq!(spec.program, "smbclient");
        assert_eq!(spec.args, vec!["//127.0.0.1/share", "-N"]);
        assert_eq!(spec.env, vec![("COLUMNS".to_string(), "132".to_string())]);
        assert_eq!(spec.size.cols, 132);
    }

    #[tokio::test]
    async fn test_transport_pair_is_crossed() {
        let (mut transport, mut peer) = Transport::pair();

        transport.input.send(b"ls\n".to_vec()).await.unwrap();
        assert_eq!(peer.input.recv().await.unwrap(), b"ls\n");

        peer.output.send(b"smb: \\> ".to_vec()).await.unwrap();
        assert_eq!(transport.output.recv().await.unwrap(), b"smb: \\> ");

        drop(peer);
        assert!(transport.output.recv().await.is_none());
    }
}
