//! Native PTY implementation using portable-pty.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, PtySize as NativePtySize};
use tracing::{debug, warn};

use super::SpawnSpec;
use crate::error::SmbError;
use crate::Result;

/// How often a terminating child is polled for exit.
const REAP_POLL: Duration = Duration::from_millis(20);

/// Wrapper around the native PTY system.
pub struct NativePty {
    pty_system: Box<dyn portable_pty::PtySystem + Send>,
}

impl NativePty {
    /// Create a new NativePty instance.
    pub fn new() -> Self {
        Self {
            pty_system: native_pty_system(),
        }
    }

    /// Spawn `spec.program` with its arguments and environment in a new PTY.
    pub fn spawn(&mut self, spec: &SpawnSpec) -> Result<SpawnedProcess> {
        let native_size = NativePtySize {
            rows: spec.size.rows,
            cols: spec.size.cols,
            pixel_width: 0,
            pixel_height: 0,
        };

        let pair = self
            .pty_system
            .openpty(native_size)
            .map_err(|e| SmbError::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&spec.program);
        cmd.args(&spec.args);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| SmbError::Pty(format!("failed to spawn {}: {}", spec.program, e)))?;
        // The master only sees EOF once every slave handle is gone.
        drop(pair.slave);

        let pid = child.process_id().unwrap_or(0);
        debug!(program = %spec.program, pid, "spawned child in PTY");

        SpawnedProcess::from_child(ChildProcess {
            master: Some(pair.master),
            child,
            pid,
        })
    }
}

impl Default for NativePty {
    fn default() -> Self {
        Self::new()
    }
}

/// A freshly spawned process: its PTY streams plus the child handle.
pub struct SpawnedProcess {
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    child: ChildProcess,
}

impl SpawnedProcess {
    /// Open the PTY streams of `child`. If that fails the child is killed
    /// and reaped before the error is returned.
    fn from_child(child: ChildProcess) -> Result<Self> {
        match child.open_streams() {
            Ok((reader, writer)) => Ok(Self {
                reader,
                writer,
                child,
            }),
            Err(e) => {
                warn!(pid = child.pid, "PTY setup failed, reaping child: {}", e);
                if let Err(reap) = child.terminate(Duration::ZERO) {
                    warn!("failed to reap child: {}", reap);
                }
                Err(e)
            }
        }
    }

    /// Process ID of the child.
    pub fn pid(&self) -> u32 {
        self.child.pid
    }

    /// Split into reader, writer and child handle.
    pub fn into_parts(self) -> (Box<dyn Read + Send>, Box<dyn Write + Send>, ChildProcess) {
        (self.reader, self.writer, self.child)
    }
}

/// Owned handle to the child process and its PTY master.
pub struct ChildProcess {
    master: Option<Box<dyn portable_pty::MasterPty + Send>>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    pid: u32,
}

impl ChildProcess {
    /// Process ID of the child (0 if the platform didn't report one).
    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn open_streams(&self) -> Result<(Box<dyn Read + Send>, Box<dyn Write + Send>)> {
        let master = self
            .master
            .as_ref()
            .ok_or_else(|| SmbError::Pty("PTY master already closed".to_string()))?;
        let reader = master
            .try_clone_reader()
            .map_err(|e| SmbError::Pty(e.to_string()))?;
        let writer = master
            .take_writer()
            .map_err(|e| SmbError::Pty(e.to_string()))?;
        Ok((reader, writer))
    }

    /// Check whether the child has exited, without blocking.
    pub fn try_wait(&mut self) -> std::io::Result<Option<portable_pty::ExitStatus>> {
        self.child.try_wait()
    }

    /// Wait up to `grace` for the child to exit on its own, then kill it,
    /// and always reap it.
    ///
    /// Blocking: run it on a blocking thread.
    pub fn terminate(mut self, grace: Duration) -> std::io::Result<portable_pty::ExitStatus> {
        let deadline = Instant::now() + grace;
        loop {
            if let Some(status) = self.child.try_wait()? {
                debug!(pid = self.pid, ?status, "child exited");
                self.master.take();
                return Ok(status);
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(REAP_POLL);
        }

        warn!(pid = self.pid, "child still running after {:?}, killing", grace);
        if let Err(e) = self.child.kill() {
            // Already gone between the last poll and the kill.
            debug!(pid = self.pid, "kill failed: {}", e);
        }
        let status = self.child.wait();
        // Dropping the master unblocks the reader thread.
        self.master.take();
        status
    }
}
