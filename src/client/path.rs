//! Directory context around single-file operations.
//!
//! `smbclient` commands act relative to the shell's current directory, so an
//! operation on `a/b/file.txt` becomes `cd "a/b"`, the command on
//! `file.txt`, then one `cd ".."` per directory entered.

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use super::{Outcome, SmbClient};
use crate::error::SmbError;
use crate::Result;

/// A remote path split into the directories to enter and the leaf name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath<'p> {
    pub dirs: Vec<&'p str>,
    pub leaf: &'p str,
}

impl<'p> RemotePath<'p> {
    /// Split `path` on `/`. Empty components (leading, trailing or doubled
    /// slashes, or an empty path) are rejected.
    pub fn parse(path: &'p str) -> Result<Self> {
        let mut parts: Vec<&str> = path.split('/').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(SmbError::InvalidPath(path.to_string()));
        }
        let leaf = parts.pop().unwrap_or_default();
        Ok(Self { dirs: parts, leaf })
    }

    /// The directory prefix as one `cd` argument, if there is one.
    pub fn prefix(&self) -> Option<String> {
        if self.dirs.is_empty() {
            None
        } else {
            Some(self.dirs.join("/"))
        }
    }
}

impl SmbClient {
    /// Run `op` on the leaf of `path` from inside its parent directory.
    ///
    /// With a single component no directory change happens. Otherwise the
    /// shell enters the prefix first; if that `cd` fails its outcome is
    /// returned and `op` never runs. After `op`, one `cd ".."` is issued
    /// per directory entered, also when `op` fails or returns an error.
    pub async fn with_file_context<F>(&mut self, path: &str, op: F) -> Result<Outcome>
    where
        F: for<'a> FnOnce(&'a mut SmbClient, String) -> BoxFuture<'a, Result<Outcome>>,
    {
        let remote = RemotePath::parse(path)?;
        let leaf = remote.leaf.to_string();

        let Some(prefix) = remote.prefix() else {
            return op(self, leaf).await;
        };

        let entered = self.cd(&prefix).await?;
        if entered.is_failure() {
            debug!(path, "could not enter parent directory");
            return Ok(entered);
        }

        let result = op(&mut *self, leaf).await;
        let restored = self.leave(remote.dirs.len()).await;

        match (result, restored) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(outcome), Ok(())) => Ok(outcome),
        }
    }

    /// Issue `levels` times `cd ".."`.
    pub(crate) async fn leave(&mut self, levels: usize) -> Result<()> {
        for _ in 0..levels {
            let back = self.cd("..").await?;
            if back.is_failure() {
                warn!(message = back.message(), "failed to return to parent directory");
            }
        }
        Ok(())
    }
}
