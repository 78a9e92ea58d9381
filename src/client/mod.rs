//! High-level file operations over a [`Session`].
//!
//! Every operation is one or a few `ask` calls plus a recognizer from
//! [`classify`]. Remote failures come back as an unsuccessful [`Outcome`];
//! only session-level problems are errors.

pub mod classify;
pub mod listing;
mod outcome;
pub mod path;
mod remove;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tracing::{debug, Span};

use crate::session::{quote, Session, SessionConfig};
use crate::Result;
use classify::Operation;
use listing::{index_by_name, parse_listing};

pub use listing::{DirEntry, EntryKind, Modified};
pub use outcome::{status_line, Outcome};

/// Mask that lists everything in the current directory.
pub const ALL: &str = "*";

/// An `smbclient` session with typed file operations.
pub struct SmbClient {
    session: Session,
}

impl SmbClient {
    /// Connect with `config`.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        Ok(Self::new(Session::connect(config).await?))
    }

    /// Connect, logging under `span`.
    pub async fn connect_with_span(config: &SessionConfig, span: Span) -> Result<Self> {
        Ok(Self::new(Session::connect_with_span(config, span).await?))
    }

    /// Wrap an established session.
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send a raw command line. Arguments are not quoted.
    pub async fn ask(&mut self, command: &str) -> Result<String> {
        self.session.ask(command).await
    }

    /// Close the session and reap the shell.
    pub async fn close(&mut self) -> Result<()> {
        self.session.close().await
    }

    /// List entries matching `mask`, keyed and sorted by name.
    ///
    /// A file and a directory sharing a name collapse into one key; see
    /// [`ls_entries`](Self::ls_entries) for the full listing.
    pub async fn ls(&mut self, mask: &str) -> Result<BTreeMap<String, DirEntry>> {
        Ok(index_by_name(self.ls_entries(mask).await?))
    }

    /// List entries matching `mask` in the order the server printed them.
    pub async fn ls_entries(&mut self, mask: &str) -> Result<Vec<DirEntry>> {
        let response = self.session.ask_wrapped("ls", &[mask]).await?;
        let entries = parse_listing(&response);
        debug!(mask, count = entries.len(), "listed");
        Ok(entries)
    }

    /// Whether `path` names an existing file or directory.
    pub async fn exists(&mut self, path: &str) -> Result<bool> {
        let basename = path.rsplit('/').next().unwrap_or(path);
        if basename.is_empty() {
            return Ok(false);
        }
        Ok(self.ls(path).await?.contains_key(basename))
    }

    /// Change the shell's directory and track the new depth.
    pub async fn cd(&mut self, dir: &str) -> Result<Outcome> {
        let response = self.session.ask_wrapped("cd", &[dir]).await?;
        let outcome = Operation::Cd.outcome(&response);
        if outcome.is_success() {
            self.session.record_cd(&quote::sanitize_filename(dir));
        }
        Ok(outcome)
    }

    /// Download `remote` to the local path `local`.
    pub async fn get(&mut self, remote: &str, local: impl AsRef<Path>) -> Result<Outcome> {
        let local = local.as_ref().to_string_lossy().into_owned();
        self.with_file_context(remote, move |client, file| {
            Box::pin(async move {
                let response = client
                    .session
                    .ask_wrapped("get", &[file.as_str(), local.as_str()])
                    .await?;
                Ok(Operation::Get.outcome(&response))
            })
        })
        .await
    }

    /// Upload the local file `local` to `remote`.
    pub async fn put(&mut self, local: impl AsRef<Path>, remote: &str) -> Result<Outcome> {
        let local = local.as_ref().to_string_lossy().into_owned();
        let response = self.session.ask_wrapped("put", &[local.as_str(), remote]).await?;
        Ok(Operation::Put.outcome(&response))
    }

    /// Upload `content` as `remote`, staged through a local temp file that
    /// is removed afterwards.
    pub async fn put_content(&mut self, content: &[u8], remote: &str) -> Result<Outcome> {
        let mut staged = tempfile::Builder::new()
            .prefix("smb-pilot-upload-")
            .tempfile()?;
        staged.write_all(content)?;
        staged.flush()?;

        let outcome = self.put(staged.path(), remote).await;
        drop(staged);
        outcome
    }

    /// Delete the file `remote`.
    pub async fn del(&mut self, remote: &str) -> Result<Outcome> {
        self.with_file_context(remote, |client, file| {
            Box::pin(async move { client.delete_here(&file).await })
        })
        .await
    }

    /// Delete `name` in the current directory.
    pub(crate) async fn delete_here(&mut self, name: &str) -> Result<Outcome> {
        let response = self.session.ask_wrapped("del", &[name]).await?;
        Ok(Operation::Del.outcome(&response))
    }

    /// Rename `from` to `to`.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<Outcome> {
        let response = self.session.ask_wrapped("rename", &[from, to]).await?;
        Ok(Operation::Rename.outcome(&response))
    }

    /// Create the directory `dir`. A blank name fails without asking the
    /// shell.
    pub async fn mkdir(&mut self, dir: &str) -> Result<Outcome> {
        if dir.trim().is_empty() {
            return Ok(Outcome::failure("directory name is empty"));
        }
        let response = self.session.ask_wrapped("mkdir", &[dir]).await?;
        Ok(Operation::Mkdir.outcome(&response))
    }
}
