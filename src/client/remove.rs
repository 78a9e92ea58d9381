//! Recursive directory removal.

use std::ops::ControlFlow;

use futures_util::future::BoxFuture;
use tracing::debug;

use super::classify::Operation;
use super::path::RemotePath;
use super::{Outcome, SmbClient, ALL};
use crate::Result;

impl SmbClient {
    /// Remove `dir` and everything below it.
    ///
    /// Files are deleted first, then subdirectories are removed depth-first,
    /// each in listing order. The first failing child stops the whole
    /// removal and its outcome is returned; siblings are left alone. The
    /// shell's directory is restored in every case that leaves the session
    /// usable.
    pub async fn rmdir(&mut self, dir: &str) -> Result<Outcome> {
        self.remove_tree(dir).await
    }

    fn remove_tree<'a>(&'a mut self, dir: &'a str) -> BoxFuture<'a, Result<Outcome>> {
        Box::pin(async move {
            let levels = RemotePath::parse(dir)?.dirs.len() + 1;

            let entered = self.cd(dir).await?;
            if entered.is_failure() {
                return Ok(entered);
            }

            let cleared = self.clear_current_directory().await;
            let restored = self.leave(levels).await;

            if let ControlFlow::Break(failure) = cleared? {
                restored?;
                debug!(dir, message = failure.message(), "removal aborted");
                return Ok(failure);
            }
            restored?;

            let response = self.session.ask_wrapped("rmdir", &[dir]).await?;
            Ok(Operation::Rmdir.outcome(&response))
        })
    }

    /// Empty the shell's current directory.
    async fn clear_current_directory(&mut self) -> Result<ControlFlow<Outcome>> {
        let entries = self.ls_entries(ALL).await?;
        let (dirs, files): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .filter(|entry| !entry.is_dot())
            .partition(|entry| entry.is_dir());

        for file in &files {
            let outcome = self.delete_here(&file.name).await?;
            if outcome.is_failure() {
                return Ok(ControlFlow::Break(outcome));
            }
        }

        for sub in &dirs {
            let outcome = self.remove_tree(&sub.name).await?;
            if outcome.is_failure() {
                return Ok(ControlFlow::Break(outcome));
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}
