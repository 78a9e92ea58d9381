//! # smb-pilot
//!
//! Drive the interactive `smbclient` shell over a pseudo-terminal and use it
//! as a typed request/response API.
//!
//! The shell speaks free text: a command goes in, lines come out, and the
//! next `smb: \dir\>` prompt says the response is over. This crate turns
//! that into
//!
//! - **[`Session`]**: one child process, one command at a time, each wait
//!   bounded by a timeout
//! - **[`SmbClient`]**: `ls`, `get`, `put`, `del`, `rename`, `mkdir` and a
//!   recursive `rmdir`, each returning an [`Outcome`] or typed listing
//! - **[`client::listing`]**: a parser for `ls` output
//!
//! ## Quick Start
//!
//! ```no_run
//! use smb_pilot::{Credentials, SessionConfig, SmbClient};
//!
//! #[tokio::main]
//! async fn main() -> smb_pilot::Result<()> {
//!     smb_pilot::logging::try_init().ok();
//!
//!     let config = SessionConfig::new("fs01", "team")
//!         .user("alice")
//!         .credentials(Credentials::Password("secret".into()));
//!     let mut client = SmbClient::connect(&config).await?;
//!
//!     for entry in client.ls_entries("*").await? {
//!         println!("{} {}", entry.name, entry.size);
//!     }
//!
//!     let outcome = client.get("reports/q3.pdf", "/tmp/q3.pdf").await?;
//!     if outcome.is_failure() {
//!         eprintln!("download failed: {}", outcome.message());
//!     }
//!
//!     client.close().await
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod expect;
pub mod logging;
pub mod output;
pub mod pty;
pub mod session;

// Re-export commonly used types
pub use client::{DirEntry, EntryKind, Modified, Outcome, SmbClient};
pub use error::{ConnectFailure, Result, SmbError};
pub use expect::{ExpectError, Match, PatternReader};
pub use output::OutputSanitizer;
pub use pty::{PtySize, SpawnSpec, Transport, TransportPeer};
pub use session::{
    Credentials, Session, SessionConfig, SessionState, INITIAL_PROMPT_PATTERN, PROMPT_PATTERN,
};
