//! Session engine.
//!
//! A [`Session`] owns one `smbclient` child behind a PTY and turns its
//! prompt-driven dialogue into `ask(command) -> response text`. The prompt
//! regex is the only synchronization point with the shell; see
//! [`PROMPT_PATTERN`].

mod config;
mod engine;
pub mod quote;
mod state;

pub use config::{Credentials, SessionConfig};
pub use engine::{Session, INITIAL_PROMPT_PATTERN, PROMPT_PATTERN};
pub use state::SessionState;
