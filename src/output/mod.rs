//! Output processing for text read from the shell.
//!
//! Responses pass through [`OutputSanitizer`] before any classifier looks
//! at them, so a stray terminal escape cannot hide a status line.
//!
//! # Example
//!
//! ```
//! use smb_pilot::output::OutputSanitizer;
//!
//! let raw = b"\x1b[?2004hsmb: \\> ";
//! assert_eq!(OutputSanitizer::strip_ansi(raw), "smb: \\> ");
//! ```

mod sanitizer;

pub use sanitizer::OutputSanitizer;
