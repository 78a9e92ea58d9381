//! Typed result of a high-level operation.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// A status-code line such as `NT_STATUS_NO_SUCH_FILE listing \foo`.
static STATUS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^NT_[A-Z0-9_]+(\s|$)").expect("status pattern compiles"));

/// Success flag plus a one-line diagnostic.
///
/// Remote failures (missing file, access denied, name collision...) are
/// reported this way rather than as [`SmbError`](crate::SmbError), so batch
/// callers can branch on them without unwinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    success: bool,
    message: String,
}

impl Outcome {
    /// Build an outcome from raw shell output.
    ///
    /// The message is the first status-code line, or the whole text if
    /// there is none.
    pub fn from_response(response: &str, success: bool) -> Self {
        let message = status_line(response)
            .map(str::to_string)
            .unwrap_or_else(|| response.to_string());
        Self::new(message, success)
    }

    /// A successful outcome.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message.into(), true)
    }

    /// An unsuccessful outcome.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message.into(), false)
    }

    fn new(message: String, success: bool) -> Self {
        let message = if !success && message.trim().is_empty() {
            "operation failed without output".to_string()
        } else {
            message
        };
        Self { success, message }
    }

    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Whether the operation failed.
    pub fn is_failure(&self) -> bool {
        !self.success
    }

    /// Diagnostic message; never empty for a failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.success { "ok" } else { "failed" };
        write!(f, "{}: {}", tag, self.message.trim())
    }
}

/// First line of `text` that looks like a status code.
pub fn status_line(text: &str) -> Option<&str> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .find(|line| STATUS_LINE.is_match(line))
}
