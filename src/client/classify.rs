//! Per-operation success recognizers.
//!
//! `smbclient` has no uniform success/failure envelope, so every command
//! gets its own test over the raw response. These encode what the tool
//! actually prints, quirks included: a `renaming file` line means the
//! rename failed, and `del`/`rmdir` succeed only when the line after the
//! echo is already the next prompt.

use std::sync::LazyLock;

use regex::Regex;

use super::outcome::Outcome;

static NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"NT_STATUS_OBJECT_(NAME|PATH)_NOT_FOUND").expect("pattern compiles")
});

static GETTING_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^getting\sfile").expect("pattern compiles"));

static PUTTING_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^putting\sfile").expect("pattern compiles"));

static BAD_NEW_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"NT_STATUS_OBJECT_NAME_(INVALID|COLLISION)").expect("pattern compiles")
});

static RENAMING_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^renaming\sfile").expect("pattern compiles"));

static PROMPT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^smb:.*\\>").expect("pattern compiles"));

/// Commands with a dedicated recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Cd,
    Get,
    Put,
    Mkdir,
    Del,
    Rename,
    Rmdir,
}

impl Operation {
    /// Whether `response` reports success for this operation.
    pub fn succeeded(self, response: &str) -> bool {
        match self {
            // Long status lines wrap at the terminal width.
            Operation::Cd => !NOT_FOUND.is_match(&response.replace("\r\n", "")),
            Operation::Get => GETTING_FILE.is_match(response),
            Operation::Put => PUTTING_FILE.is_match(response),
            Operation::Mkdir => !BAD_NEW_NAME.is_match(response),
            Operation::Del | Operation::Rmdir => next_line_is_prompt(response),
            Operation::Rename => !RENAMING_FILE.is_match(response),
        }
    }

    /// Classify `response` into an [`Outcome`].
    pub fn outcome(self, response: &str) -> Outcome {
        Outcome::from_response(response, self.succeeded(response))
    }
}

/// The line after the command echo is the next prompt, i.e. the command
/// printed nothing.
fn next_line_is_prompt(response: &str) -> bool {
    response
        .split('\n')
        .nth(1)
        .is_some_and(|line| PROMPT_LINE.is_match(line))
}
