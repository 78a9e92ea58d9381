//! Argument quoting for commands sent to the shell.
//!
//! Every filename goes out wrapped in double quotes. Control characters and
//! double quotes are removed first: with them a crafted name could erase the
//! command line it sits on, close the quote early, or start a new line and
//! smuggle in a second command.

/// Strip control characters and double quotes from `name`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect()
}

/// Sanitize `name` and wrap it in double quotes.
pub fn quote(name: &str) -> String {
    format!("\"{}\"", sanitize_filename(name))
}

/// Build `command "arg1" "arg2" ...`.
pub fn wrap_command(command: &str, args: &[&str]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&quote(arg));
    }
    line
}
