//! Parser for `ls` output.
//!
//! A listing line looks like
//!
//! ```text
//!   testfile.txt                        A        5  Sun Oct 18 10:00:00 2026
//! ```
//!
//! Names may contain spaces, so the line is read from the right: the
//! attribute letters, the size and the date form a fixed suffix, and
//! everything before it is the name. Lines that don't fit (the block-count
//! footer, blank lines, the command echo, the prompt) are skipped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<name>.*\S)\s+(?P<attrs>[ABDHNRS]+)\s+(?P<size>\d+)\s+(?P<date>[A-Za-z]{3}\s+[A-Za-z]{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+\d{4})\s*$",
    )
    .expect("listing pattern compiles")
});

/// Format of the date column, after collapsing runs of spaces.
const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// File or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// Modification time of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modified {
    /// Parsed local time as printed by the server.
    At(NaiveDateTime),
    /// Date text that didn't parse, kept verbatim.
    Unparsed(String),
}

impl Modified {
    /// The parsed time, if any.
    pub fn time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::At(time) => Some(*time),
            Self::Unparsed(_) => None,
        }
    }
}

impl fmt::Display for Modified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S")),
            Self::Unparsed(raw) => write!(f, "!!{}", raw),
        }
    }
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name as printed, original casing.
    pub name: String,
    pub kind: EntryKind,
    /// `H` attribute set.
    pub hidden: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    pub modified: Modified,
    /// Raw attribute letters, e.g. `DH` or `AR`.
    pub attributes: String,
}

impl DirEntry {
    /// Whether this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// `.` or `..`.
    pub fn is_dot(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Parse `ls` output into entries, in the order printed.
pub fn parse_listing(text: &str) -> Vec<DirEntry> {
    text.lines().filter_map(parse_line).collect()
}

/// Key entries by name, sorted.
///
/// A file and a directory with the same name collapse into one key and the
/// one listed last wins. Use the ordered listing when that matters.
pub fn index_by_name(entries: Vec<DirEntry>) -> BTreeMap<String, DirEntry> {
    entries
        .into_iter()
        .fold(BTreeMap::new(), |mut map, entry| {
            map.insert(entry.name.clone(), entry);
            map
        })
}

fn parse_line(line: &str) -> Option<DirEntry> {
    let caps = ENTRY_LINE.captures(line)?;
    let attributes = caps["attrs"].to_string();
    let size = caps["size"].parse().ok()?;
    let date = &caps["date"];

    let kind = if attributes.contains('D') {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    Some(DirEntry {
        name: caps["name"].to_string(),
        kind,
        hidden: attributes.contains('H'),
        size,
        modified: parse_date(date),
        attributes,
    })
}

fn parse_date(raw: &str) -> Modified {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match NaiveDateTime::parse_from_str(&normalized, DATE_FORMAT) {
        Ok(time) => Modified::At(time),
        Err(_) => Modified::Unparsed(raw.to_string()),
    }
}
