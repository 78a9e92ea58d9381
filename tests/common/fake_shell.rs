//! An in-memory stand-in for `smbclient`.
//!
//! Speaks the prompt protocol over [`Transport::pair`]: echoes each command
//! line, prints what `smbclient` would print for it against an in-memory
//! share, then the next `smb: \dir\> ` prompt. Every command line received
//! is recorded so tests can assert on exactly what went over the wire.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use smb_pilot::{Session, SmbClient, Transport, TransportPeer};

pub const BANNER: &str = "Try \"help\" to get a list of possible commands.\r\n";

const DATE: &str = "Sun Oct 18 10:00:00 2026";

const FOOTER: &str = "\r\n\t\t61252420 blocks of size 1024. 12345678 blocks available\r\n";

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir(BTreeMap<String, Node>),
}

#[derive(Debug)]
struct State {
    root: Node,
    cwd: Vec<String>,
    log: Vec<String>,
    denied: HashSet<String>,
    silent: HashSet<String>,
}

/// Builder for a fake share.
pub struct FakeShell {
    state: State,
    timeout: Duration,
}

impl Default for FakeShell {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeShell {
    pub fn new() -> Self {
        Self {
            state: State {
                root: Node::Dir(BTreeMap::new()),
                cwd: Vec::new(),
                log: Vec::new(),
                denied: HashSet::new(),
                silent: HashSet::new(),
            },
            timeout: Duration::from_millis(500),
        }
    }

    /// Add a file, creating parent directories.
    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        let parts = split(path);
        let (leaf, dirs) = parts.split_last().expect("non-empty path");
        let parent = ensure_dir(&mut self.state.root, dirs);
        parent.insert(leaf.clone(), Node::File(content.to_vec()));
        self
    }

    /// Add an empty directory, creating parents.
    pub fn dir(mut self, path: &str) -> Self {
        ensure_dir(&mut self.state.root, &split(path));
        self
    }

    /// Make `del`/`rmdir` of `path` fail with access denied.
    pub fn deny(mut self, path: &str) -> Self {
        self.state.denied.insert(split(path).join("/"));
        self
    }

    /// Never answer `verb`.
    pub fn hang_on(mut self, verb: &str) -> Self {
        self.state.silent.insert(verb.to_string());
        self
    }

    /// Per-command timeout of the attached session.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Start serving and attach a client to it.
    pub async fn start(self) -> (SmbClient, FakeHandle) {
        let (transport, peer) = Transport::pair();
        let shared = Arc::new(Mutex::new(self.state));
        tokio::spawn(serve(peer, shared.clone()));

        let session = Session::attach(transport, self.timeout)
            .await
            .expect("fake shell shows a prompt");
        (SmbClient::new(session), FakeHandle { shared })
    }
}

/// Inspect the fake share while or after a test runs.
#[derive(Clone)]
pub struct FakeHandle {
    shared: Arc<Mutex<State>>,
}

impl FakeHandle {
    /// Every command line received, in order.
    pub fn commands(&self) -> Vec<String> {
        self.shared.lock().unwrap().log.clone()
    }

    /// How many times exactly `line` was received.
    pub fn count(&self, line: &str) -> usize {
        self.commands().iter().filter(|c| *c == line).count()
    }

    /// Whether any received line starts with `prefix`.
    pub fn saw(&self, prefix: &str) -> bool {
        self.commands().iter().any(|c| c.starts_with(prefix))
    }

    /// Content of the file at `path` (from the share root).
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.shared.lock().unwrap();
        match walk(&state.root, &split(path))? {
            Node::File(content) => Some(content.clone()),
            Node::Dir(_) => None,
        }
    }

    /// Whether anything exists at `path` (from the share root).
    pub fn exists(&self, path: &str) -> bool {
        let state = self.shared.lock().unwrap();
        walk(&state.root, &split(path)).is_some()
    }

    /// The shell's current directory, `/`-joined.
    pub fn cwd(&self) -> String {
        self.shared.lock().unwrap().cwd.join("/")
    }
}

async fn serve(mut peer: TransportPeer, shared: Arc<Mutex<State>>) {
    let _ = peer
        .output
        .send(format!("{}smb: \\> ", BANNER).into_bytes())
        .await;

    let mut pending = String::new();
    while let Some(chunk) = peer.input.recv().await {
        pending.push_str(&String::from_utf8_lossy(&chunk));
        while let Some(end) = pending.find('\n') {
            let line: String = pending.drain(..=end).collect();
            let line = line.trim_end_matches(['\r', '\n']).to_string();

            let reply = {
                let mut state = shared.lock().unwrap();
                state.log.push(line.clone());
                state.handle(&line).map(|out| (out, state.prompt()))
            };

            let Some((out, prompt)) = reply else {
                continue;
            };
            let text = format!("{}\r\n{}{}", line, out, prompt);
            if peer.output.send(text.into_bytes()).await.is_err() {
                return;
            }
        }
    }
}

impl State {
    fn prompt(&self) -> String {
        let mut prompt = String::from("smb: \\");
        for part in &self.cwd {
            prompt.push_str(part);
            prompt.push('\\');
        }
        prompt.push_str("> ");
        prompt
    }

    fn resolve(&self, arg: &str) -> Vec<String> {
        let mut path = if arg.starts_with('/') || arg.starts_with('\\') {
            Vec::new()
        } else {
            self.cwd.clone()
        };
        for part in arg.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    path.pop();
                }
                _ => path.push(part.to_string()),
            }
        }
        path
    }

    fn handle(&mut self, line: &str) -> Option<String> {
        let tokens = tokenize(line);
        let (verb, args) = tokens.split_first()?;
        if self.silent.contains(verb) {
            return None;
        }
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or("");

        Some(match verb.as_str() {
            "ls" => self.ls(if args.is_empty() { "*" } else { arg(0) }),
            "cd" => self.cd(arg(0)),
            "get" => self.get(arg(0), arg(1)),
            "put" => self.put(arg(0), arg(1)),
            "del" => self.del(arg(0)),
            "mkdir" => self.mkdir(arg(0)),
            "rmdir" => self.rmdir(arg(0)),
            "rename" => self.rename(arg(0), arg(1)),
            _ => format!("{}: command not found\r\n", verb),
        })
    }

    fn ls(&self, mask: &str) -> String {
        let path = self.resolve(mask);
        let Some((leaf, dirs)) = path.split_last() else {
            return listing_of(&self.root, true, None);
        };
        match walk(&self.root, dirs) {
            Some(dir @ Node::Dir(_)) if leaf == "*" => listing_of(dir, true, None),
            Some(dir @ Node::Dir(_)) => {
                let out = listing_of(dir, false, Some(leaf.as_str()));
                if out.is_empty() {
                    format!("NT_STATUS_NO_SUCH_FILE listing {}\r\n", display(&path))
                } else {
                    out
                }
            }
            _ => format!("NT_STATUS_OBJECT_PATH_NOT_FOUND listing {}\r\n", display(&path)),
        }
    }

    fn cd(&mut self, arg: &str) -> String {
        let target = self.resolve(arg);
        match walk(&self.root, &target) {
            Some(Node::Dir(_)) => {
                self.cwd = target;
                String::new()
            }
            _ => format!(
                "cd {}\\: NT_STATUS_OBJECT_NAME_NOT_FOUND\r\n",
                display(&target)
            ),
        }
    }

    fn get(&self, remote: &str, local: &str) -> String {
        let path = self.resolve(remote);
        match walk(&self.root, &path) {
            Some(Node::File(content)) => match std::fs::write(local, content) {
                Ok(()) => format!(
                    "getting file {} of size {} as {} (0.5 KiloBytes/sec) (average 0.5 KiloBytes/sec)\r\n",
                    display(&path),
                    content.len(),
                    local
                ),
                Err(_) => format!("{}: cannot open for writing\r\n", local),
            },
            _ => format!(
                "NT_STATUS_OBJECT_NAME_NOT_FOUND opening remote file {}\r\n",
                display(&path)
            ),
        }
    }

    fn put(&mut self, local: &str, remote: &str) -> String {
        let Ok(content) = std::fs::read(local) else {
            return format!("{} does not exist\r\n", local);
        };
        let path = self.resolve(remote);
        match parent_mut(&mut self.root, &path) {
            Some((children, leaf)) => {
                children.insert(leaf, Node::File(content));
                format!(
                    "putting file {} as {} (0.5 kb/s) (average 0.5 kb/s)\r\n",
                    local,
                    display(&path)
                )
            }
            None => format!(
                "NT_STATUS_OBJECT_PATH_NOT_FOUND opening remote file {}\r\n",
                display(&path)
            ),
        }
    }

    fn del(&mut self, name: &str) -> String {
        let path = self.resolve(name);
        if self.denied.contains(&path.join("/")) {
            return format!(
                "NT_STATUS_ACCESS_DENIED deleting remote file {}\r\n",
                display(&path)
            );
        }
        if let Some((children, leaf)) = parent_mut(&mut self.root, &path) {
            if matches!(children.get(&leaf), Some(Node::File(_))) {
                children.remove(&leaf);
                return String::new();
            }
        }
        format!("NT_STATUS_NO_SUCH_FILE listing {}\r\n", display(&path))
    }

    fn mkdir(&mut self, name: &str) -> String {
        let path = self.resolve(name);
        match parent_mut(&mut self.root, &path) {
            Some((children, leaf)) if children.contains_key(&leaf) => format!(
                "NT_STATUS_OBJECT_NAME_COLLISION making remote directory {}\r\n",
                display(&path)
            ),
            Some((children, leaf)) => {
                children.insert(leaf, Node::Dir(BTreeMap::new()));
                String::new()
            }
            None => format!(
                "NT_STATUS_OBJECT_PATH_NOT_FOUND making remote directory {}\r\n",
                display(&path)
            ),
        }
    }

    fn rmdir(&mut self, name: &str) -> String {
        let path = self.resolve(name);
        if self.denied.contains(&path.join("/")) {
            return format!(
                "NT_STATUS_ACCESS_DENIED removing remote directory file {}\r\n",
                display(&path)
            );
        }
        let Some((children, leaf)) = parent_mut(&mut self.root, &path) else {
            return format!(
                "NT_STATUS_OBJECT_PATH_NOT_FOUND removing remote directory file {}\r\n",
                display(&path)
            );
        };
        match children.get(&leaf) {
            Some(Node::Dir(entries)) if entries.is_empty() => {
                children.remove(&leaf);
                String::new()
            }
            Some(Node::Dir(_)) => format!(
                "NT_STATUS_DIRECTORY_NOT_EMPTY removing remote directory file {}\r\n",
                display(&path)
            ),
            _ => format!(
                "NT_STATUS_OBJECT_NAME_NOT_FOUND removing remote directory file {}\r\n",
                display(&path)
            ),
        }
    }

    fn rename(&mut self, from: &str, to: &str) -> String {
        let source = self.resolve(from);
        let target = self.resolve(to);

        let target_free = target.split_last().is_some_and(|(leaf, dirs)| {
            matches!(walk(&self.root, dirs), Some(Node::Dir(c)) if !c.contains_key(leaf))
        });
        let moved = if target_free {
            parent_mut(&mut self.root, &source)
                .and_then(|(children, leaf)| children.remove(&leaf))
        } else {
            None
        };

        match (moved, parent_mut(&mut self.root, &target)) {
            (Some(node), Some((children, leaf))) => {
                children.insert(leaf, node);
                String::new()
            }
            _ => format!(
                "renaming file {} to {}\r\nNT_STATUS_OBJECT_NAME_NOT_FOUND\r\n",
                display(&source),
                display(&target)
            ),
        }
    }
}

fn listing_of(dir: &Node, with_dots: bool, only: Option<&str>) -> String {
    let Node::Dir(children) = dir else {
        return String::new();
    };
    let mut out = String::new();
    if with_dots {
        out.push_str(&row(".", "D", 0));
        out.push_str(&row("..", "D", 0));
    }
    for (name, node) in children {
        if only.is_some_and(|only| only != name.as_str()) {
            continue;
        }
        match node {
            Node::File(content) => out.push_str(&row(name, "A", content.len())),
            Node::Dir(_) => out.push_str(&row(name, "D", 0)),
        }
    }
    if out.is_empty() {
        return out;
    }
    out.push_str(FOOTER);
    out
}

fn row(name: &str, attrs: &str, size: usize) -> String {
    format!("  {:<35}{:>3} {:>8}  {}\r\n", name, attrs, size, DATE)
}

fn display(path: &[String]) -> String {
    format!("\\{}", path.join("\\"))
}

fn split(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            ' ' if !quoted => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            _ => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        tokens.push(current);
    }
    tokens
}

fn walk<'a>(mut node: &'a Node, path: &[String]) -> Option<&'a Node> {
    for part in path {
        node = match node {
            Node::Dir(children) => children.get(part)?,
            Node::File(_) => return None,
        };
    }
    Some(node)
}

fn walk_mut<'a>(mut node: &'a mut Node, path: &[String]) -> Option<&'a mut Node> {
    for part in path {
        node = match node {
            Node::Dir(children) => children.get_mut(part)?,
            Node::File(_) => return None,
        };
    }
    Some(node)
}

fn parent_mut<'a>(
    root: &'a mut Node,
    path: &[String],
) -> Option<(&'a mut BTreeMap<String, Node>, String)> {
    let (leaf, dirs) = path.split_last()?;
    match walk_mut(root, dirs)? {
        Node::Dir(children) => Some((children, leaf.clone())),
        Node::File(_) => None,
    }
}

fn ensure_dir<'a>(root: &'a mut Node, path: &[String]) -> &'a mut BTreeMap<String, Node> {
    let mut node = root;
    for part in path {
        let Node::Dir(children) = node else {
            panic!("{} is a file", part);
        };
        node = children
            .entry(part.clone())
            .or_insert_with(|| Node::Dir(BTreeMap::new()));
    }
    match node {
        Node::Dir(children) => children,
        Node::File(_) => panic!("not a directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("get \"a b.txt\" \"/tmp/x\""),
            vec!["get", "a b.txt", "/tmp/x"]
        );
        assert_eq!(tokenize("ls"), vec!["ls"]);
        assert_eq!(tokenize("cd \"\""), vec!["cd", ""]);
    }
}
