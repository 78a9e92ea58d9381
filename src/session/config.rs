//! Connection settings and the `smbclient` invocation built from them.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pty::{PtySize, SpawnSpec};

/// How `smbclient` authenticates. The variants map to mutually exclusive
/// command-line forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    /// Password passed as the positional argument.
    Password(String),
    /// `-N`: don't ask for a password.
    #[default]
    NoPassword,
    /// `-A <file>`: username/password/domain read from a credentials file.
    AuthFile(PathBuf),
}

/// Settings for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Client executable.
    pub program: String,
    /// Server host name or address.
    pub host: String,
    /// Share name (may be empty to reach the server root).
    pub share: String,
    /// Workgroup or domain.
    pub domain: String,
    /// User name (ignored with [`Credentials::AuthFile`]).
    pub user: String,
    /// Authentication mode.
    pub credentials: Credentials,
    /// Server port.
    pub port: u16,
    /// Per-command timeout in seconds, also used for the initial prompt.
    pub timeout_secs: u64,
    /// Terminal width; listing lines wrap at this column.
    pub columns: u16,
    /// Highest protocol to negotiate (`NT1`, `SMB2`, `SMB3`...).
    pub max_protocol: Option<String>,
    /// Request transport encryption.
    pub encrypt: bool,
    /// smb.conf to load instead of the system one.
    pub config_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program: "smbclient".to_string(),
            host: "127.0.0.1".to_string(),
            share: String::new(),
            domain: "WORKGROUP".to_string(),
            user: "guest".to_string(),
            credentials: Credentials::default(),
            port: 445,
            timeout_secs: 10,
            columns: 80,
            max_protocol: None,
            encrypt: false,
            config_file: PathBuf::from("/dev/null"),
        }
    }
}

impl SessionConfig {
    /// Config for `//host/share` with everything else defaulted.
    pub fn new(host: impl Into<String>, share: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            share: share.into(),
            ..Default::default()
        }
    }

    /// Set the credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the user name.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-command timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Per-command timeout.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// UNC-style service path, `//host/share`.
    pub fn service(&self) -> String {
        format!("//{}/{}", self.host, self.share)
    }

    /// Build the PTY invocation.
    ///
    /// Arguments go straight to `execve`, so no shell quoting is involved.
    /// `TERM=dumb` keeps readline from wrapping prompts in escape sequences.
    pub fn spawn_spec(&self) -> SpawnSpec {
        let mut spec = SpawnSpec::new(&self.program).arg(self.service());

        spec = match &self.credentials {
            Credentials::Password(password) => spec.arg(password.as_str()),
            Credentials::NoPassword => spec.arg("-N"),
            Credentials::AuthFile(path) => spec.arg("-A").arg(path.to_string_lossy()),
        };

        spec = spec.arg("-W").arg(self.domain.as_str());
        if !matches!(self.credentials, Credentials::AuthFile(_)) {
            spec = spec.arg("-U").arg(self.user.as_str());
        }
        spec = spec.arg("-p").arg(self.port.to_string());

        if let Some(protocol) = &self.max_protocol {
            spec = spec.arg("-m").arg(protocol.as_str());
        }
        if self.encrypt {
            spec = spec.arg("-e");
        }

        spec.arg("-s")
            .arg(self.config_file.to_string_lossy())
            .env("COLUMNS", self.columns.to_string())
            .env("TERM", "dumb")
            .size(PtySize::new(24, self.columns))
    }
}
