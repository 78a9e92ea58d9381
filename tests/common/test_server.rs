//! Throwaway `smbd` for end-to-end tests.
//!
//! Everything lives under one temp directory: the generated `smb.conf`,
//! the shared folder, and every state/lock/pid directory `smbd` wants, so a
//! test server never touches the system Samba setup. The server listens on
//! a free local port and is killed on drop.

use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use smb_pilot::{Credentials, SessionConfig};
use tempfile::TempDir;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestServer {
    root: TempDir,
    share_name: String,
    port: u16,
    user: String,
    child: Child,
}

impl TestServer {
    /// Start `smbd` serving an empty guest-writable share.
    pub fn start() -> std::io::Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("smb-pilot-test-server-")
            .tempdir()?;
        let share_name = "pilot_test".to_string();
        let user = std::env::var("USER").unwrap_or_else(|_| "root".to_string());
        let port = free_port()?;

        std::fs::create_dir_all(root.path().join("share"))?;
        std::fs::create_dir_all(root.path().join("ncalrpc"))?;
        let config_path = root.path().join("smb.conf");
        std::fs::write(
            &config_path,
            render_config(root.path(), &share_name, &user, port),
        )?;

        let child = Command::new("smbd")
            .arg("--foreground")
            .arg("--no-process-group")
            .arg("--configfile")
            .arg(&config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let mut server = Self {
            root,
            share_name,
            port,
            user,
            child,
        };
        server.wait_until_listening()?;
        Ok(server)
    }

    fn wait_until_listening(&mut self) -> std::io::Result<()> {
        let started = Instant::now();
        while started.elapsed() < STARTUP_TIMEOUT {
            if let Some(status) = self.child.try_wait()? {
                return Err(std::io::Error::other(format!(
                    "smbd exited during startup: {}",
                    status
                )));
            }
            if TcpStream::connect(("127.0.0.1", self.port)).is_ok() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "smbd did not start listening",
        ))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn share_name(&self) -> &str {
        &self.share_name
    }

    /// Local directory backing the share.
    pub fn share_path(&self) -> PathBuf {
        self.root.path().join("share")
    }

    /// Session settings for a guest connection to this server.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new("127.0.0.1", self.share_name.as_str())
            .user(self.user.as_str())
            .credentials(Credentials::NoPassword)
            .port(self.port)
            .timeout(Duration::from_secs(10))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn render_config(root: &Path, share_name: &str, user: &str, port: u16) -> String {
    let root = root.display();
    format!(
        r#"[global]
    workgroup = WORKGROUP
    netbios name = PILOTTEST
    server role = standalone server
    security = user
    map to guest = Bad User
    guest account = {user}
    smb ports = {port}
    interfaces = 127.0.0.1
    bind interfaces only = yes
    lock directory = {root}
    state directory = {root}
    cache directory = {root}
    pid directory = {root}
    private dir = {root}
    ncalrpc dir = {root}/ncalrpc
    log file = {root}/smbd.log
    load printers = no
    disable spoolss = yes

[{share_name}]
    path = {root}/share
    guest ok = yes
    read only = no
    force user = {user}
"#
    )
}
