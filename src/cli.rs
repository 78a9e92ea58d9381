//! Command-line interface for smb-pilot.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

use crate::session::Credentials;

/// One operation against the share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ls { mask: String },
    Get { remote: String, local: PathBuf },
    Put { local: PathBuf, remote: String },
    Del { remote: String },
    Mkdir { dir: String },
    Rmdir { dir: String },
    Rename { from: String, to: String },
    Exists { remote: String },
}

impl Action {
    /// Build an action from the positional arguments: a verb and its
    /// operands.
    fn from_operands(operands: Vec<String>) -> Result<Self, ArgsError> {
        let mut operands = operands.into_iter();
        let verb = operands.next().ok_or(ArgsError::MissingOperation)?;
        let mut next = |name: &'static str| operands.next().ok_or(ArgsError::MissingOperand(name));

        let action = match verb.as_str() {
            "ls" => Action::Ls {
                mask: next("mask").unwrap_or_else(|_| crate::client::ALL.to_string()),
            },
            "get" => Action::Get {
                remote: next("remote")?,
                local: next("local")?.into(),
            },
            "put" => Action::Put {
                local: next("local")?.into(),
                remote: next("remote")?,
            },
            "del" => Action::Del {
                remote: next("remote")?,
            },
            "mkdir" => Action::Mkdir { dir: next("dir")? },
            "rmdir" => Action::Rmdir { dir: next("dir")? },
            "rename" => Action::Rename {
                from: next("from")?,
                to: next("to")?,
            },
            "exists" => Action::Exists {
                remote: next("remote")?,
            },
            _ => return Err(ArgsError::UnknownOperation(verb)),
        };

        if let Some(extra) = operands.next() {
            return Err(ArgsError::UnexpectedArgument(extra));
        }
        Ok(action)
    }
}

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Server host.
    pub host: Option<String>,
    /// Share name.
    pub share: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// User name.
    pub user: Option<String>,
    /// Workgroup or domain.
    pub domain: Option<String>,
    /// Authentication, if given on the command line.
    pub credentials: Option<Credentials>,
    /// Highest protocol to negotiate.
    pub max_protocol: Option<String>,
    /// Request transport encryption.
    pub encrypt: bool,
    /// Per-command timeout in seconds.
    pub timeout: Option<u64>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Operation to run.
    pub action: Option<Action>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut operands = Vec::new();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                result.host = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("share") => {
                result.share = Some(parser.value()?.parse()?);
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('U') | Long("user") => {
                result.user = Some(parser.value()?.parse()?);
            }
            Short('W') | Long("domain") => {
                result.domain = Some(parser.value()?.parse()?);
            }
            Long("password") => {
                let password = parser.value()?.parse()?;
                set_credentials(&mut result, Credentials::Password(password))?;
            }
            Short('N') | Long("no-pass") => {
                set_credentials(&mut result, Credentials::NoPassword)?;
            }
            Short('A') | Long("auth-file") => {
                let path = parser.value()?.parse()?;
                set_credentials(&mut result, Credentials::AuthFile(path))?;
            }
            Short('m') | Long("max-protocol") => {
                result.max_protocol = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("encrypt") => {
                result.encrypt = true;
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ArgsError::InvalidValue("timeout", value))?;
                result.timeout = Some(secs);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                operands.push(val.string()?);
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if !(result.help || result.version) {
        result.action = Some(Action::from_operands(operands)?);
    }

    Ok(result)
}

fn set_credentials(args: &mut Args, credentials: Credentials) -> Result<(), ArgsError> {
    if args.credentials.is_some() {
        return Err(ArgsError::ConflictingCredentials);
    }
    args.credentials = Some(credentials);
    Ok(())
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"smb-pilot {version}
Run one file operation against an SMB share through smbclient

USAGE:
    smb-pilot [OPTIONS] <OPERATION> [OPERANDS...]

OPERATIONS:
    ls [mask]                 List entries [default mask: *]
    get <remote> <local>      Download a file
    put <local> <remote>      Upload a file
    del <remote>              Delete a file
    mkdir <dir>               Create a directory
    rmdir <dir>               Remove a directory and everything in it
    rename <from> <to>        Rename a file or directory
    exists <remote>           Exit 0 if the entry exists

OPTIONS:
    -H, --host <HOST>         Server host [default: 127.0.0.1]
    -s, --share <SHARE>       Share name
    -p, --port <PORT>         Server port [default: 445]
    -U, --user <USER>         User name [default: guest]
    -W, --domain <DOMAIN>     Workgroup or domain [default: WORKGROUP]
        --password <PASS>     Password
    -N, --no-pass             Don't send a password [default]
    -A, --auth-file <FILE>    smbclient credentials file
    -m, --max-protocol <P>    Highest protocol to negotiate (NT1, SMB2, SMB3)
    -e, --encrypt             Request transport encryption
    -t, --timeout <SECS>      Per-command timeout [default: 10]
    -c, --config <FILE>       Path to configuration file (JSON)
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES:
    SMB_PILOT_HOST            Server host (overrides config)
    SMB_PILOT_SHARE           Share name (overrides config)
    SMB_PILOT_USER            User name (overrides config)
    SMB_PILOT_PASSWORD        Password (overrides config)
    SMB_PILOT_LOG_LEVEL       Log level (overrides config)
    RUST_LOG                  Alternative log level setting

EXAMPLES:
    # List the root of a guest share
    smb-pilot -H 10.0.0.5 -s public ls

    # Download with a password from the environment
    SMB_PILOT_PASSWORD=secret smb-pilot -H fs01 -s team -U alice get reports/q3.pdf q3.pdf

    # Use a config file
    smb-pilot -c /etc/smb-pilot/config.json rmdir old-builds
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("smb-pilot {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
    /// No operation given.
    MissingOperation,
    /// Operation verb not recognized.
    UnknownOperation(String),
    /// Operation is missing an operand.
    MissingOperand(&'static str),
    /// More than one of --password, --no-pass, --auth-file.
    ConflictingCredentials,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
            Self::MissingOperation => write!(f, "no operation given"),
            Self::UnknownOperation(verb) => write!(f, "unknown operation: '{}'", verb),
            Self::MissingOperand(name) => write!(f, "missing operand <{}>", name),
            Self::ConflictingCredentials => write!(
                f,
                "--password, --no-pass and --auth-file are mutually exclusive"
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
