//! smb-pilot binary entry point.

use std::process::ExitCode;

use smb_pilot::cli::{self, Action};
use smb_pilot::config::Config;
use smb_pilot::{logging, DirEntry, SmbClient};
use tracing::{error, info, warn};

/// Exit status for an operation that ran and failed.
const EXIT_FAILURE: u8 = 1;
/// Exit status for bad arguments or configuration.
const EXIT_USAGE: u8 = 2;
/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'smb-pilot --help' for more information.");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if let Err(e) = logging::init_with_filter(config.log_filter()) {
        eprintln!("warning: logging already initialized: {}", e);
    }

    let Some(action) = args.action else {
        eprintln!("error: no operation given");
        return ExitCode::from(EXIT_USAGE);
    };

    info!("smb-pilot v{}", env!("CARGO_PKG_VERSION"));

    let mut client = match SmbClient::connect(&config.session).await {
        Ok(client) => client,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let finished = tokio::select! {
        result = run(&mut client, &action) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Err(e) = client.close().await {
        warn!("close failed: {}", e);
    }

    match finished {
        Some(Ok(true)) => ExitCode::SUCCESS,
        Some(Ok(false)) => ExitCode::from(EXIT_FAILURE),
        Some(Err(e)) => {
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
        None => {
            warn!("interrupted");
            eprintln!("interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

/// Run `action` and print its result. Returns whether it succeeded.
async fn run(client: &mut SmbClient, action: &Action) -> smb_pilot::Result<bool> {
    let outcome = match action {
        Action::Ls { mask } => {
            for entry in client.ls_entries(mask).await? {
                println!("{}", format_entry(&entry));
            }
            return Ok(true);
        }
        Action::Exists { remote } => {
            let found = client.exists(remote).await?;
            println!("{}", if found { "yes" } else { "no" });
            return Ok(found);
        }
        Action::Get { remote, local } => client.get(remote, local).await?,
        Action::Put { local, remote } => client.put(local, remote).await?,
        Action::Del { remote } => client.del(remote).await?,
        Action::Mkdir { dir } => client.mkdir(dir).await?,
        Action::Rmdir { dir } => client.rmdir(dir).await?,
        Action::Rename { from, to } => client.rename(from, to).await?,
    };

    println!("{}", outcome);
    Ok(outcome.is_success())
}

fn format_entry(entry: &DirEntry) -> String {
    let kind = if entry.is_dir() { 'd' } else { '-' };
    let hidden = if entry.hidden { 'h' } else { '-' };
    format!(
        "{}{} {:>12} {} {}",
        kind, hidden, entry.size, entry.modified, entry.name
    )
}
