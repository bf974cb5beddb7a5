//! The `hostfile` command: checks whether the configured server hostname is
//! declared in a hosts file

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::config::{ConfigError, Settings};
use crate::hostfile::{self, host_file, load_hostfile, Hostfile};
use crate::runserver::RunserverOn;

/// Exit code used when the hostname is missing and `--status` was given
pub const EXIT_NOT_FOUND: i32 = 1;

/// Exit code used for every other failure
pub const EXIT_ERROR: i32 = 2;

/// Address that `--write` maps a missing hostname to
pub const LOOPBACK: &str = "127.0.0.1";

/// Analyze your system hostfile to see if this project's RUNSERVER_ON
/// hostname is mentioned.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "hostfile", version)]
pub struct Args {
    /// Print a hostfile with this project added
    #[arg(long, conflicts_with = "format")]
    pub write: bool,

    /// Exit with 0 status if this project is already included, 1 if not
    #[arg(long)]
    pub status: bool,

    /// Hosts file to read instead of the system one
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Hostname and port to look for; overrides RUNSERVER_ON
    #[arg(long, value_name = "HOST:PORT")]
    pub runserver_on: Option<RunserverOn>,

    /// Print the hosts file in the given form: raw, clean or simple
    #[arg(long, value_name = "MODE")]
    pub format: Option<String>,
}

/// Represents an error ending the command, with the exit status to report.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Hostname not declared and `--status` requested
    #[error("{hostname} not found in {path}.")]
    NotFound {
        /// Hostname looked for
        hostname: String,
        /// Hosts file searched
        path: String,
    },
    /// Hosts file could not be located, read or parsed
    #[error(transparent)]
    Hostfile(#[from] hostfile::Error),
    /// Settings could not be read
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Output could not be written
    #[error("error writing output: {0}")]
    Output(#[source] io::Error),
}

impl CommandError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match *self {
            CommandError::NotFound { .. } => EXIT_NOT_FOUND,
            _ => EXIT_ERROR,
        }
    }
}

/// Runs the command, writing results to `out` and warnings to `err`.
///
/// Flags given in `args` take precedence over `settings`.
pub fn run(
    args: &Args,
    settings: &Settings,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CommandError> {
    let runserver_on = match args.runserver_on.as_ref().or(settings.runserver_on.as_ref()) {
        Some(r) => r,
        None => {
            writeln!(out, "RUNSERVER_ON not found in settings.").map_err(CommandError::Output)?;
            return Ok(());
        }
    };

    let hostname = runserver_on.hostname();

    let path = match args.file.as_ref().or(settings.hosts_path.as_ref()) {
        Some(p) => p.clone(),
        None => host_file()?,
    };

    let hosts = load_hostfile(&path)?;
    let found = hosts.contains(hostname);

    info!("{} declared in {}: {}", hostname, path.display(), found);

    if args.write {
        return write_with_host(&hosts, hostname, out).map_err(CommandError::Output);
    }

    if let Some(ref mode) = args.format {
        let text = hosts.format_str(mode)?;
        return write_block(out, &text).map_err(CommandError::Output);
    }

    if found {
        writeln!(out, "{} is already in {}.", hostname, path.display())
            .map_err(CommandError::Output)?;
        return Ok(());
    }

    let e = CommandError::NotFound {
        hostname: hostname.to_owned(),
        path: path.display().to_string(),
    };

    if args.status {
        return Err(e);
    }

    writeln!(err, "{}", e).map_err(CommandError::Output)
}

/// Writes the hosts file unchanged, followed by a loopback entry for
/// `hostname` if it is not already declared.
fn write_with_host(hosts: &Hostfile, hostname: &str, out: &mut dyn Write) -> io::Result<()> {
    write_block(out, &hosts.to_string())?;

    if !hosts.contains(hostname) {
        writeln!(out, "{}\t{}", LOOPBACK, hostname)?;
    }

    Ok(())
}

/// Writes `text`, ending it with a newline unless it is empty or already
/// ends with one.
fn write_block(out: &mut dyn Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;

    if !text.is_empty() && !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }

    Ok(())
}
