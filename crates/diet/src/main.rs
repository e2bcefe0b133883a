//! `diet` — run a program under reduced resource limits.
//!
//! Resolves a limit profile from the command line (tier flag plus per-field
//! overrides), applies it to the current process best-effort, then replaces
//! the process image with the target program. On success control never
//! returns here.

use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::process::Command;

use anyhow::Result;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};
use tracing_subscriber::fmt::SubscriberBuilder;

mod limits;
mod profile;

use profile::{parse_size, Tier};

#[derive(Parser, Debug)]
#[command(name = "diet")]
#[command(about = "Run a program with constrained resource limits")]
struct Cmd {
    /// 1GB address space, 1GB data, 512 open files (default)
    #[arg(long, overrides_with_all = ["medium", "small", "starving"])]
    large: bool,

    /// 512MB address space, 512MB data, 256 open files
    #[arg(long, overrides_with_all = ["large", "small", "starving"])]
    medium: bool,

    /// 128MB address space, 128MB data, 64 open files
    #[arg(long, overrides_with_all = ["large", "medium", "starving"])]
    small: bool,

    /// 16MB address space, 16MB data, 16 open files
    #[arg(long, overrides_with_all = ["large", "medium", "small"])]
    starving: bool,

    /// Address-space limit, e.g. 512m or 2gb
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    memory: Option<u64>,

    /// Data-segment limit, e.g. 512m or 2gb
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    data: Option<u64>,

    /// Open-file limit
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    files: Option<u64>,

    /// Print current and newly-set limit values
    #[arg(long)]
    verbose: bool,

    /// Target program and its arguments
    #[arg(value_name = "PROGRAM", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<OsString>,
}

impl Cmd {
    // The tier flags override each other, so at most one is set.
    fn tier(&self) -> Tier {
        if self.starving {
            Tier::Starving
        } else if self.small {
            Tier::Small
        } else if self.medium {
            Tier::Medium
        } else {
            Tier::Large
        }
    }
}

/// If `err` is a size flag given without a value, returns the flag itself
/// (e.g. `--memory`). Clap reports that case as an invalid empty value with
/// the rendered argument (`--memory <SIZE>`) attached as context.
fn missing_size_flag(err: &clap::Error) -> Option<String> {
    if err.kind() != ErrorKind::InvalidValue {
        return None;
    }
    match err.get(ContextKind::InvalidValue) {
        Some(ContextValue::String(value)) if value.is_empty() => {}
        _ => return None,
    }
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => {
            Some(arg.split_whitespace().next().unwrap_or(arg.as_str()).to_string())
        }
        _ => None,
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();

    let cmd = match Cmd::try_parse() {
        Ok(cmd) => cmd,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => {
            // Usage and size-parse errors exit 1, not clap's default 2.
            match missing_size_flag(&err) {
                Some(flag) => println!("expected a size argument after '{flag}'"),
                None => print!("{err}"),
            }
            std::process::exit(1);
        }
    };

    let profile = cmd
        .tier()
        .profile()
        .with_overrides(cmd.memory, cmd.data, cmd.files);
    tracing::debug!(?profile, "resolved profile");

    let mut argv = cmd.command.into_iter();
    let program = match argv.next() {
        Some(program) => program,
        None => {
            println!("Give a program to execute\n");
            Cmd::command().print_help()?;
            std::process::exit(1);
        }
    };

    limits::apply(&profile, cmd.verbose);

    // Inherits the environment and the limits set above. Only returns on
    // failure.
    let err = Command::new(&program).args(argv).exec();
    println!("Unable to execute '{}': {}", program.to_string_lossy(), err);
    std::process::exit(1);
}
