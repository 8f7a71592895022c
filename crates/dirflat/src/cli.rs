//! Command-line surface.
//!
//! Usage problems and operational errors both go to stdout and exit with
//! status 1. Only help requested for a selected subcommand exits 0; the
//! top-level `--help` and `--version` get the usage hint like any other
//! unrecognized first argument.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};

use crate::app::flatten::{FlattenOptions, Flattener};
use crate::app::reconstruct::{ReconstructOptions, Reconstructor};
use crate::domain::model::ExtensionFilter;
use crate::infra::config::Config;
use crate::infra::logging;

const USAGE_HINT: &str = "Expected 'flatten' or 'reconstruct' command.";
const SUBCOMMANDS: [&str; 2] = ["flatten", "reconstruct"];

#[derive(Debug, Parser)]
#[command(
    name = "dirflat",
    author,
    version,
    about = "Flatten a directory tree into one tagged text file and rebuild it",
    long_about = None,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write every matching file under a directory into one flat file
    Flatten {
        /// Directory to search for files
        #[arg(long)]
        dir: PathBuf,
        /// Comma-separated list of suffixes to include, e.g. .go,.txt
        #[arg(long)]
        ext: String,
        /// Output file to write the flattened contents to
        #[arg(long)]
        output: PathBuf,
        /// Record paths relative to --dir
        #[arg(long)]
        relative: bool,
    },
    /// Recreate files from a flat file
    Reconstruct {
        /// The flattened file to read
        #[arg(long)]
        file: PathBuf,
        /// Directory to unpack into (defaults to the working directory)
        #[arg(long)]
        directory: Option<PathBuf>,
    },
}

/// Parse the process arguments and run the selected command.
pub fn run() -> ExitCode {
    ExitCode::from(run_from(std::env::args_os()))
}

/// Run with explicit arguments, returning the process exit status.
pub fn run_from<I, T>(args: I) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) => return report_parse_error(&err, subcommand_selected(&args)),
    };

    match execute(cli) {
        Ok(()) => 0,
        Err(err) => {
            println!("Error: {err:#}");
            1
        }
    }
}

/// Whether a subcommand name appears before any help or version flag.
fn subcommand_selected(args: &[OsString]) -> bool {
    for arg in args.iter().skip(1) {
        let Some(arg) = arg.to_str() else {
            return false;
        };
        if SUBCOMMANDS.contains(&arg) {
            return true;
        }
        if matches!(arg, "-h" | "--help" | "-V" | "--version") {
            return false;
        }
    }
    false
}

fn report_parse_error(err: &clap::Error, in_subcommand: bool) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion if in_subcommand => {
            print!("{}", err.render());
            0
        }
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::MissingSubcommand
        | ErrorKind::InvalidSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            println!("{USAGE_HINT}");
            println!("{}", Cli::command().render_usage());
            1
        }
        _ => {
            print!("{}", err.render());
            1
        }
    }
}

/// Run a parsed command with layered configuration and logging in place.
pub fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    logging::init(cli.verbose, &config.logging.level())?;

    match cli.command {
        Command::Flatten {
            dir,
            ext,
            output,
            relative,
        } => {
            let filter = ExtensionFilter::parse_list(&ext);
            if filter.is_empty() {
                tracing::warn!("no extensions given, the output will contain no blocks");
            } else if filter.dropped_entries() > 0 {
                tracing::warn!(
                    dropped = filter.dropped_entries(),
                    ext = %ext,
                    "ignoring empty entries in the extension list"
                );
            }
            let mut options = FlattenOptions::from_config(dir, filter, output, &config);
            if relative {
                options = options.with_relative_paths(true);
            }

            let report = Flattener::new().flatten(&options)?;
            tracing::info!(
                blocks = report.blocks,
                bytes = report.bytes,
                tag_collisions = report.tag_collisions,
                output = %report.output.display(),
                "flatten complete"
            );
        }
        Command::Reconstruct { file, directory } => {
            let options = ReconstructOptions::new(file, directory);
            let report = Reconstructor::new().reconstruct(&options)?;
            tracing::info!(
                files = report.files,
                bytes = report.bytes,
                input = %options.input.display(),
                "reconstruct complete"
            );
        }
    }
    Ok(())
}
