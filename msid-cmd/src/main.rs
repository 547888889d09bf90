mod command_align;
mod command_convert;
mod command_events;
mod command_run;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::{
    io::{stderr, stdout, Write},
    path::PathBuf,
    time::Instant,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use msid::config::{get_default_content, DEFAULT_ANALYSES};

/// Tool for converting, aligning and plotting Chandra MSID telemetry.
///
/// MSID telemetry is read from CSV exports with a header row, e.g., `times,vals,maxes`, where
/// times are CXC seconds (seconds since 1998-01-01T00:00:00 UTC). Sparsely sampled channels are
/// joined to densely sampled ones on exactly matching timestamps.
#[derive(Parser)]
#[command(version, about, long_about, disable_help_subcommand = true)]
struct Cli {
    /// Logging level filters, e.g., debug, info, warn, etc ...
    #[arg(short, long, default_value = "info")]
    logging: String,

    #[command(subcommand)]
    commands: Commands,
}

fn parse_valid_analysis(name: &str) -> Result<String, String> {
    if DEFAULT_ANALYSES.contains(&name) {
        Ok(String::from(name))
    } else {
        Err(format! {"expected one of {}", DEFAULT_ANALYSES.join(", ")})
    }
}

#[derive(Args)]
#[group(multiple = false, required = true)]
struct Configs {
    /// Use a built-in analysis configuration; one of hvps or cea.
    #[arg(short, long, value_name = "name", value_parser=parse_valid_analysis)]
    analysis: Option<String>,

    /// YAML analysis configuration file to use, rather than a built-in one. See the config
    /// subcommand to view the built-in configurations.
    #[arg(short, long, value_name = "path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the plots of an analysis to PNG files.
    ///
    /// Relative file names in the configuration are resolved against the MSID and events
    /// directories, which may be overridden here.
    Run {
        #[command(flatten)]
        configs: Configs,

        /// Directory containing the MSID CSV exports.
        #[arg(short, long, value_name = "path")]
        msid_dir: Option<PathBuf>,

        /// Directory containing the mission event CSV exports.
        #[arg(short, long, value_name = "path")]
        events_dir: Option<PathBuf>,

        /// Output directory.
        #[arg(short, long, value_name = "path", default_value = "plots")]
        output: PathBuf,
    },
    /// Output a built-in analysis configuration.
    Config {
        /// Analysis to show the config for
        #[arg(value_name = "name", value_parser=parse_valid_analysis)]
        analysis: String,
    },
    /// Convert the times of an MSID CSV to plot day numbers and UTC.
    ///
    /// Writes CSV with the columns times, plot_day and utc to stdout.
    Convert {
        #[arg(value_name = "path")]
        input: PathBuf,
        /// Column containing mission times
        #[arg(long, default_value = "times")]
        column: String,
        /// Mission epoch, if not the CXC epoch.
        #[arg(long, default_value = msid::CXC_EPOCH)]
        epoch: String,
    },
    /// Report how many samples of each candidate match the reference timestamps.
    ///
    /// Generates JSON.
    Align {
        /// Densely sampled reference MSID CSV
        #[arg(value_name = "reference")]
        reference: PathBuf,
        /// One or more sparsely sampled MSID CSV
        #[arg(value_name = "candidates")]
        candidates: Vec<PathBuf>,
        /// Column containing mission times
        #[arg(long, default_value = "times")]
        column: String,
    },
    /// List mission events as JSON.
    Events {
        #[arg(value_name = "path")]
        input: PathBuf,
        /// Column containing event start times
        #[arg(long, default_value = "tstart")]
        column: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(EnvFilter::new(cli.logging))
        .init();

    let start = Instant::now();

    match cli.commands {
        Commands::Run {
            configs,
            msid_dir,
            events_dir,
            output,
        } => {
            crate::command_run::run(
                configs.analysis,
                configs.config,
                msid_dir,
                events_dir,
                output,
            )?;
        }
        Commands::Config { analysis } => {
            let Some(content) = get_default_content(&analysis) else {
                bail!("no config for {analysis}");
            };
            stdout().write_all(content.as_bytes())?;
        }
        Commands::Convert {
            input,
            column,
            epoch,
        } => {
            crate::command_convert::convert(&input, &column, &epoch, stdout())?;
        }
        Commands::Align {
            reference,
            candidates,
            column,
        } => {
            if candidates.is_empty() {
                bail!("No candidates specified");
            }
            crate::command_align::align(&reference, &candidates, &column, stdout())?;
        }
        Commands::Events { input, column } => {
            crate::command_events::events(&input, &column, stdout())?;
        }
    }

    info!("finished in {:.3} seconds", start.elapsed().as_secs_f64());

    Ok(())
}
