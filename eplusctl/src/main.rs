// eplusctl
// Command-line front end for IDF field substitution and EnergyPlus runs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use eplus_sub::{Config, SubstitutionRequest};

mod commands;

#[derive(Parser)]
#[command(name = "eplusctl")]
#[command(about = "Substitute IDF fields and run EnergyPlus", version)]
struct Cli {
    /// Config file (defaults to <config dir>/eplus-sub/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stream simulation output and log progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Substitute fields and print or write the resulting document(s)
    Substitute {
        #[command(flatten)]
        input: RequestArgs,

        /// Write to this file instead of stdout (batches get _<i> suffixes)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Substitute fields and run a simulation for each resulting document
    Run {
        #[command(flatten)]
        input: RequestArgs,

        /// Weather file (.epw)
        #[arg(short, long)]
        weather: PathBuf,

        /// Directory for result CSVs
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Summarize a weather file
    Weather {
        /// Weather file (.epw)
        file: PathBuf,

        /// Column to summarize
        #[arg(short, long, default_value = "Dry Bulb Temperature")]
        column: String,
    },

    /// Print a path with `~` and relative components expanded
    ExpandPath {
        path: PathBuf,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// IDF template
    #[arg(short, long)]
    template: PathBuf,

    /// Request file (.toml or .json)
    #[arg(short, long)]
    request: Option<PathBuf>,

    /// Inline assignment OBJECT|NAME|FIELD=V1[,V2...] (repeatable)
    #[arg(short, long = "set", value_name = "ASSIGNMENT")]
    set: Vec<String>,
}

impl RequestArgs {
    fn load(&self) -> Result<SubstitutionRequest> {
        let mut request = match &self.request {
            Some(path) => SubstitutionRequest::from_path(path)
                .with_context(|| format!("Failed to load request {}", path.display()))?,
            None => SubstitutionRequest::new(),
        };
        request.extend(
            SubstitutionRequest::from_assignments(&self.set).context("Invalid --set assignment")?,
        );
        Ok(request)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Substitute { input, output } => {
            let config = load_config(cli.config.as_deref())?;
            let request = input.load()?;
            commands::substitute(&config, &input.template, &request, output.as_deref(), cli.verbose)?;
        }

        Commands::Run {
            input,
            weather,
            output_dir,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let request = input.load()?;
            commands::run(&config, &input.template, &weather, &request, &output_dir, cli.verbose)?;
        }

        Commands::Weather { file, column } => {
            commands::weather_summary(&file, &column)?;
        }

        Commands::ExpandPath { path } => {
            if let Some(expanded) = eplus_sub::expand_path(Some(path.as_path())) {
                println!("{}", expanded.display());
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
