// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Rifts CLI - map hostility between online communities

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Args, CommandFactory, Parser, Subcommand};
use rifts::commands::{self, export::ExportFormat, rank::RankKey, roles::RoleArgs, Global, Inputs};
use rifts::pipeline::Window;
use rifts::types::Role;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rifts")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "RIFTS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Dataset files and time window
#[derive(Args)]
struct InputArgs {
    /// Hyperlink dataset files (TSV by default)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Only links at or after this time (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long, value_parser = parse_time)]
    since: Option<NaiveDateTime>,

    /// Only links before this time
    #[arg(long, value_parser = parse_time)]
    until: Option<NaiveDateTime>,
}

impl InputArgs {
    fn into_inputs(self) -> Inputs {
        Inputs {
            files: self.files,
            window: Window {
                since: self.since,
                until: self.until,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print a report
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Entries per ranking
        #[arg(long)]
        top: Option<usize>,
    },

    /// Classify communities as instigators, targets or bridges
    Roles {
        #[command(flatten)]
        input: InputArgs,

        /// Only list communities with this role
        #[arg(long, value_enum)]
        role: Option<Role>,

        /// Minimum dominant-direction degree
        #[arg(long)]
        min_activity: Option<usize>,

        /// Required ratio between dominant and other direction
        #[arg(long)]
        ratio: Option<f64>,
    },

    /// Rank communities by one metric
    Rank {
        #[command(flatten)]
        input: InputArgs,

        /// Metric to rank by
        #[arg(long, value_enum, default_value = "out-degree")]
        by: RankKey,

        /// Number of entries
        #[arg(long)]
        top: Option<usize>,
    },

    /// Detect communities of communities and the conflict between them
    Communities {
        #[command(flatten)]
        input: InputArgs,

        /// Louvain resolution
        #[arg(long)]
        resolution: Option<f64>,

        /// Number of entries per list
        #[arg(long)]
        top: Option<usize>,
    },

    /// Export the negative-link graph
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "dot")]
        format: ExportFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Dotted key, e.g. roles.min_activity
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, String> {
    rifts::loader::parse_timestamp(raw).ok_or_else(|| format!("invalid time `{raw}`"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v/-q
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        return commands::completions::run(&mut Cli::command(), shell);
    }

    let mut config = rifts::config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Commands::Analyze { top: Some(top), .. } = &cli.command {
        config.report.top = *top;
    }

    let global = Global {
        config,
        json: cli.json,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    // Execute command
    match cli.command {
        Commands::Analyze { input, .. } => commands::analyze::run(&global, &input.into_inputs()),
        Commands::Roles {
            input,
            role,
            min_activity,
            ratio,
        } => commands::roles::run(
            &global,
            &input.into_inputs(),
            &RoleArgs {
                role,
                min_activity,
                ratio,
            },
        ),
        Commands::Rank { input, by, top } => commands::rank::run(&global, &input.into_inputs(), by, top),
        Commands::Communities { input, resolution, top } => {
            commands::communities::run(&global, &input.into_inputs(), resolution, top)
        }
        Commands::Export { input, format, output } => {
            commands::export::run(&global, &input.into_inputs(), format, output)
        }
        Commands::Config { key } => commands::config::run(&global, key.as_deref()),
        Commands::Completions { .. } => Ok(()),
    }
}
