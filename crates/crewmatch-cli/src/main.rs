mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "crewmatch",
    version,
    about = "Pilot availability from roster documents and maximum PIC/SIC crew pairing"
)]
struct Cli {
    /// Log extraction decisions to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that reads a roster.
#[derive(Args)]
pub struct RosterArgs {
    /// Roster document: pdf, docx, csv, xlsx or a scanned image
    pub roster: PathBuf,

    /// Built-in profile (default: chosen from the file type)
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Custom JSON profile file
    #[arg(long = "profile-file", value_name = "FILE", conflicts_with = "profile")]
    pub profile_file: Option<PathBuf>,

    /// Availability marker token (overrides the profile)
    #[arg(long)]
    pub marker: Option<String>,

    /// Extraction strategy: same_row, nearest_row_above, grid_table, recognized_text
    #[arg(long)]
    pub strategy: Option<String>,

    /// Vertical tolerance for grouping words into rows
    #[arg(long, value_name = "UNITS")]
    pub row_tolerance: Option<f32>,

    /// Largest gap between a marker row and its pilot row (nearest_row_above)
    #[arg(long, value_name = "UNITS")]
    pub max_row_distance: Option<f32>,

    /// Output format: table (default) or json
    #[arg(short, long, default_value = "table")]
    pub output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List the days detected in a roster
    Days {
        #[command(flatten)]
        roster: RosterArgs,
    },
    /// Show who is available on a day
    Availability {
        #[command(flatten)]
        roster: RosterArgs,

        /// Day of month, as printed in the roster header
        #[arg(short, long)]
        day: String,

        /// Write per-row extraction decisions to a JSON file
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
    },
    /// Compute the maximum set of PIC/SIC crews for a day
    Pair {
        #[command(flatten)]
        roster: RosterArgs,

        /// Day of month, as printed in the roster header
        #[arg(short, long)]
        day: String,

        /// Roles table (csv or xlsx) with Pilot and Role columns
        #[arg(long, value_name = "FILE")]
        roles: PathBuf,

        /// Restrictions table (csv or xlsx) with PIC and SIC columns
        #[arg(long, value_name = "FILE")]
        restrictions: Option<PathBuf>,

        /// Write the pairings as PIC,SIC csv (file or directory)
        #[arg(short = 'O', long = "out", value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Inspect and validate extraction profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },
}

#[derive(Subcommand)]
enum ProfilesAction {
    /// List built-in profiles
    List,
    /// Print a built-in profile as JSON
    Show {
        /// Profile name (e.g., "pdf-table")
        name: String,
    },
    /// Validate a custom profile file
    Validate {
        /// Path to JSON profile file
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Days { roster } => commands::days::run(&roster),
        Commands::Availability { roster, day, trace } => {
            commands::availability::run(&roster, &day, trace)
        }
        Commands::Pair {
            roster,
            day,
            roles,
            restrictions,
            out,
        } => commands::pair::run(&roster, &day, &roles, restrictions.as_deref(), out),
        Commands::Profiles { action } => match action {
            ProfilesAction::List => commands::profiles::list(),
            ProfilesAction::Show { name } => commands::profiles::show(&name),
            ProfilesAction::Validate { file } => commands::profiles::validate(&file),
        },
    };

    if let Err(e) = result {
        if let crewmatch_core::error::CrewError::NoDaysDetected { extraction } = &e {
            output::table::print_diagnostics(&extraction.diagnostics);
        }
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
