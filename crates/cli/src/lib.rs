pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "kurbanlink",
    about = "KurbanLink operator CLI",
    long_about = "Operate KurbanLink migrations, demo fixtures, config inspection, and readiness checks.",
    after_help = "Examples:\n  kurbanlink doctor --json\n  kurbanlink recommend --city Ankara\n  kurbanlink config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic marketplace seed listings and verify them")]
    Seed,
    #[command(about = "Preview ranked recommendations for a city from the command line")]
    Recommend {
        #[arg(long, help = "Target city")]
        city: Option<String>,
        #[arg(long, help = "Target district, scored only together with the city")]
        district: Option<String>,
        #[arg(long, help = "Result limit (clamped to the service maximum)")]
        limit: Option<i64>,
        #[arg(long, help = "Viewer id; their own listings are hidden")]
        user_id: Option<i64>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Recommend { city, district, limit, user_id } => {
            commands::recommend::run(city, district, limit, user_id)
        }
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
