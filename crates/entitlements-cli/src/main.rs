//! sestest - generate and verify software entitlement tokens.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod source;

/// sestest - software entitlement token tool
#[derive(Parser, Debug)]
#[command(name = "sestest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new entitlement token
    Generate(commands::generate::GenerateArgs),

    /// Verify a token against an application and address
    Verify(commands::verify::VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let code = match cli.command {
        Commands::Generate(args) => commands::generate::run(&args),
        Commands::Verify(args) => commands::verify::run(&args),
    };
    ExitCode::from(code)
}
