//! sql-migrate CLI - report which SQL migrations have been applied.

use clap::{Parser, Subcommand};
use sqlmigrate::{render, DbConfig, MigrateError, OutputFormat, StatusCommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "sql-migrate")]
#[command(about = "SQL schema migration status")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, global = true, default_value = "dbconfig.yml")]
    config: PathBuf,

    /// Environment to use from the configuration file
    #[arg(short, long, global = true, default_value = "development")]
    env: String,

    /// Log format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, global = true, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show migration status
    Status {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    match cli.command {
        Commands::Status { output } => {
            // Reject a bad format before touching the database
            let format: OutputFormat = output.parse()?;

            let config = DbConfig::load(&cli.config)?;
            debug!("Loaded configuration from {:?}", cli.config);
            let env = config.environment(&cli.env)?;

            let status = StatusCommand::from_environment(&env).await?.run().await?;
            let rendered = render(&status.entries, format)?;
            if rendered.ends_with('\n') {
                print!("{}", rendered);
            } else {
                println!("{}", rendered);
            }
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only the rendered status.
fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
