//! sqlite-pg-migrate CLI - one-shot SQLite to PostgreSQL migration.

use clap::{Parser, Subcommand};
use sqlite_pg_migrate::{Config, MigrateError, Orchestrator, ProgressUpdate};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "sqlite-pg-migrate")]
#[command(about = "One-shot SQLite to PostgreSQL bulk migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target database descriptor
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Rows per bulk insert (minimum 100)
    #[arg(long, env = "MIGRATION_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// TLS mode: disable, prefer, require, verify-ca, verify-full
    #[arg(long)]
    ssl_mode: Option<String>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Print progress updates as JSON lines to stderr
    #[arg(long)]
    progress: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration (default when no command is given)
    Run {
        /// Source SQLite file [default: maliyet.db next to the executable]
        source: Option<PathBuf>,
    },

    /// Validate row counts between source and target
    Validate {
        /// Source SQLite file
        source: Option<PathBuf>,
    },

    /// Test database connections
    HealthCheck {
        /// Source SQLite file
        source: Option<PathBuf>,
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

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let command = cli.command.unwrap_or(Commands::Run { source: None });

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    // Apply overrides
    if let Some(url) = cli.database_url {
        config.target.url = url;
    }
    if let Some(size) = cli.batch_size {
        config.migration.batch_size = Some(size);
    }
    if let Some(mode) = cli.ssl_mode {
        config.target.ssl_mode = Some(mode);
    }
    let source = match &command {
        Commands::Run { source }
        | Commands::Validate { source }
        | Commands::HealthCheck { source } => source.clone(),
    };
    if let Some(path) = source {
        config.source.path = path;
    }

    let orchestrator = Orchestrator::new(config)?;

    match command {
        Commands::Run { .. } => {
            let (orchestrator, printer) = if cli.progress {
                let (tx, rx) = mpsc::channel::<ProgressUpdate>(100);
                (orchestrator.with_progress(tx), Some(tokio::spawn(print_progress(rx))))
            } else {
                (orchestrator, None)
            };

            let result = orchestrator.run().await;

            // Closes the progress channel so the printer drains and exits
            drop(orchestrator);
            if let Some(printer) = printer {
                let _ = printer.await;
            }
            let report = result?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\nMigration completed!");
                println!("  Run ID: {}", report.run_id);
                println!("  Duration: {:.2}s", report.duration_seconds);
                for table in &report.tables {
                    println!("  - {}: {} rows", table.name, table.rows);
                }
                println!(
                    "  Total: {} rows in {} tables",
                    report.total_rows,
                    report.tables.len()
                );
            }
        }

        Commands::Validate { .. } => {
            let results = orchestrator.validate().await?;
            let mismatched: Vec<String> = results
                .iter()
                .filter(|r| !r.matches)
                .map(|r| r.table.clone())
                .collect();

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for r in &results {
                    println!(
                        "  {} {}: source={} target={}",
                        if r.matches { "OK      " } else { "MISMATCH" },
                        r.table,
                        r.source_rows,
                        r.target_rows
                    );
                }
            }

            if !mismatched.is_empty() {
                return Err(MigrateError::RowCountMismatch(mismatched));
            }
            println!("Validation completed successfully");
        }

        Commands::HealthCheck { .. } => {
            let result = orchestrator.health_check().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (SQLite): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target: {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::pool("one or more stores unreachable", "health check"));
            }
        }
    }

    Ok(())
}

/// Print progress updates as JSON lines until the channel closes.
async fn print_progress(mut rx: mpsc::Receiver<ProgressUpdate>) {
    while let Some(update) = rx.recv().await {
        if let Ok(line) = serde_json::to_string(&update) {
            eprintln!("{}", line);
        }
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("Invalid verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("Invalid log format '{}'", other)),
    }

    Ok(())
}
