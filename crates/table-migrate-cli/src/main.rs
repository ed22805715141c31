//! table-migrate CLI - mapping-driven MySQL table migration.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use table_migrate::inspect::save_structure;
use table_migrate::{
    Config, MappingRegistry, MigrateError, MigrationPlan, Orchestrator, RunSummary, Side,
};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "table-migrate")]
#[command(about = "Dependency-ordered, mapping-driven MySQL table migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file [default: SOURCE_DB_* / DEST_DB_* environment]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to YAML table mappings file
    #[arg(short, long, default_value = "mappings.yaml")]
    mappings: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate all mapped tables in dependency order
    Migrate {
        /// Fetch and report without writing to the destination
        #[arg(long)]
        dry_run: bool,

        /// Override rows per insert batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Skip tables whose destination already holds rows
        #[arg(long)]
        skip_if_exists: bool,

        /// Migrate only this source table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Validate the mappings and print the execution order
    Plan,

    /// Test a database connection
    TestConnection {
        #[arg(value_enum)]
        target: Target,
    },

    /// Describe tables and save the structure as JSON
    ListTables {
        #[arg(value_enum, default_value = "both")]
        target: ListTarget,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Source,
    Destination,
}

impl From<Target> for Side {
    fn from(target: Target) -> Self {
        match target {
            Target::Source => Side::Source,
            Target::Destination => Side::Destination,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ListTarget {
    Source,
    Destination,
    Both,
}

impl ListTarget {
    fn sides(self) -> &'static [Side] {
        match self {
            ListTarget::Source => &[Side::Source],
            ListTarget::Destination => &[Side::Destination],
            ListTarget::Both => &[Side::Source, Side::Destination],
        }
    }
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
        Commands::Plan => {
            let registry = MappingRegistry::load(&cli.mappings)?;
            let plan = MigrationPlan::build(&registry)?;
            print_plan(&plan, cli.output_json)?;
        }

        Commands::Migrate {
            dry_run,
            batch_size,
            skip_if_exists,
            table,
        } => {
            let registry = MappingRegistry::load(&cli.mappings)?;
            info!(
                "Loaded {} table mappings from {:?}",
                registry.len(),
                cli.mappings
            );

            let mut config = load_config(cli.config.as_deref())?;
            // Apply overrides
            if dry_run {
                config.migration.dry_run = true;
            }
            if skip_if_exists {
                config.migration.skip_if_exists = true;
            }
            if let Some(size) = batch_size {
                config.migration.batch_size = size;
            }
            config.validate()?;

            let orchestrator = Orchestrator::new(config, registry);
            let summary = orchestrator.run(table.as_deref()).await?;

            if cli.output_json {
                println!("{}", summary.to_json()?);
            } else {
                print_summary(&summary);
            }

            if summary.has_failures() {
                return Err(MigrateError::Incomplete(summary.tables_failed));
            }
        }

        Commands::TestConnection { target } => {
            let config = load_config(cli.config.as_deref())?;
            let orchestrator = Orchestrator::new(config, MappingRegistry::default());
            let side = Side::from(target);

            match orchestrator.test_connection(side).await {
                Ok(check) => {
                    if cli.output_json {
                        println!("{}", serde_json::to_string_pretty(&check)?);
                    } else {
                        println!(
                            "{} connection: OK ({}ms, {}, 1 + 1 = {})",
                            side,
                            check.latency.as_millis(),
                            check.target,
                            check.result
                        );
                    }
                }
                Err(e) => {
                    println!("{} connection: FAILED", side);
                    return Err(e);
                }
            }
        }

        Commands::ListTables { target, output } => {
            let config = load_config(cli.config.as_deref())?;
            let orchestrator = Orchestrator::new(config, MappingRegistry::default());

            for &side in target.sides() {
                let tables = orchestrator.list_tables(side).await?;
                let path = save_structure(&tables, side.as_str(), &output)?;
                println!(
                    "{}: {} tables saved to {}",
                    side,
                    tables.len(),
                    path.display()
                );
            }
        }
    }

    Ok(())
}

/// Load the configuration file, or fall back to environment variables when
/// no file is given.
fn load_config(path: Option<&Path>) -> Result<Config, MigrateError> {
    match path {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        None => {
            let config = Config::from_env()?;
            info!("Loaded configuration from environment");
            Ok(config)
        }
    }
}

fn print_plan(plan: &MigrationPlan<'_>, output_json: bool) -> Result<(), MigrateError> {
    if output_json {
        let json = serde_json::json!({ "execution_order": plan.execution_order() });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("Execution order:");
    for (i, mapping) in plan.ordered_mappings().iter().enumerate() {
        if mapping.dependencies.is_empty() {
            println!("  {:>3}. {} -> {}", i + 1, mapping.source_table, mapping.destination_table);
        } else {
            println!(
                "  {:>3}. {} -> {} (after {})",
                i + 1,
                mapping.source_table,
                mapping.destination_table,
                mapping.dependencies.join(", ")
            );
        }
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let status_msg = if summary.dry_run {
        "Dry run completed!"
    } else {
        "Migration completed!"
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", summary.run_id);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!(
        "  Tables: {}/{}",
        summary.tables_total - summary.tables_failed,
        summary.tables_total
    );
    println!(
        "  Rows: {}/{} ({} failed)",
        summary.migrated_rows, summary.total_rows, summary.failed_rows
    );

    for result in &summary.results {
        println!(
            "    {:<28} {:<10} {:>8}/{:<8} {:.2}s",
            result.table_name,
            result.status.as_str(),
            result.migrated_rows,
            result.total_rows,
            result.duration.as_secs_f64()
        );
        for error in result.errors.iter().take(5) {
            println!("      {}", error);
        }
        if result.errors.len() > 5 {
            println!("      ... and {} more", result.errors.len() - 5);
        }
    }

    let failed = summary.failed_tables();
    if !failed.is_empty() {
        println!("  Failed tables: {:?}", failed);
    }
}

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
