#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the herd report ingestion tool.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use herd_knowledge_cli_utils::{IndicatifProgress, init_logger};
use herd_knowledge_database::loader::{LoadMode, load_population_dir};
use herd_knowledge_database::paths::{self, DataPaths};
use herd_knowledge_database::scripts::{ScriptReport, configure_s3, run_sql_scripts};
use herd_knowledge_ingest::{
    BatchRequest, IngestOutcome, RemoteDeps, audit_stale_population, ingest_local_population,
    run_batch,
};
use herd_knowledge_pdf::TextTableExtractor;
use herd_knowledge_storage::S3Store;
use herd_knowledge_textract::{DEFAULT_POLL_INTERVAL, TextractService};
use herd_knowledge_wildlife_models::{RecordContext, ReportKind, Species, StateCode};

#[derive(Parser)]
#[command(
    name = "herd_knowledge_ingest",
    about = "Wildlife population and harvest report ingestion tool"
)]
struct Cli {
    /// `DuckDB` database file (default: `data/database/herd_data.duckdb`)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    /// Local data directory for staging and processed files (default: `data/`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a population table from a local PDF and load it into `DuckDB`
    LocalPopulation {
        /// Path to the report PDF
        #[arg(long)]
        pdf: PathBuf,
        /// Two-letter state code (e.g., "co")
        #[arg(long)]
        state: StateCode,
        /// Species covered by the report
        #[arg(long)]
        species: Species,
        /// Report year
        #[arg(long)]
        year: i32,
    },
    /// Process population reports from object storage.
    /// Without `--year`, every report not yet processed is picked up.
    Population {
        #[arg(long)]
        state: StateCode,
        #[arg(long)]
        species: Species,
        #[arg(long)]
        year: Option<i32>,
        /// Seconds between job status checks
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        poll_secs: u64,
    },
    /// Process harvest reports for one season from object storage.
    /// Without `--year`, every report not yet processed is picked up.
    Harvest {
        #[arg(long)]
        state: StateCode,
        #[arg(long)]
        species: Species,
        /// Hunting season (e.g., "archery", "rifle")
        #[arg(long)]
        season: String,
        #[arg(long)]
        year: Option<i32>,
        /// Seconds between job status checks
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
        poll_secs: u64,
    },
    /// Load a directory of processed population parquet files into `DuckDB`
    LoadPopulation {
        /// Directory to scan recursively (default: `<data-dir>/processed`)
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        species: Species,
        /// Drop and recreate the population table before loading
        #[arg(long)]
        rebuild: bool,
    },
    /// Run the schema creation scripts
    CreateSchema {
        /// Directory of `.sql` files (default: `sql/create`)
        #[arg(long)]
        sql_dir: Option<PathBuf>,
    },
    /// Configure S3 access and run the hydration scripts
    Hydrate {
        /// Directory of `.sql` files (default: `sql/load`)
        #[arg(long)]
        sql_dir: Option<PathBuf>,
    },
    /// List processed population files missing the sex-ratio column
    AuditStale,
}

fn log_script_report(report: &ScriptReport) {
    if report.is_success() {
        log::info!("All {} scripts succeeded", report.succeeded.len());
    } else {
        log::error!(
            "{} of {} scripts failed",
            report.failed.len(),
            report.succeeded.len() + report.failed.len()
        );
    }
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let data_paths = cli.data_dir.map_or_else(DataPaths::default, DataPaths::new);
    let db_path = cli.db_path.unwrap_or_else(paths::default_db_path);
    let start = Instant::now();

    match cli.command {
        Commands::LocalPopulation {
            pdf,
            state,
            species,
            year,
        } => {
            let conn = herd_knowledge_database::open(&db_path)?;
            let ctx = RecordContext::new(state, species, year);
            match ingest_local_population(&TextTableExtractor, &pdf, &ctx, &data_paths, &conn)? {
                IngestOutcome::Processed { records, output } => {
                    log::info!("Loaded {records} records; parquet at {output}");
                }
                IngestOutcome::Skipped(reason) => log::warn!("Nothing loaded: {reason}"),
            }
        }
        Commands::Population {
            state,
            species,
            year,
            poll_secs,
        } => {
            let request = BatchRequest {
                state,
                species,
                kind: ReportKind::Population,
                season: None,
                year,
            };
            run_remote(&multi, &data_paths, &request, poll_secs).await?;
        }
        Commands::Harvest {
            state,
            species,
            season,
            year,
            poll_secs,
        } => {
            let request = BatchRequest {
                state,
                species,
                kind: ReportKind::Harvest,
                season: Some(season),
                year,
            };
            run_remote(&multi, &data_paths, &request, poll_secs).await?;
        }
        Commands::LoadPopulation {
            dir,
            species,
            rebuild,
        } => {
            let dir = dir.unwrap_or_else(|| data_paths.processed_dir());
            let mode = if rebuild {
                LoadMode::Rebuild
            } else {
                LoadMode::Upsert
            };
            let conn = herd_knowledge_database::open(&db_path)?;
            let report = load_population_dir(&conn, &dir, species, mode)?;
            log::info!(
                "Loaded {} rows from {} files ({} unreadable)",
                report.rows_loaded,
                report.files_read,
                report.files_failed.len()
            );
        }
        Commands::CreateSchema { sql_dir } => {
            let sql_dir = sql_dir.unwrap_or_else(|| paths::sql_dir("create"));
            let conn = herd_knowledge_database::open(&db_path)?;
            log_script_report(&run_sql_scripts(&conn, &sql_dir)?);
        }
        Commands::Hydrate { sql_dir } => {
            let sql_dir = sql_dir.unwrap_or_else(|| paths::sql_dir("load"));
            let conn = herd_knowledge_database::open(&db_path)?;
            configure_s3(&conn)?;
            log_script_report(&run_sql_scripts(&conn, &sql_dir)?);
        }
        Commands::AuditStale => {
            let store = S3Store::from_env().await?;
            let stale = audit_stale_population(&store, &data_paths.staging_dir()).await?;
            if stale.is_empty() {
                log::info!("No stale population files");
            }
            for key in &stale {
                println!("{key}");
            }
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

async fn run_remote(
    multi: &herd_knowledge_cli_utils::MultiProgress,
    data_paths: &DataPaths,
    request: &BatchRequest,
    poll_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = S3Store::from_env().await?;
    let analysis = TextractService::new(std::env::var("AWS_REGION").ok()).await;
    let deps = RemoteDeps {
        store: &store,
        analysis: &analysis,
        paths: data_paths,
        poll_interval: Duration::from_secs(poll_secs),
    };

    let progress = IndicatifProgress::files_bar(
        multi,
        &format!("{} {} {}", request.state, request.species, request.kind),
    );
    let summary = run_batch(&deps, request, progress.as_ref()).await?;
    log::info!(
        "{} processed, {} already processed, {} without a year, {} empty",
        summary.processed,
        summary.skipped_existing,
        summary.skipped_unparseable,
        summary.skipped_empty
    );

    Ok(())
}
