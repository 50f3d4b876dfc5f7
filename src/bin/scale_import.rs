use clap::Parser;
use scale_import_service::db::{InMemoryMeasurementStore, MeasurementRepository, MeasurementStore};
use scale_import_service::importers::DEFAULT_MAX_UPLOAD_BYTES;
use scale_import_service::models::{ImportStrategy, ParseResult};
use scale_import_service::services::ImportService;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "scale-import")]
#[command(about = "Import body-composition measurements from a vendor scale CSV export", long_about = None)]
struct Cli {
    /// Path to the vendor CSV export
    #[arg(long)]
    file: PathBuf,

    /// How to resolve several readings on the same date: keep_all or average
    #[arg(long, default_value = "keep_all")]
    strategy: ImportStrategy,

    /// Database connection string (not needed with --dry-run)
    #[arg(long, env)]
    database_url: Option<String>,

    /// Validate and aggregate without writing to the database
    #[arg(long)]
    dry_run: bool,

    /// Maximum accepted file size in bytes
    #[arg(long, env, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: u64,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

fn print_report(parsed: &ParseResult) {
    println!("\nRecords: {}", parsed.canonical_records.len());
    println!("Dates:   {}", parsed.grouped_by_date.len());

    if !parsed.duplicate_groups.is_empty() {
        println!("\nDates with several readings:");
        for group in &parsed.duplicate_groups {
            println!("  {}  x{}", group.date, group.count);
        }
    }

    if !parsed.validation.errors.is_empty() {
        println!("\nErrors:");
        for e in &parsed.validation.errors {
            println!("  ✗ {e}");
        }
    }

    if !parsed.validation.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &parsed.validation.warnings {
            println!("  ! {w}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let start_time = Instant::now();
    let service = ImportService::new(cli.max_upload_bytes);

    info!("Parsing {:?}", cli.file);
    let parsed = service.parse_file(&cli.file).await?;
    print_report(&parsed);

    if !parsed.validation.is_valid {
        error!(
            "{} validation errors, nothing imported",
            parsed.validation.errors.len()
        );
        return Err("validation failed".into());
    }

    if !cli.yes {
        println!(
            "\nImport {} records from {:?} using '{}'{}? [y/N]: ",
            parsed.canonical_records.len(),
            cli.file,
            cli.strategy,
            if cli.dry_run { " (dry run)" } else { "" }
        );

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Import cancelled.");
            return Ok(());
        }
    }

    let store: Box<dyn MeasurementStore> = if cli.dry_run {
        warn!("Dry run: measurements are kept in memory only");
        Box::new(InMemoryMeasurementStore::new())
    } else {
        let database_url = cli
            .database_url
            .ok_or("--database-url (or DATABASE_URL) is required unless --dry-run is set")?;

        info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Box::new(MeasurementRepository::new(pool))
    };

    let result = service
        .commit_import(&parsed, cli.strategy, store.as_ref())
        .await?;

    println!(
        "\n✓ {} stored, {} failed ({} strategy, {:.1}s)",
        result.success_count,
        result.failure_count,
        result.strategy,
        start_time.elapsed().as_secs_f64()
    );
    for e in &result.errors {
        println!("  ✗ {e}");
    }

    info!("Import completed");
    Ok(())
}
