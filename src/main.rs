use analytics::MetricsEngine;
use anyhow::{Context, bail};
use api_client::{MetricsApi, MetricsClient};
use clap::{Args, Parser, Subcommand};
use configuration::{Config, LogFormat, init_tracing, load_config_from};
use core_types::{LedgerSettings, NewEntry, RawEntry, SettingsUpdate};
use database::{DbRepository, connect, run_migrations};
use ledger_io::{ExportKind, export_file_name, read_entries, write_daily, write_entries, write_monthly};
use std::fs::{self, File};
use std::io::BufWriter;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod render;

/// The main entry point for the PnL ledger application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error; DATABASE_URL may come from elsewhere.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = load_config_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Add(args) => handle_add(args, &config).await,
        Commands::Delete { id } => {
            open_repository(&config).await?.delete_entry(id).await?;
            println!("Deleted entry {id}.");
            Ok(())
        }
        Commands::List => {
            let entries = open_repository(&config).await?.list_entries().await?;
            println!("{}", render::entries_table(&entries));
            Ok(())
        }
        Commands::Report(args) => handle_report(args, &config).await,
        Commands::Settings(command) => handle_settings(command, &config).await,
        Commands::Import { file } => handle_import(&file, &config).await,
        Commands::Export { out_dir } => handle_export(&out_dir, &config).await,
        Commands::Remote(args) => handle_remote(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Track trading gains, losses, withdrawals and deposits, and report running
/// daily and monthly balances.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file. Missing files are fine; defaults and `PNL__*` variables apply.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the configured log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Record one ledger entry.
    Add(AddArgs),
    /// Remove an entry by id.
    Delete {
        /// The id printed by `list`.
        id: Uuid,
    },
    /// List the stored entries.
    List,
    /// Compute and print the daily or monthly series.
    Report(ReportArgs),
    /// Show or change the starting balance and exchange rate.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Replace all entries with the rows of a CSV file.
    Import {
        file: PathBuf,
    },
    /// Write the entries, daily and monthly CSV files into a directory.
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Send the entries of a CSV file to a remote server and print its report.
    Remote(RemoteArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind, e.g. 127.0.0.1:8080. Defaults to the configured host and port.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Args)]
struct AddArgs {
    /// The entry date (YYYY-MM-DD).
    #[arg(long)]
    date: String,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    gain: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    loss: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    withdrawal: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    deposit: f64,
}

#[derive(Args)]
struct ReportArgs {
    /// Aggregate by calendar month instead of by day.
    #[arg(long)]
    monthly: bool,
    /// Print the full report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the current settings.
    Show,
    /// Change one or both settings.
    Set {
        #[arg(long, allow_negative_numbers = true)]
        starting_balance: Option<f64>,
        #[arg(long)]
        exchange_rate: Option<f64>,
    },
}

#[derive(Args)]
struct RemoteArgs {
    /// Base URL of the server, e.g. http://127.0.0.1:5000.
    #[arg(long)]
    url: String,
    /// CSV file with the entries to send.
    file: PathBuf,
    /// Defaults to the server's stored setting.
    #[arg(long, allow_negative_numbers = true)]
    starting_balance: Option<f64>,
    /// Defaults to the server's stored setting.
    #[arg(long)]
    exchange_rate: Option<f64>,
    #[arg(long)]
    monthly: bool,
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Connects, migrates and seeds the settings row from the configured defaults.
async fn open_repository(config: &Config) -> anyhow::Result<DbRepository> {
    let pool = connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let repo = DbRepository::new(pool);
    repo.seed_settings(&LedgerSettings::from(&config.ledger))
        .await?;
    Ok(repo)
}

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        config.server.host = addr.ip().to_string();
        config.server.port = addr.port();
    }
    web_server::run_server(&config).await
}

async fn handle_add(args: AddArgs, config: &Config) -> anyhow::Result<()> {
    let raw = RawEntry::new(args.date)
        .with_gain(args.gain)
        .with_loss(args.loss)
        .with_withdrawal(args.withdrawal)
        .with_deposit(args.deposit);
    let new_entry = NewEntry::try_from(&raw)?;

    let entry = open_repository(config).await?.add_entry(&new_entry).await?;
    println!("Added entry {} for {}.", entry.id, entry.date);
    Ok(())
}

async fn handle_report(args: ReportArgs, config: &Config) -> anyhow::Result<()> {
    let repo = open_repository(config).await?;
    let entries: Vec<RawEntry> = repo.list_entries().await?.iter().map(RawEntry::from).collect();
    let settings = repo.get_settings().await?;

    let report = MetricsEngine::new().compute(
        &entries,
        settings.starting_balance,
        settings.exchange_rate,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::print_report(&report, args.monthly);
    }
    Ok(())
}

async fn handle_settings(command: SettingsCommand, config: &Config) -> anyhow::Result<()> {
    let repo = open_repository(config).await?;
    let settings = match command {
        SettingsCommand::Show => repo.get_settings().await?,
        SettingsCommand::Set {
            starting_balance,
            exchange_rate,
        } => {
            let update = SettingsUpdate {
                starting_balance,
                exchange_rate,
            };
            if update.is_empty() {
                bail!("Nothing to change: pass --starting-balance and/or --exchange-rate");
            }
            repo.update_settings(&update).await?
        }
    };
    println!("{}", render::settings_table(&settings));
    Ok(())
}

async fn handle_import(file: &Path, config: &Config) -> anyhow::Result<()> {
    let reader = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let (entries, summary) = read_entries(reader)?.into_validated();

    open_repository(config).await?.replace_entries(&entries).await?;
    println!(
        "Imported {} entries from {} ({} rows skipped).",
        summary.imported,
        file.display(),
        summary.skipped
    );
    Ok(())
}

async fn handle_export(out_dir: &Path, config: &Config) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let repo = open_repository(config).await?;
    let stored = repo.list_entries().await?;
    let entries: Vec<RawEntry> = stored.iter().map(RawEntry::from).collect();
    let settings = repo.get_settings().await?;
    let report = MetricsEngine::new().compute(
        &entries,
        settings.starting_balance,
        settings.exchange_rate,
    );

    let today = chrono::Utc::now().date_naive();
    for kind in [ExportKind::Entries, ExportKind::Daily, ExportKind::Monthly] {
        let path = out_dir.join(export_file_name(kind, today));
        let writer = BufWriter::new(
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?,
        );
        match kind {
            ExportKind::Entries => write_entries(writer, &entries)?,
            ExportKind::Daily => write_daily(writer, &report.daily)?,
            ExportKind::Monthly => write_monthly(writer, &report.monthly)?,
        }
        println!("Wrote {}", path.display());
    }
    Ok(())
}

async fn handle_remote(args: RemoteArgs, config: &Config) -> anyhow::Result<()> {
    let reader = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let outcome = read_entries(reader)?;
    if outcome.skipped_rows > 0 {
        tracing::warn!(skipped = outcome.skipped_rows, "Rows without a date were not sent.");
    }

    let client = MetricsClient::new(args.url.as_str(), &config.client)?;
    let health = client
        .health()
        .await
        .with_context(|| format!("Server at {} is not reachable", args.url))?;
    tracing::info!(status = %health.status, "Remote server is up.");

    let report = client
        .calculate_entries(outcome.entries, args.starting_balance, args.exchange_rate)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::print_report(&report, args.monthly);
    }
    Ok(())
}
