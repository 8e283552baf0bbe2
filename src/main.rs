use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row as PrettyRow, Table};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use smartfilter::config::ConfigStore;
use smartfilter::export::{export_records_csv, export_records_json};
use smartfilter::filter::FilterOp;
use smartfilter::import::import_csv;
use smartfilter::known::{KnownWalletStore, StoreError};
use smartfilter::record::{RawValue, Record};
use smartfilter::saved::SavedWallets;
use smartfilter::score::calculate_scores;
use smartfilter::session::AnalysisSession;
use smartfilter::wallet::{format_wallet_address, gmgn_url, is_valid_wallet, solscan_url};

#[derive(Parser)]
#[clap(
    name = "smartfilter",
    about = "Filter and score wallet trading activity exports"
)]
struct Cli {
    /// SQLite database holding the known-wallet catalogue
    #[clap(long, env = "DATABASE_PATH", default_value = "smartfilter.db", global = true)]
    database: String,

    /// Settings file for filters and the saved-wallet shortlist
    #[clap(
        long,
        env = "SMARTFILTER_SETTINGS",
        default_value = "smartfilter.json",
        global = true
    )]
    settings: PathBuf,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a sheet export, apply the active filters, and view results
    Analyze {
        /// CSV export to analyze
        file: PathBuf,

        /// Page through records one at a time instead of printing a table
        #[clap(short, long)]
        interactive: bool,

        /// Maximum rows to print in table mode
        #[clap(short, long, default_value = "20")]
        limit: usize,
    },

    /// Write the filtered records to a file
    Export {
        /// CSV export to analyze
        file: PathBuf,

        /// Destination file
        #[clap(short, long)]
        output: PathBuf,

        /// Output format (csv or json)
        #[clap(long, default_value = "csv")]
        format: String,
    },

    /// Manage the known-wallet catalogue
    Known {
        #[clap(subcommand)]
        command: KnownCommands,
    },

    /// Manage the persisted column filters
    Filters {
        #[clap(subcommand)]
        command: FilterCommands,
    },

    /// Manage the saved-wallet shortlist
    Saved {
        #[clap(subcommand)]
        command: SavedCommands,
    },
}

#[derive(Subcommand)]
enum KnownCommands {
    /// Catalogue a single wallet
    Add {
        wallet: String,

        #[clap(short, long, default_value = "")]
        description: String,
    },

    /// Catalogue every wallet from a CSV of wallet,description rows
    Import { file: PathBuf },

    /// Remove a wallet from the catalogue
    Remove { wallet: String },

    /// Empty the catalogue
    Clear,

    /// Print the catalogue
    List,

    /// Write the catalogue to a file
    Export {
        output: PathBuf,

        /// Output format (csv or json)
        #[clap(long, default_value = "json")]
        format: String,
    },
}

#[derive(Subcommand)]
enum FilterCommands {
    /// Set (or replace) the filter for a column
    Set {
        column: String,

        /// One of eq, gt, lt, gte, lte, contains
        operator: String,

        value: String,
    },

    /// Remove the filter for a column
    Remove { column: String },

    /// Remove every filter
    Clear,

    /// Print the active filters
    List,

    /// Toggle the known-wallet exclusion pass
    ExcludeKnown {
        #[clap(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand)]
enum SavedCommands {
    Add { wallet: String },
    Remove { wallet: String },
    Clear,
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    smartfilter::logging::configure_logging();

    let args = Cli::parse();
    let store = KnownWalletStore::new(&args.database);
    let config = ConfigStore::new(&args.settings);

    match args.command {
        Commands::Analyze {
            file,
            interactive,
            limit,
        } => analyze(&store, &config, &file, interactive, limit).await?,
        Commands::Export {
            file,
            output,
            format,
        } => export_filtered(&store, &config, &file, &output, &format).await?,
        Commands::Known { command } => run_known_command(&store, command).await?,
        Commands::Filters { command } => run_filter_command(&store, &config, command)?,
        Commands::Saved { command } => run_saved_command(&config, command),
    }

    Ok(())
}

/// Build a session over an imported file. Store initialization failures
/// are non-fatal: the pass runs against an empty cache and a later run
/// retries.
async fn load_session<'a>(
    store: &'a KnownWalletStore,
    config: &'a ConfigStore,
    file: &PathBuf,
) -> Result<AnalysisSession<'a>> {
    if let Err(err) = store.initialize().await {
        warn!("Known-wallet store unavailable, excluding nothing: {}", err);
    }

    let dataset = import_csv(file)?;
    let mut session = AnalysisSession::new(store, config);
    session.import(dataset);
    Ok(session)
}

async fn analyze(
    store: &KnownWalletStore,
    config: &ConfigStore,
    file: &PathBuf,
    interactive: bool,
    limit: usize,
) -> Result<()> {
    let mut session = load_session(store, config, file).await?;

    println!(
        "{} of {} records match ({} filters, exclude known: {})",
        session.filtered().len(),
        session.total(),
        session.filters().len(),
        session.exclude_known()
    );

    if interactive {
        page_through(&mut session, config)?;
    } else {
        print_records_table(&session, limit);
    }

    Ok(())
}

fn print_records_table(session: &AnalysisSession<'_>, limit: usize) {
    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("#"),
        Cell::new("Wallet"),
        Cell::new("Aggressive"),
        Cell::new("Conservative"),
        Cell::new("Universal"),
    ]));

    for (index, record) in session.filtered().iter().take(limit).enumerate() {
        let scores = calculate_scores(record);
        let wallet = record
            .wallet()
            .map(|w| format_wallet_address(w, 4, 4))
            .unwrap_or_default();
        table.add_row(PrettyRow::new(vec![
            Cell::new(&index.to_string()),
            Cell::new(&wallet),
            Cell::new(&format!("{:.3}", scores.aggressive)),
            Cell::new(&format!("{:.3}", scores.conservative)),
            Cell::new(&format!("{:.3}", scores.universal)),
        ]));
    }

    table.printstd();

    let shown = session.filtered().len().min(limit);
    if shown < session.filtered().len() {
        println!(
            "Showing {} of {} records (raise --limit for more)",
            shown,
            session.filtered().len()
        );
    }
}

fn print_record_detail(session: &AnalysisSession<'_>, record: &Record) {
    let mut table = Table::new();
    for header in session.headers() {
        if let Some(value) = record.get(header) {
            table.add_row(PrettyRow::new(vec![
                Cell::new(header),
                Cell::new(&value.to_string()),
            ]));
        }
    }
    table.printstd();

    if let Some(scores) = session.current_scores() {
        println!(
            "Scores: aggressive {:.3} | conservative {:.3} | universal {:.3}",
            scores.aggressive, scores.conservative, scores.universal
        );
    }
    if let Some(wallet) = record.wallet() {
        println!("  {}", solscan_url(wallet));
        println!("  {}", gmgn_url(wallet));
    }
}

fn page_through(session: &mut AnalysisSession<'_>, config: &ConfigStore) -> Result<()> {
    let mut saved = SavedWallets::load(config);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let record = match session.current() {
            Some(record) => record.clone(),
            None => {
                println!("No records match the active filters.");
                return Ok(());
            }
        };

        println!(
            "\nRecord {} of {}",
            session.position().map(|p| p + 1).unwrap_or(0),
            session.filtered().len()
        );
        print_record_detail(session, &record);

        print!("[n]ext [p]rev [s]ave [q]uit > ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(()),
        };

        match line.trim() {
            "n" => {
                if !session.next() {
                    println!("Already at the last record.");
                }
            }
            "p" => {
                if !session.prev() {
                    println!("Already at the first record.");
                }
            }
            "s" => match record.wallet() {
                Some(wallet) => {
                    if saved.add(config, wallet) {
                        println!("Saved {}", wallet);
                    } else {
                        println!("{} is already saved.", wallet);
                    }
                }
                None => println!("Record has no wallet column."),
            },
            "q" => return Ok(()),
            other => println!("Unrecognized input '{}'", other),
        }
    }
}

async fn export_filtered(
    store: &KnownWalletStore,
    config: &ConfigStore,
    file: &PathBuf,
    output: &PathBuf,
    format: &str,
) -> Result<()> {
    let session = load_session(store, config, file).await?;

    match format {
        "csv" => export_records_csv(output, session.headers(), session.filtered())?,
        "json" => export_records_json(output, session.filtered())?,
        other => bail!("unknown export format '{}' (expected csv or json)", other),
    }

    println!(
        "Wrote {} records to {}",
        session.filtered().len(),
        output.display()
    );
    Ok(())
}

async fn run_known_command(store: &KnownWalletStore, command: KnownCommands) -> Result<()> {
    match command {
        KnownCommands::Add {
            wallet,
            description,
        } => {
            if !is_valid_wallet(&wallet) {
                warn!("'{}' does not look like a wallet address", wallet);
            }
            match store.add(&wallet, &description).await {
                Ok(entry) => println!("Added {} ({})", entry.wallet, entry.added_at),
                Err(StoreError::Duplicate(wallet)) => {
                    println!("{} is already catalogued.", wallet)
                }
                Err(err) => return Err(err.into()),
            }
        }
        KnownCommands::Import { file } => {
            let entries = read_wallet_entries(&file)?;
            let summary = store.add_bulk(&entries).await?;
            println!("Added {}, skipped {}.", summary.added, summary.skipped);
        }
        KnownCommands::Remove { wallet } => {
            if store.remove(&wallet).await? {
                println!("Removed {}.", wallet);
            } else {
                println!("{} was not catalogued.", wallet);
            }
        }
        KnownCommands::Clear => {
            let cleared = store.clear().await?;
            println!("Removed {} wallets.", cleared);
        }
        KnownCommands::List => {
            store.initialize().await?;
            let mut table = Table::new();
            table.add_row(PrettyRow::new(vec![
                Cell::new("Wallet"),
                Cell::new("Description"),
                Cell::new("Added"),
            ]));
            for entry in store.export() {
                table.add_row(PrettyRow::new(vec![
                    Cell::new(&entry.wallet),
                    Cell::new(&entry.description),
                    Cell::new(&entry.added_at),
                ]));
            }
            table.printstd();
        }
        KnownCommands::Export { output, format } => {
            store.initialize().await?;
            let contents = match format.as_str() {
                "json" => store.export_json()?,
                "csv" => store.export_csv()?,
                other => bail!("unknown export format '{}' (expected csv or json)", other),
            };
            std::fs::write(&output, contents)?;
            println!("Wrote {} wallets to {}", store.count(), output.display());
        }
    }

    Ok(())
}

/// Read wallet,description rows; a file without a header row is also
/// accepted since the first column is always the wallet address.
fn read_wallet_entries(file: &PathBuf) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(file)?;

    let mut entries = Vec::new();
    for row in reader.records() {
        let row = row?;
        let wallet = match row.get(0) {
            Some(w) if !w.trim().is_empty() => w.trim().to_string(),
            _ => continue,
        };
        // Skip a header row if present.
        if wallet.eq_ignore_ascii_case("wallet") {
            continue;
        }
        let description = row.get(1).unwrap_or("").trim().to_string();
        entries.push((wallet, description));
    }

    if entries.is_empty() {
        bail!("no wallets found in {}", file.display());
    }
    Ok(entries)
}

fn run_filter_command(
    store: &KnownWalletStore,
    config: &ConfigStore,
    command: FilterCommands,
) -> Result<()> {
    let mut session = AnalysisSession::new(store, config);

    match command {
        FilterCommands::Set {
            column,
            operator,
            value,
        } => {
            let operator = FilterOp::from_str(&operator).map_err(anyhow::Error::msg)?;
            session.set_filter(column.clone(), operator, parse_value(&value));
            println!("Filter set: {} {} {}", column, operator, value);
        }
        FilterCommands::Remove { column } => {
            if session.remove_filter(&column) {
                println!("Removed filter on {}.", column);
            } else {
                println!("No filter on {}.", column);
            }
        }
        FilterCommands::Clear => {
            session.clear_filters();
            println!("Cleared all filters.");
        }
        FilterCommands::List => {
            if session.filters().is_empty() {
                println!("No active filters.");
            } else {
                for (column, filter) in session.filters().iter() {
                    println!("  {} {} {}", column, filter.operator, filter.value);
                }
            }
            println!("Exclude known wallets: {}", session.exclude_known());
        }
        FilterCommands::ExcludeKnown { enabled } => {
            session.set_exclude_known(enabled);
            println!("Exclude known wallets: {}", enabled);
        }
    }

    Ok(())
}

fn run_saved_command(config: &ConfigStore, command: SavedCommands) {
    let mut saved = SavedWallets::load(config);

    match command {
        SavedCommands::Add { wallet } => {
            if saved.add(config, &wallet) {
                println!("Saved {}.", wallet);
            } else {
                println!("{} is already saved.", wallet);
            }
        }
        SavedCommands::Remove { wallet } => {
            if saved.remove(config, &wallet) {
                println!("Removed {}.", wallet);
            } else {
                println!("{} was not saved.", wallet);
            }
        }
        SavedCommands::Clear => {
            saved.clear(config);
            println!("Cleared the shortlist.");
        }
        SavedCommands::List => {
            if saved.count() == 0 {
                println!("No saved wallets.");
            }
            for wallet in saved.wallets() {
                println!("  {}  {}", format_wallet_address(wallet, 4, 4), solscan_url(wallet));
            }
        }
    }
}

fn parse_value(value: &str) -> RawValue {
    match value.parse::<f64>() {
        Ok(n) => RawValue::Number(n),
        Err(_) => RawValue::Text(value.to_string()),
    }
}
