use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::application::LedgerService;
use crate::domain::{Address, Category, TravelItem};

/// Travelog - append-only travel ledger
#[derive(Parser)]
#[command(name = "travelog")]
#[command(about = "A local-first, append-only ledger of flights, hotels and other travel")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "travelog.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a travel item
    Submit {
        /// Category: flight, hotel, bus, other (or its code 0-3)
        category: String,

        /// Account submitting the item (0x-prefixed address)
        #[arg(short, long)]
        account: String,

        /// Where the trip starts
        #[arg(long, default_value = "")]
        origin: String,

        /// Where the trip ends
        #[arg(long, default_value = "")]
        destination: String,

        /// Date of the trip (YYYY-MM-DD)
        #[arg(long, conflicts_with = "timestamp")]
        date: Option<String>,

        /// Time of the trip in seconds since epoch (defaults to now)
        #[arg(long, allow_negative_numbers = true)]
        timestamp: Option<i64>,
    },

    /// Show a single item
    Show {
        /// Item id
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },

    /// List items, for everyone or for one owner
    Items {
        /// Only items owned by this address
        #[arg(long)]
        owner: Option<String>,
    },

    /// Count items, for everyone or for one owner
    Count {
        /// Only items owned by this address
        #[arg(long)]
        owner: Option<String>,
    },

    /// Verify ledger integrity
    Check,

    /// Export items to CSV or JSON
    Export {
        /// Format: csv, json
        format: String,

        /// Only items owned by this address
        #[arg(long)]
        owner: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Submit {
                category,
                account,
                origin,
                destination,
                date,
                timestamp,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let address = LedgerService::parse_address(&account)?;
                let code = parse_category(&category)?;

                let event_timestamp = match (date, timestamp) {
                    (Some(date_str), _) => parse_date(&date_str)
                        .with_context(|| {
                            format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
                        })?
                        .timestamp(),
                    (None, Some(ts)) => ts,
                    (None, None) => Utc::now().timestamp(),
                };

                let id = service
                    .as_account(address)
                    .submit(code, origin, destination, event_timestamp)
                    .await?;

                let item = service.get_item(id as i64).await?;
                println!(
                    "Recorded {} {} -> {} ({})",
                    item.category,
                    display_place(&item.origin),
                    display_place(&item.destination),
                    item.id
                );
            }

            Commands::Show { id } => {
                let service = LedgerService::connect(&self.database).await?;
                let item = service.get_item(id).await?;
                print_item(&item);
            }

            Commands::Items { owner } => {
                let service = LedgerService::connect(&self.database).await?;
                let items = match owner {
                    Some(owner) => {
                        let owner = LedgerService::parse_address(&owner)?;
                        service.items_for_owner(&owner).await?
                    }
                    None => service.list_items().await?,
                };
                print_items(&items);
            }

            Commands::Count { owner } => {
                let service = LedgerService::connect(&self.database).await?;
                let count = match owner {
                    Some(owner) => {
                        let owner = LedgerService::parse_address(&owner)?;
                        service.owner_count(&owner).await?
                    }
                    None => service.total_count().await?,
                };
                println!("{}", count);
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                format,
                owner,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let owner = owner
                    .map(|o| LedgerService::parse_address(&o))
                    .transpose()?;
                run_export_command(&service, &format, owner.as_ref(), output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Items:  {}", report.item_count);
    println!("Owners: {}", report.owner_count);
    println!();

    println!("Items by category:");
    for category in Category::ALL {
        let count = report
            .count_by_category
            .get(&category)
            .copied()
            .unwrap_or(0);
        println!("  {:<8} {:>8}", format!("{}:", category), count);
    }
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    format: &str,
    owner: Option<&Address>,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        "csv" => {
            let count = exporter.export_items_csv(writer, owner).await?;
            if output.is_some() {
                eprintln!("Exported {} items", count);
            }
        }
        "json" => {
            let snapshot = exporter.export_json(writer, owner).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} of {} items",
                    snapshot.items.len(),
                    snapshot.total_count
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export format '{}'. Valid formats: csv, json",
                format
            );
        }
    }

    Ok(())
}

fn print_item(item: &TravelItem) {
    println!("Item: {}", item.id);
    println!("  Owner:       {}", item.owner);
    println!("  Category:    {}", item.category);
    println!("  Origin:      {}", display_place(&item.origin));
    println!("  Destination: {}", display_place(&item.destination));
    println!("  Date:        {}", format_timestamp(item.event_timestamp));
    println!(
        "  Recorded at: {}",
        format_timestamp(item.created_at_timestamp)
    );
}

fn print_items(items: &[TravelItem]) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    println!(
        "{:>6} {:<12} {:<8} {:<20} {:<20} OWNER",
        "ID", "DATE", "CATEGORY", "ORIGIN", "DESTINATION"
    );
    println!("{}", "-".repeat(112));
    for item in items {
        let date = item
            .event_time()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| item.event_timestamp.to_string());
        println!(
            "{:>6} {:<12} {:<8} {:<20} {:<20} {}",
            item.id,
            date,
            item.category.as_str(),
            truncate(display_place(&item.origin), 20),
            truncate(display_place(&item.destination), 20),
            item.owner
        );
    }
}

/// Accept a category name or its numeric code. Unknown codes are passed
/// through so the ledger itself rejects them.
fn parse_category(input: &str) -> Result<i64> {
    if let Some(category) = Category::from_str(input) {
        return Ok(i64::from(category.code()));
    }
    input.trim().parse::<i64>().with_context(|| {
        format!(
            "Invalid category '{}'. Valid categories: flight, hotel, bus, other",
            input
        )
    })
}

fn display_place(place: &str) -> &str {
    if place.is_empty() { "-" } else { place }
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    use chrono::NaiveDate;

    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .context("Date must be in YYYY-MM-DD format")?;

    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;

    Ok(DateTime::from_naive_utc_and_offset(naive_datetime, Utc))
}
