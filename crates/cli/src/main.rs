// ABOUTME: CLI transport for the granary pipeline.
// ABOUTME: Scrapes a URL or PDF file, or lists stored records, and prints JSON.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use granary::{
    HttpCapability, MemoryStore, Pipeline, RestStore, ScrapeRequest, ScrapeSource, Store,
    StoreConfig,
};

/// Extract structured content from a page or PDF and persist it.
#[derive(Parser, Debug)]
#[command(name = "granary")]
#[command(about = "Scrape a page or PDF into the granary store", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Use an in-process store instead of the configured backend.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Navigation timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    /// Allow fetching from private/local networks.
    #[arg(long, global = true)]
    allow_private_networks: bool,

    /// Output compact JSON instead of pretty.
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a rendered web page.
    Scrape {
        /// URL to scrape.
        url: String,

        /// Requesting user/tenant id.
        #[arg(long)]
        owner: String,

        /// Partner key: switches persistence to an upsert on this key.
        #[arg(long)]
        partner_key: Option<String>,

        /// Partner display name.
        #[arg(long)]
        display_name: Option<String>,

        /// Partner logo URL.
        #[arg(long)]
        logo_url: Option<String>,
    },
    /// Scrape the text of a PDF file.
    ScrapePdf {
        /// Path to the PDF file.
        file: PathBuf,

        /// Requesting user/tenant id.
        #[arg(long)]
        owner: String,

        /// Filename to record instead of the file's own name.
        #[arg(long)]
        filename: Option<String>,
    },
    /// List stored scrape records.
    List {
        /// Only records for this owner.
        #[arg(long)]
        owner: Option<String>,
    },
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String> {
    if compact {
        serde_json::to_string(value).context("failed to serialize output")
    } else {
        serde_json::to_string_pretty(value).context("failed to serialize output")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    // Store endpoint and credential are required at startup; missing
    // configuration is fatal here, never a per-request error.
    let store: Arc<dyn Store> = if args.dry_run {
        Arc::new(MemoryStore::new())
    } else {
        let config = StoreConfig::from_env().context("store configuration missing")?;
        Arc::new(RestStore::new(config)?)
    };
    store.init().await?;

    let capability = HttpCapability::new(
        Duration::from_secs(args.timeout_secs),
        args.allow_private_networks,
    )?;
    let pipeline = Pipeline::new(capability, store)
        .with_navigation_timeout(Duration::from_secs(args.timeout_secs));

    match args.command {
        Command::Scrape {
            url,
            owner,
            partner_key,
            display_name,
            logo_url,
        } => {
            let outcome = pipeline
                .scrape(ScrapeRequest {
                    source: ScrapeSource::Website { url },
                    owner_id: owner,
                    partner_key,
                    display_name,
                    logo_url,
                })
                .await?;
            println!("{}", to_json(&outcome, args.compact)?);
        }
        Command::ScrapePdf {
            file,
            owner,
            filename,
        } => {
            let bytes =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let name = filename.or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            });
            let outcome = pipeline
                .scrape(ScrapeRequest {
                    source: ScrapeSource::Pdf { bytes, filename: name },
                    owner_id: owner,
                    partner_key: None,
                    display_name: None,
                    logo_url: None,
                })
                .await?;
            println!("{}", to_json(&outcome, args.compact)?);
        }
        Command::List { owner } => {
            let rows = match owner {
                Some(owner) => pipeline.list_scrapes_for_owner(&owner).await?,
                None => pipeline.list_scrapes().await?,
            };
            println!("{}", to_json(&rows, args.compact)?);
        }
    }

    Ok(())
}
