//! Homelinx CLI - drives the offline cache worker and the listings client
//! from the command line.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use homelinx_core::cache::{CacheStorage, DiskCacheStorage};
use homelinx_core::models::{ListingType, PropertyType, SearchParams};
use homelinx_core::network::{HttpNetwork, Network};
use homelinx_core::utils::{format_bytes, truncate_string};
use homelinx_core::worker::{ActivationReport, FetchOutcome, Registration, ServiceWorker, UpdateOutcome};
use homelinx_core::{Config, ListingsClient, Method, Request, RequestMode};

/// Widest URL shown in the cache listing
const MAX_URL_DISPLAY: usize = 60;

#[derive(Parser)]
#[command(name = "homelinx", version, about = "Homelinx offline cache and listings tool")]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Install and activate the configured cache generation
    Install,
    /// Send one request through the offline cache worker
    Fetch {
        /// Path (or absolute URL) to request
        url: String,
        /// Issue the request as a top-level page load
        #[arg(long)]
        navigate: bool,
        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,
    },
    /// List cache generations and their entries
    Caches,
    /// Search property listings
    Search {
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long = "type", value_enum)]
        property_type: Option<TypeArg>,
        #[arg(long, value_enum)]
        listing_type: Option<ListingArg>,
    },
    /// Show one property listing
    Property { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum TypeArg {
    Residential,
    Commercial,
}

impl From<TypeArg> for PropertyType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Residential => PropertyType::Residential,
            TypeArg::Commercial => PropertyType::Commercial,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ListingArg {
    Sale,
    Rent,
}

impl From<ListingArg> for ListingType {
    fn from(arg: ListingArg) -> Self {
        match arg {
            ListingArg::Sale => ListingType::Sale,
            ListingArg::Rent => ListingType::Rent,
        }
    }
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_ref())?;

    let config = Config::load().context("Failed to load configuration")?;
    info!(cache = %config.worker.cache_name, origin = %config.origin, "Homelinx starting");

    match cli.command {
        Command::Install => install(&config).await,
        Command::Fetch { url, navigate, method } => fetch(&config, url, navigate, &method).await,
        Command::Caches => list_caches(&config).await,
        Command::Search {
            q,
            location,
            property_type,
            listing_type,
        } => {
            let params = SearchParams {
                q,
                location,
                property_type: property_type.map(Into::into),
                listing_type: listing_type.map(Into::into),
            };
            search(&config, &params).await
        }
        Command::Property { id } => property(&config, &id).await,
    }
}

struct Host {
    registration: Registration,
    storage: Arc<dyn CacheStorage>,
    network: Arc<HttpNetwork>,
}

impl Host {
    fn new(config: &Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        let storage = DiskCacheStorage::new(cache_dir.clone())
            .with_context(|| format!("Failed to open cache directory {}", cache_dir.display()))?;
        let network = HttpNetwork::new(&config.origin)?;

        Ok(Self {
            registration: Registration::with_origin(config.scope.clone(), network.origin().clone()),
            storage: Arc::new(storage),
            network: Arc::new(network),
        })
    }

    fn worker(&self, config: &Config) -> ServiceWorker {
        self.registration
            .worker(config.worker.clone(), Arc::clone(&self.storage), self.network.clone())
    }
}

fn print_report(report: &ActivationReport) {
    for name in &report.deleted {
        println!("  deleted stale cache {}", name);
    }
    for failure in &report.failed {
        println!("  could not delete {}: {}", failure.name, failure.error);
    }
}

async fn install(config: &Config) -> Result<()> {
    let host = Host::new(config)?;
    let mut worker = host.worker(config);

    match host.registration.update(&mut worker).await? {
        UpdateOutcome::Activated(report) => {
            println!("Activated {}", worker.cache_name());
            print_report(&report);
        }
        UpdateOutcome::Waiting => {
            println!("Installed {}, waiting for open pages to close", worker.cache_name());
        }
    }
    Ok(())
}

async fn fetch(config: &Config, url: String, navigate: bool, method: &str) -> Result<()> {
    let method = Method::parse(method).ok_or_else(|| anyhow::anyhow!("Unknown HTTP method: {}", method))?;
    let mut request = Request::new(method, url);
    if navigate {
        request = request.with_mode(RequestMode::Navigate);
    }

    let host = Host::new(config)?;
    let mut worker = host.worker(config);
    let report = worker
        .resume()
        .await
        .context("No complete cache generation - run `homelinx install` first")?;
    for name in &report.deleted {
        eprintln!("(deleted stale cache {})", name);
    }

    let response = match worker.handle_fetch(request.clone()).await.settled().await {
        FetchOutcome::Respond(response) => response,
        FetchOutcome::PassThrough => {
            eprintln!("(not intercepted, fetched directly)");
            host.network.fetch(&request).await?
        }
    };

    eprintln!("{} {}", response.status, response.status_text);
    println!("{}", response.text());
    Ok(())
}

async fn list_caches(config: &Config) -> Result<()> {
    let host = Host::new(config)?;
    let names = host.storage.keys().await?;
    if names.is_empty() {
        println!("No caches");
        return Ok(());
    }

    for name in names {
        let entries = host.storage.entries(&name).await?;
        let total: usize = entries.iter().map(|(_, e)| e.data.body.len()).sum();
        let marker = if name == config.worker.cache_name { " (current)" } else { "" };
        println!("{}{} - {} entries, {}", name, marker, entries.len(), format_bytes(total));

        for (url, entry) in entries {
            println!(
                "  {:<width$} {:>3} {:>10} {}",
                truncate_string(&url, MAX_URL_DISPLAY),
                entry.data.status,
                format_bytes(entry.data.body.len()),
                entry.age_display(),
                width = MAX_URL_DISPLAY,
            );
        }
    }
    Ok(())
}

async fn search(config: &Config, params: &SearchParams) -> Result<()> {
    let client = ListingsClient::new(config.api_url.clone())?;
    let results = client.search_properties(params).await;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn property(config: &Config, id: &str) -> Result<()> {
    let client = ListingsClient::new(config.api_url.clone())?;
    let property = client.get_property_by_id(id).await;
    println!("{}", serde_json::to_string_pretty(&property)?);
    Ok(())
}
