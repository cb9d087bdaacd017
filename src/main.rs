//! Investigation Agent CLI
//!
//! Collects device telemetry into a JSON bundle, then shares or uploads it.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use investigation_agent::{
    collector::{
        Coordinate, DirectoryPhotoLibrary, FixedLocationService, HostDevice, PathSchemeProbe,
        PhotoQuery, SortOrder,
    },
    config::Config,
    export::{BundleStore, DirectoryShare, OpenerShare, ShareTarget},
    transparency::{create_shared_log_with_persistence, SharedActivityLog},
    InvestigationAgent, COLLECTION_DECLARATION, VERSION,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "upload")]
use investigation_agent::{UploadClient, UploadConfig};

#[derive(Parser)]
#[command(name = "investigation-agent")]
#[command(version = VERSION)]
#[command(about = "Collect device telemetry into a JSON bundle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect telemetry and save the bundle
    Collect {
        /// Maximum number of photos to collect
        #[arg(long)]
        limit: Option<usize>,

        /// First day of the photo range (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day of the photo range (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Photo order by creation date (defaults to the configured one)
        #[arg(long, value_enum)]
        order: Option<OrderArg>,

        /// Folder used as the photo library
        #[arg(long)]
        photos_dir: Option<PathBuf>,

        /// Latitude reported by the location service
        #[arg(long, allow_negative_numbers = true, requires = "longitude")]
        latitude: Option<f64>,

        /// Longitude reported by the location service
        #[arg(long, allow_negative_numbers = true, requires = "latitude")]
        longitude: Option<f64>,
    },

    /// Share the saved bundle
    Share {
        /// Copy the bundle into this directory instead of opening it
        #[arg(long)]
        to: Option<PathBuf>,
    },

    /// Upload the saved bundle
    Upload {
        /// Receiving host (defaults to the configured one)
        #[arg(long)]
        host: Option<String>,

        /// Receiving port (defaults to the configured one)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show the saved bundle and activity
    Status,

    /// Display what the agent collects
    Declaration,

    /// Show configuration
    Config,

    /// Run the receiving endpoint (requires server feature)
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    /// Oldest first
    Asc,
    /// Newest first
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => SortOrder::Ascending,
            OrderArg::Desc => SortOrder::Descending,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {e}");
        Config::default()
    });

    match cli.command {
        Commands::Collect {
            limit,
            start,
            end,
            order,
            photos_dir,
            latitude,
            longitude,
        } => {
            let location = latitude.zip(longitude).map(|(lat, lon)| Coordinate::new(lat, lon));
            cmd_collect(
                &config,
                CollectArgs {
                    limit,
                    start,
                    end,
                    order,
                    photos_dir,
                    location,
                },
            )
            .await;
        }
        Commands::Share { to } => {
            cmd_share(&config, to).await;
        }
        Commands::Upload { host, port } => {
            cmd_upload(&config, host, port).await;
        }
        Commands::Status => {
            cmd_status(&config);
        }
        Commands::Declaration => {
            println!("{COLLECTION_DECLARATION}");
        }
        Commands::Config => {
            cmd_config(&config);
        }
        Commands::Serve { port } => {
            cmd_serve(&config, port).await;
        }
    }
}

struct CollectArgs {
    limit: Option<usize>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    order: Option<OrderArg>,
    photos_dir: Option<PathBuf>,
    location: Option<Coordinate>,
}

/// Resolve the photo range: whole days when given, else the lookback window ending now.
fn resolve_range(
    config: &Config,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let end = end
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|d| Utc.from_utc_datetime(&d))
        .unwrap_or(now);
    let start = start
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::default())))
        .or_else(|| end.checked_sub_months(Months::new(config.lookback_months)))
        .unwrap_or(end);
    (start, end)
}

/// The CLI order when given, else the configured one.
fn resolve_order(config: &Config, order: Option<OrderArg>) -> SortOrder {
    order.map(SortOrder::from).unwrap_or_else(|| config.sort_order())
}

/// Agent over the host services and the configured bundle file.
fn open_agent(
    config: &Config,
    location: Option<Coordinate>,
    photos_dir: &Path,
    activity: SharedActivityLog,
) -> InvestigationAgent<DirectoryPhotoLibrary> {
    InvestigationAgent::new(
        FixedLocationService::new(location),
        DirectoryPhotoLibrary::new(photos_dir),
        BundleStore::new(config.bundle_path()),
        activity,
    )
}

async fn cmd_collect(config: &Config, args: CollectArgs) {
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let (start, end) = resolve_range(config, args.start, args.end);
    let order = resolve_order(config, args.order);
    let query = match PhotoQuery::new(args.limit.unwrap_or(config.photo_limit), start, end, order) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let location = args.location.or(config.location);
    let photos_dir = args.photos_dir.unwrap_or_else(|| config.photos_dir.clone());
    let activity = create_shared_log_with_persistence(config.activity_log_path());

    let mut agent = open_agent(config, location, &photos_dir, activity.clone());
    agent.refresh_device(&HostDevice, &PathSchemeProbe::from_env());

    println!("Investigation Agent v{VERSION}");
    println!();
    println!("  Device: {}", agent.device().descriptor);
    println!("  Battery: {}%", agent.device().battery_percent());

    if location.is_some() {
        let mut updates = agent.location_provider().subscribe();
        let first_fix = updates.wait_for(|c| c.is_some());
        let _ = tokio::time::timeout(Duration::from_secs(2), first_fix).await;
    }
    match agent.location() {
        Some(coordinate) => println!("  Location: {coordinate}"),
        None => println!("  Location: unavailable"),
    }

    if agent.installed_apps().is_empty() {
        println!("  Apps detected: none");
    } else {
        println!("  Apps detected: {}", agent.installed_apps().join(", "));
    }

    println!(
        "  Photos: up to {} from {} to {} ({:?}) in {:?}",
        query.limit(),
        query.start().format("%Y-%m-%d"),
        query.end().format("%Y-%m-%d"),
        query.order(),
        photos_dir
    );

    match agent.collect_photos(query).await {
        Ok(report) if report.status.is_granted() => {
            println!("  Photos collected: {}", report.published);
        }
        Ok(report) => {
            println!("  Photo access refused ({:?}); no photos collected", report.status);
        }
        Err(e) => eprintln!("Error collecting photos: {e}"),
    }

    match agent.save() {
        Ok(bundle) => {
            println!();
            println!(
                "Saved bundle with {} photo(s) to {:?}",
                bundle.photos_count,
                agent.store().path()
            );
        }
        Err(e) => eprintln!("Error saving bundle: {e}"),
    }

    if let Err(e) = activity.save() {
        eprintln!("Warning: Could not save activity log: {e}");
    }
}

async fn cmd_share(config: &Config, to: Option<PathBuf>) {
    let activity = create_shared_log_with_persistence(config.activity_log_path());
    let agent = open_agent(config, config.location, &config.photos_dir, activity.clone());

    let target: Box<dyn ShareTarget> = match to {
        Some(dir) => Box::new(DirectoryShare::new(dir)),
        None => Box::new(OpenerShare),
    };

    match agent.share(target.as_ref()) {
        Ok(()) => println!("Shared {:?} via {}", agent.store().path(), target.name()),
        Err(e) => {
            eprintln!("Error sharing bundle: {e}");
            eprintln!("Run 'investigation-agent collect' to create one.");
        }
    }

    if let Err(e) = activity.save() {
        eprintln!("Warning: Could not save activity log: {e}");
    }
}

#[cfg(feature = "upload")]
async fn cmd_upload(config: &Config, host: Option<String>, port: Option<u16>) {
    let upload_config = UploadConfig::new(
        host.unwrap_or_else(|| config.upload.host.clone()),
        port.unwrap_or(config.upload.port),
    );
    let activity = create_shared_log_with_persistence(config.activity_log_path());
    let agent = open_agent(config, config.location, &config.photos_dir, activity.clone());

    let client = match UploadClient::new(upload_config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error creating upload client: {e}");
            std::process::exit(1);
        }
    };

    let path = agent.store().path();
    println!("Uploading {:?} to {}", path, client.config().upload_url());
    match agent.upload(&client).await {
        Ok(receipt) => {
            println!("Server response: {} ({} bytes sent)", receipt.status, receipt.bytes_sent);
        }
        Err(e) => eprintln!("Upload failed: {e}"),
    }

    if let Err(e) = activity.save() {
        eprintln!("Warning: Could not save activity log: {e}");
    }
}

#[cfg(not(feature = "upload"))]
async fn cmd_upload(_config: &Config, _host: Option<String>, _port: Option<u16>) {
    eprintln!("Error: upload requires the 'upload' feature");
    std::process::exit(1);
}

fn cmd_status(config: &Config) {
    println!("Investigation Agent Status");
    println!("==========================");
    println!();

    let store = BundleStore::new(config.bundle_path());
    match store.load() {
        Ok(bundle) => {
            println!("Saved bundle: {:?}", store.path());
            println!("  Timestamp: {}", bundle.timestamp);
            println!("  Device: {}", bundle.device);
            println!("  Battery: {}", bundle.battery);
            println!("  Location: {}", bundle.location);
            println!("  Apps: {}", bundle.installed_apps.join(", "));
            println!("  Photos: {}", bundle.photos_count);
        }
        Err(e) => println!("No saved bundle ({e})"),
    }
    println!();

    let activity = create_shared_log_with_persistence(config.activity_log_path());
    println!("{}", activity.summary());
}

fn cmd_config(config: &Config) {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );
}

#[cfg(feature = "server")]
async fn cmd_serve(config: &Config, port: Option<u16>) {
    use investigation_agent::server::{run, ServerConfig};

    let server_config = ServerConfig::new(port.unwrap_or(config.server_port));
    let (addr, shutdown_tx) = match run(server_config).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("Receiving bundles on http://{addr}/upload");
    println!("Press Ctrl+C to stop");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let stop_tx = std::sync::Mutex::new(Some(stop_tx));
    if let Err(e) = ctrlc::set_handler(move || {
        if let Some(tx) = stop_tx.lock().ok().and_then(|mut tx| tx.take()) {
            let _ = tx.send(());
        }
    }) {
        eprintln!("Error setting Ctrl+C handler: {e}");
        std::process::exit(1);
    }

    let _ = stop_rx.await;
    println!();
    println!("Stopping server...");
    let _ = shutdown_tx.send(());
    // Let in-flight requests finish
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[cfg(not(feature = "server"))]
async fn cmd_serve(_config: &Config, _port: Option<u16>) {
    eprintln!("Error: serve requires the 'server' feature");
    std::process::exit(1);
}
