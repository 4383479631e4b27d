//! objectlog CLI
//!
//! Command-line interface for appending to and reading from a log.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use objectlog::config::{ObjectStoreConfig, TailScan};
use objectlog::{Config, LogHandle, Record};
use tracing_subscriber::{fmt, EnvFilter};

/// objectlog CLI
#[derive(Parser, Debug)]
#[command(name = "objectlog-cli")]
#[command(about = "Append-only log on object storage")]
#[command(version)]
struct Args {
    /// TOML config file; replaces the store, prefix and listing flags
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, default_value = "local")]
    store: StoreKind,

    /// Data directory (local backend)
    #[arg(long, default_value = "./objectlog_data")]
    path: PathBuf,

    /// Bucket name (s3 backend)
    #[arg(long)]
    bucket: Option<String>,

    /// Region (s3 backend)
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Custom endpoint, e.g. a MinIO address (s3 backend)
    #[arg(long)]
    endpoint: Option<String>,

    /// Key prefix of the log
    #[arg(short, long, default_value = "wal")]
    prefix: String,

    /// Size limit for appends in bytes [default: from config, else 64 MiB]
    #[arg(long)]
    size_limit: Option<u64>,

    /// Deadline for each store call in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Trust the backend to list keys globally sorted across pages
    #[arg(long)]
    trust_listing_order: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StoreKind {
    Memory,
    Local,
    S3,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a record and print its offset
    Append {
        /// The payload to append
        payload: String,
    },

    /// Print the record at an offset
    Read {
        /// The offset to read
        offset: u64,
    },

    /// Print the last record
    Tail,

    /// Print every record from offset 1 to the tail
    Dump,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,objectlog=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> objectlog::Result<()> {
    let config = build_config(&args)?;
    tracing::debug!("Using {:?} store, prefix {:?}", config.store, config.prefix);

    let mut log = LogHandle::open(config).await?;

    match args.command {
        Commands::Append { payload } => {
            let limit = log.config().size_limit;
            let offset = log.append_with_retry(payload.as_bytes(), limit).await?;
            println!("{}", offset);
        }
        Commands::Read { offset } => {
            let record = log.read(offset).await?;
            print_record(&record);
        }
        Commands::Tail => {
            let record = log.last_record().await?;
            print_record(&record);
        }
        Commands::Dump => {
            for offset in 1..=log.length() {
                let record = log.read(offset).await?;
                print_record(&record);
            }
        }
    }

    Ok(())
}

fn build_config(args: &Args) -> objectlog::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => config_from_flags(args)?,
    };

    if let Some(limit) = args.size_limit {
        config.size_limit = limit;
    }
    if let Some(ms) = args.timeout_ms {
        config.op_timeout = Some(Duration::from_millis(ms));
    }

    Ok(config)
}

fn config_from_flags(args: &Args) -> objectlog::Result<Config> {
    let store = match args.store {
        StoreKind::Memory => ObjectStoreConfig::InMemory,
        StoreKind::Local => ObjectStoreConfig::Local {
            path: args.path.clone(),
        },
        StoreKind::S3 => {
            let bucket = args.bucket.clone().ok_or_else(|| {
                objectlog::LogError::Config("--bucket is required for the s3 store".to_string())
            })?;
            ObjectStoreConfig::Aws {
                bucket,
                region: args.region.clone(),
                endpoint: args.endpoint.clone(),
            }
        }
    };

    let tail_scan = if args.trust_listing_order {
        TailScan::TrustListingOrder
    } else {
        TailScan::RunningMax
    };

    Ok(Config::builder()
        .prefix(&args.prefix)
        .store(store)
        .tail_scan(tail_scan)
        .build())
}

fn print_record(record: &Record) {
    println!("{}\t{}", record.offset, String::from_utf8_lossy(&record.payload));
}
