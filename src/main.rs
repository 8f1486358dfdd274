//! # Warelabel CLI
//!
//! Command-line interface for box labels on goods-receipt entries.
//!
//! ## Usage
//!
//! ```bash
//! # Serve the entry form API
//! warelabel serve --listen 0.0.0.0:8080
//!
//! # List printers reachable through the configured channel
//! warelabel printers
//!
//! # Derive boxes for an entry file and write the result back
//! warelabel derive entry.json --out entry.json
//!
//! # Render box 3 to a PNG
//! warelabel preview entry.json --box 3 --png box3.png
//!
//! # Print one box, or every box, on a named printer
//! warelabel print entry.json --box 3 --printer Zebra_ZD420
//! warelabel print entry.json --all
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use warelabel::{
    WarelabelError,
    api::{EntryApi, MemoryEntryApi, RemoteEntryApi, SkuResolver, SkuTable},
    config::{ChannelPreference, ClientConfig},
    dispatch::Dispatcher,
    inventory::Entry,
    server::{self, AppState, ServerConfig},
    service::LabelService,
    transport::Channel,
};

/// Warelabel - Box derivation, label rendering and print dispatch
#[derive(Parser, Debug)]
#[command(name = "warelabel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// JSON configuration file
    #[arg(long, global = true, env = "WARELABEL_CONFIG")]
    config: Option<PathBuf>,

    /// Print channel (overrides the config file)
    #[arg(long, global = true, value_enum, env = "WARELABEL_CHANNEL")]
    channel: Option<ChannelPreference>,

    /// Inventory API base URL (overrides the config file)
    #[arg(long, global = true, env = "WARELABEL_API_URL")]
    api_url: Option<String>,

    /// Print backend URL (overrides the config file)
    #[arg(long, global = true, env = "WARELABEL_PRINT_API_URL")]
    print_api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server for the entry form
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080", env = "WARELABEL_LISTEN")]
        listen: String,
    },

    /// List printers
    Printers,

    /// Derive boxes for an entry
    Derive {
        /// Entry JSON file
        entry: PathBuf,

        /// Write the updated entry here instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Render one box label to PNG
    Preview {
        /// Entry JSON file
        entry: PathBuf,

        /// Box number
        #[arg(long = "box")]
        box_number: u32,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },

    /// Print one box or all boxes of an entry
    Print {
        /// Entry JSON file
        entry: PathBuf,

        /// Box number to print
        #[arg(long = "box", conflicts_with = "all", required_unless_present = "all")]
        box_number: Option<u32>,

        /// Print every box
        #[arg(long)]
        all: bool,

        /// Printer name (defaults to auto-selection)
        #[arg(long)]
        printer: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), WarelabelError> {
    let cli = Cli::parse();
    let config = load_config(&cli.global)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(execute(cli.command, config))
}

fn load_config(args: &GlobalArgs) -> Result<ClientConfig, WarelabelError> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(channel) = args.channel {
        config.channel = channel;
    }
    if let Some(url) = &args.api_url {
        config.api_base_url = Some(url.clone());
    }
    if let Some(url) = &args.print_api_url {
        config.print_api_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn build_service(config: ClientConfig) -> Result<LabelService, WarelabelError> {
    let channel = Channel::probe(&config).await?;
    let dispatcher = Dispatcher::new(Arc::new(channel), config.poll.clone());

    let entries: Arc<dyn EntryApi>;
    let skus: Arc<dyn SkuResolver>;
    match config.api_base_url.as_deref() {
        Some(url) if config.is_online() => {
            let api = Arc::new(RemoteEntryApi::new(url, config.request_timeout())?);
            entries = api.clone();
            skus = api;
        }
        _ => {
            tracing::info!("no inventory API configured; running offline");
            entries = Arc::new(MemoryEntryApi::new());
            skus = Arc::new(
                config
                    .skus
                    .iter()
                    .fold(SkuTable::new(), |table, (description, sku)| table.with(description, sku)),
            );
        }
    }

    Ok(LabelService::new(entries, skus, dispatcher, config))
}

fn read_entry(path: &Path) -> Result<Entry, WarelabelError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| WarelabelError::Config(format!("invalid entry file {}: {}", path.display(), e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, WarelabelError> {
    serde_json::to_string_pretty(value).map_err(|e| WarelabelError::Render(e.to_string()))
}

async fn execute(command: Commands, config: ClientConfig) -> Result<(), WarelabelError> {
    let service = build_service(config).await?;

    match command {
        Commands::Serve { listen } => {
            let catalog = service.printers().await;
            let state = Arc::new(AppState::new(service, catalog));
            server::serve(ServerConfig { listen_addr: listen }, state).await
        }

        Commands::Printers => {
            let catalog = service.printers().await;
            for printer in &catalog.printers {
                println!(
                    "{:<24} {:<8} {:<10} labels={}",
                    printer.name,
                    format!("{:?}", printer.status).to_lowercase(),
                    format!("{:?}", printer.connection_type).to_lowercase(),
                    printer.supports_label_printing
                );
            }
            if let Some(auto) = catalog.auto_select() {
                println!("\nAuto-selected: {}", auto.name);
            }
            Ok(())
        }

        Commands::Derive { entry, out } => {
            let derived = service.derive(&read_entry(&entry)?)?;
            for warning in service.check_weights(&derived)? {
                eprintln!("Warning: {}", warning);
            }
            let json = to_json(&derived)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Derived {} box(es) into {}", derived.boxes.len(), path.display());
                }
                None => println!("{}", json),
            }
            Ok(())
        }

        Commands::Preview {
            entry,
            box_number,
            png,
        } => {
            let image = service.preview(&read_entry(&entry)?, box_number).await?;
            std::fs::write(&png, image.to_png()?)?;
            println!(
                "Saved box {} label ({}x{} at {} dpi) to {}",
                box_number,
                image.width(),
                image.height(),
                image.dpi,
                png.display()
            );
            Ok(())
        }

        Commands::Print {
            entry,
            box_number,
            all,
            printer,
        } => {
            let entry = read_entry(&entry)?;
            let catalog = service.printers().await;
            let mut session = service.new_session();
            if let Some(name) = printer {
                session.select(name);
            }

            if all {
                let report = service.print_all(&session, &catalog, &entry).await?;
                println!("{}", report.message());
                if report.failures() > 0 {
                    return Err(WarelabelError::Precondition(format!(
                        "{} of {} box(es) not printed",
                        report.failures(),
                        report.results.len()
                    )));
                }
            } else if let Some(box_number) = box_number {
                let printed = service.print_box(&session, &catalog, &entry, box_number).await?;
                println!("{}", printed.message());
            }
            Ok(())
        }
    }
}
