//! Price Watch
//!
//! Checks a list of product pages for price changes and reports them to a
//! Telegram chat. Meant to be started by an external scheduler; each
//! invocation does a single pass and exits.

mod admin;
mod config;
mod handler;

use clap::{Parser, Subcommand};
use config::AppConfig;
use pricewatch_store::SqliteStore;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Price Watch CLI
#[derive(Parser, Debug)]
#[command(name = "price-watch")]
#[command(about = "Scheduled price change notifier", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every target once (default)
    Run,
    /// Manage monitored targets
    Targets {
        #[command(subcommand)]
        action: TargetAction,
    },
    /// Show stored prices
    Prices,
}

#[derive(Subcommand, Debug)]
enum TargetAction {
    /// List registered targets
    List,
    /// Add or replace a target
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        /// Element rule entry, repeatable. Example: --element name=span --element class_=price
        #[arg(long = "element", value_parser = admin::parse_key_value)]
        element: Vec<(String, String)>,
    },
    /// Remove a target
    Remove {
        #[arg(long)]
        title: String,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

async fn run(config: &AppConfig) -> Result<(), handler::HandlerError> {
    let status = handler::invoke(config).await?;
    match serde_json::to_string(&status) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to encode run status: {}", e),
    }
    Ok(())
}

async fn manage_targets(config: &AppConfig, action: TargetAction) -> Result<(), handler::HandlerError> {
    let store = SqliteStore::connect(&config.database_url).await?;
    match action {
        TargetAction::List => {
            for line in admin::describe_targets(&store).await? {
                println!("{}", line);
            }
        }
        TargetAction::Add {
            title,
            url,
            element,
        } => {
            let target = admin::add_target(&store, title, url, element).await?;
            println!("Saved {}", target.title);
        }
        TargetAction::Remove { title } => {
            if admin::remove_target(&store, &title).await? {
                println!("Removed {}", title);
            }
        }
    }
    Ok(())
}

async fn show_prices(config: &AppConfig) -> Result<(), handler::HandlerError> {
    let store = SqliteStore::connect(&config.database_url).await?;
    for line in admin::describe_prices(&store).await? {
        println!("{}", line);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let command = args.command.unwrap_or(Command::Run);
    if matches!(command, Command::Run) {
        // fail before touching the database or network
        if let Err(e) = config.require_telegram() {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
        info!(
            database = config.database_url.as_str(),
            trend_baseline = %config.monitor.trend_baseline,
            "Price Watch starting"
        );
    }

    let result = match command {
        Command::Run => run(&config).await,
        Command::Targets { action } => manage_targets(&config, action).await,
        Command::Prices => show_prices(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
