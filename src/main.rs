use clap::Parser;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use vehicle_listing_digest::classify::{DEFAULT_NEWEST_YEAR, DEFAULT_OLDEST_YEAR};
use vehicle_listing_digest::riyasewana::RiyasewanaSource;
use vehicle_listing_digest::{DigestConfig, YearTable, DEFAULT_PAGES};

/// Groups riyasewana.com car listings under a price ceiling by model year and listing age.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Highest price (in rupees) to keep
    #[arg(long, env = "MAX_PRICE")]
    max_price: u64,

    /// Search term, e.g. `toyota`
    #[arg(long, env = "CAR")]
    car: String,

    /// Number of result pages to read
    #[arg(
        long,
        env = "PAGES",
        default_value_t = DEFAULT_PAGES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pages: u32,

    /// Directory the snapshot is written to
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_OLDEST_YEAR)]
    oldest_year: u16,

    #[arg(long, default_value_t = DEFAULT_NEWEST_YEAR)]
    newest_year: u16,

    /// Pause between page requests
    #[arg(long, default_value_t = 500)]
    page_delay_ms: u64,
}

/// Older invocations used these names, e.g. `maxPrice=600000 car=toyota pages=5`.
const LEGACY_ENV: [(&str, &str); 3] = [
    ("maxPrice", "MAX_PRICE"),
    ("car", "CAR"),
    ("pages", "PAGES"),
];

/// Variables to set so a legacy name fills in for an unset current one.
fn legacy_env_fallbacks<F>(lookup: F) -> Vec<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    LEGACY_ENV
        .iter()
        .filter(|(_, current)| lookup(*current).is_none())
        .filter_map(|(legacy, current)| lookup(*legacy).map(|value| (*current, value)))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    for (name, value) in legacy_env_fallbacks(|name| std::env::var(name).ok()) {
        debug!("Using legacy environment value for {}", name);
        std::env::set_var(name, value);
    }
    let args = Args::parse();

    let config = DigestConfig {
        query: args.car,
        max_price: args.max_price,
        pages: args.pages,
        years: YearTable::new(args.oldest_year, args.newest_year)?,
        output_dir: args.output_dir,
    };
    info!(
        "Searching '{}' up to Rs. {} across {} pages",
        config.query, config.max_price, config.pages
    );

    let source =
        RiyasewanaSource::new(&config.query, Duration::from_millis(args.page_delay_ms))?;
    let path = vehicle_listing_digest::run(&source, &config).await?;

    info!("Done: {}", path.display());
    Ok(())
}
