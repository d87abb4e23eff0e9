//! Gold news crawler main entry point
//!
//! This is the command-line interface for the gold news crawler.

use anyhow::Context;
use clap::Parser;
use gold_news_crawler::config::{load_config_with_hash, validate, Config};
use gold_news_crawler::output::{latest_json_file, print_statistics, read_json, DatasetStatistics};
use gold_news_crawler::{Coordinator, RunOptions, SaveFormat};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Gold news crawler: listing + detail scraper for gold-market news
///
/// Fetches the news listing, optionally enriches the first articles with
/// their full text, and saves the records as JSON and/or CSV for the
/// sentiment analyzer.
#[derive(Parser, Debug)]
#[command(name = "gold-news-crawler")]
#[command(version)]
#[command(about = "Crawls gold-market news into JSON/CSV", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch article detail pages
    #[arg(long)]
    details: bool,

    /// Maximum number of detail pages to fetch
    #[arg(long, value_name = "N")]
    max_details: Option<usize>,

    /// Output format
    #[arg(long, value_enum, value_name = "FORMAT")]
    format: Option<SaveFormat>,

    /// Directory for the data files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of listing pages to walk
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Stop once this many unique articles are collected
    #[arg(long, value_name = "N")]
    target_count: Option<usize>,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "inspect")]
    dry_run: bool,

    /// Show statistics for a saved JSON file (default: the newest one) and exit
    #[arg(long, value_name = "FILE", num_args = 0..=1, conflicts_with = "dry_run")]
    inspect: Option<Option<PathBuf>>,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if self.details {
            config.crawl.get_details = true;
        }
        if let Some(max_details) = self.max_details {
            config.crawl.max_details = max_details;
        }
        if let Some(format) = self.format {
            config.output.save_format = format;
        }
        if let Some(dir) = &self.output_dir {
            config.output.data_dir = dir.to_string_lossy().into_owned();
        }
        if let Some(pages) = self.pages {
            config.crawl.max_pages = pages;
        }
        if let Some(target) = self.target_count {
            config.crawl.target_count = Some(target);
        }
        if let Some(log_file) = &self.log_file {
            config.output.log_file = Some(log_file.to_string_lossy().into_owned());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    setup_logging(cli.verbose, cli.quiet, config.output.log_file.as_deref())?;
    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => {
            tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash)
        }
        _ => tracing::info!("Using built-in configuration"),
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(file) = &cli.inspect {
        handle_inspect(&config, file.as_deref())?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With a log file, the same events are appended to it without colors.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gold_news_crawler=info,warn"),
            1 => EnvFilter::new("gold_news_crawler=debug,info"),
            2 => EnvFilter::new("gold_news_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Gold News Crawler Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Link selector: {}", config.source.link_selector);

    println!("\nTransport:");
    println!("  Timeout: {}s", config.transport.timeout_secs);
    println!("  Max attempts: {}", config.transport.max_attempts);
    println!(
        "  Backoff: {}ms base, {}ms cap, {}ms jitter",
        config.transport.backoff_base_ms, config.transport.backoff_max_ms, config.transport.jitter_ms
    );

    println!("\nCrawl:");
    println!("  Fetch details: {}", config.crawl.get_details);
    if config.crawl.get_details {
        println!(
            "  Max details: {} ({}ms apart)",
            config.crawl.max_details, config.crawl.detail_delay_ms
        );
    }
    if let Some(target) = config.crawl.target_count {
        println!("  Target count: {}", target);
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.data_dir);
    println!("  Format: {}", config.output.save_format);
    if let Some(log_file) = &config.output.log_file {
        println!("  Log file: {}", log_file);
    }

    println!("\nListing Pages ({}):", config.crawl.max_pages);
    for page in 1..=config.crawl.max_pages {
        println!("  - {}", config.source.listing_page_url(page));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --inspect mode: shows statistics for a saved JSON file
fn handle_inspect(config: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let path = match file {
        Some(path) => path.to_path_buf(),
        None => latest_json_file(Path::new(&config.output.data_dir))?,
    };

    let records =
        read_json(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    print_statistics(&DatasetStatistics::from_records(&records), &path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let options = RunOptions::from_config(&config);
    let coordinator = Coordinator::new(config)?;
    tracing::info!(
        "Starting crawl at {}: {} page(s), details {}, format {}",
        coordinator.config().source.listing_page_url(1),
        options.max_pages,
        if options.get_details { "on" } else { "off" },
        options.save_format
    );

    match coordinator.run(&options).await {
        Ok(report) => {
            let ready = report.result.sentiment_inputs().len();
            tracing::info!(
                "Crawl completed: {} records, {} ready for sentiment analysis",
                report.result.len(),
                ready
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
