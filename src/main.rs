use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use union_scraper::AppConfig;
use union_scraper::config::LoggingConfig;
use union_scraper::core::input_loader::load_input_files;
use union_scraper::core::{ChromeFetcher, PipelineOrchestrator, merge, write_merged};

#[derive(Parser)]
#[command(name = "union-scraper", version, about = "Scrape product pages and merge them into per-site JSON")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every product listed in the configured input files
    Run {
        /// Extra configuration file layered over config/default
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Parse saved HTML snapshots instead of fetching pages
        #[arg(long)]
        local_html: bool,
        /// Do not download product images
        #[arg(long)]
        skip_images: bool,
        /// Merge all product JSON after the run
        #[arg(long)]
        merge: bool,
    },
    /// Merge all product JSON under the output directory
    Merge {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write merge_{timestamp}.json instead of merge.json
        #[arg(long)]
        timestamp: bool,
    },
}

/// Console plus `log.txt`, rewritten on every start.
fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("Failed to create log directory {}", config.directory.display()))?;
    let log_path = config.directory.join(&config.file_name);
    let file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_target(false).with_ansi(false))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            local_html,
            skip_images,
            merge,
        } => {
            let mut app_config = AppConfig::load(config.as_deref()).context("Failed to load configuration")?;
            app_config.debug.use_local_html |= local_html;
            app_config.debug.skip_image_download |= skip_images;
            app_config.crawler.enable_merge_json |= merge;

            let _guard = init_logging(&app_config.logging)?;
            info!("Starting union-scraper...");

            let records = load_input_files(&app_config.input).map_err(|e| {
                error!("Fatal error: {}", e);
                e
            })?;

            // Local mode replays snapshots through the adapters; the browser is never launched.
            let fetcher = Arc::new(ChromeFetcher::new(app_config.fetcher.clone()));

            let pipeline = PipelineOrchestrator::new(Arc::new(app_config), fetcher)?;
            let summary = pipeline.run(&records).await;
            info!("Processed {} products ({} parsed, {} empty, {} failed)", summary.total, summary.parsed, summary.empty, summary.failed);
        }
        Command::Merge { config, timestamp } => {
            let app_config = AppConfig::load(config.as_deref()).context("Failed to load configuration")?;
            let _guard = init_logging(&app_config.logging)?;

            let output_dir = &app_config.output.data_dir;
            let doc = merge(output_dir, &app_config.sites)?;
            write_merged(output_dir, &doc, timestamp)?;
            info!("Merge finished");
        }
    }

    Ok(())
}
