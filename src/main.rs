//! Honeypot bad-bots classifier.
//!
//! Processes one honeypot gateway event per invocation: classifies the
//! source, scores it, merges confirmed bots into the block list and prints
//! the outcome as JSON.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bad_bots::blocklist::BlockListMerger;
use bad_bots::geolocation::{CachingResolver, GeolocationResolver, HttpGeolocationResolver};
use bad_bots::pipeline::PipelineOutcome;
use bad_bots::score::ConfidenceScorer;
use bad_bots::signature::CrawlerSignatures;
use bad_bots::store::InMemoryBlockListStore;
use bad_bots::{BadBotPipeline, BadBotsConfig, HoneypotEvent, RequestFingerprint};

#[derive(Parser, Debug)]
#[command(name = "bad-bots")]
#[command(author, version, about = "Honeypot-triggered bot classifier and block-list maintainer")]
struct Args {
    /// Path to configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the gateway event to process, "-" for stdin
    #[arg(short, long, default_value = "-")]
    event: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(json: bool, level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<BadBotsConfig> {
    let Some(path) = path else {
        return Ok(BadBotsConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
        serde_yaml::from_str(&content).context("parsing YAML config")
    } else {
        serde_json::from_str(&content).context("parsing JSON config")
    }
}

fn read_event(source: &str) -> Result<HoneypotEvent> {
    let content = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading event from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading event {source}"))?
    };
    serde_json::from_str(&content).context("parsing gateway event")
}

/// Results summary, one invocation per process.
fn print_diagnostics(outcome: &PipelineOutcome) {
    info!("================================ Bad bots results ================================");
    info!(
        source_address = %outcome.source_address,
        source_address_type = %outcome.version,
        score = outcome.score,
        is_bot = outcome.is_bot,
        "classification complete"
    );
    if outcome.is_bot {
        info!(network = %outcome.network, "source network blocked");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, &args.log_level);

    let config = load_config(args.config.as_ref())?;
    let event = read_event(&args.event)?;
    let fingerprint = RequestFingerprint::from_event(&event);

    let signatures =
        Arc::new(CrawlerSignatures::with_patterns(&config.signatures.custom_patterns)?);
    let scorer = ConfidenceScorer::new(&config.scoring, signatures);

    let http_resolver = Arc::new(HttpGeolocationResolver::new(&config.geolocation)?);
    let resolver: Arc<dyn GeolocationResolver> =
        Arc::new(CachingResolver::new(http_resolver, &config.geolocation));

    // The networked store belongs to the deployment; a fresh process-local
    // list is used when none is wired in.
    let store = Arc::new(InMemoryBlockListStore::new());
    let merger = BlockListMerger::new(store, config.block_list.clone());

    let pipeline = BadBotPipeline::new(scorer, resolver, merger);
    let outcome = pipeline.process(&fingerprint).await?;

    print_diagnostics(&outcome);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
