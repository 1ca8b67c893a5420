//! PI Scout Discovery
//!
//! Batch entry point: loads configuration, opens the graph store and runs
//! one discovery pass over the configured seeds.

use anyhow::Context;
use piscout_common::config::{AppConfig, ObservabilityConfig};
use piscout_common::{metrics, AcademicGateway, GraphStore, VERSION};
use piscout_discovery::{DiscoveryPipeline, InstitutionRankings};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let loaded = AppConfig::load();
    let observability = loaded
        .as_ref()
        .map(|c| c.observability.clone())
        .unwrap_or_default();
    init_tracing(&observability);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        error!(error = %e, code = e.code().as_code(), "Invalid configuration");
        std::process::exit(1);
    }

    info!(
        service = %config.observability.service_name,
        version = VERSION,
        seeds = config.discovery.seeds.len(),
        max_hops = config.discovery.max_hops,
        "Starting PI discovery"
    );

    metrics::register_metrics();

    info!("Opening graph store...");
    let store = GraphStore::open(&config.database)
        .await
        .context("failed to open graph store")?;
    let gateway = AcademicGateway::from_config(&config.sources.semantic_scholar)
        .context("failed to build academic gateway")?;
    let rankings = InstitutionRankings::load_optional(config.discovery.rankings_path.as_deref())
        .context("failed to load institution rankings")?;
    if rankings.is_empty() {
        warn!("No institution rankings loaded, every institute scores as unranked");
    }

    let pipeline = DiscoveryPipeline::new(&config, &store, &gateway, &rankings);
    let summary = tokio::select! {
        result = pipeline.run() => match result {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, fatal = e.is_fatal(), "Discovery run failed");
                std::process::exit(1);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping discovery; merged results so far are kept");
            return Ok(());
        }
    };

    for candidate in &summary.top {
        info!(
            pi_id = candidate.pi_id,
            name = %candidate.name,
            score = candidate.composite,
            "Top candidate"
        );
    }
    info!(
        summary = %serde_json::to_string(&summary)?,
        "Discovery finished"
    );
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}
