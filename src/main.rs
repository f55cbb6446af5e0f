mod analyzer;
mod config;
mod connector;
mod integrator;
mod model;
mod normalizer;
mod storage;
mod utils;

use analyzer::MarketAnalyzer;
use config::{load_config, AppConfig, NicheConfig};
use connector::HttpConnector;
use futures::future::join_all;
use integrator::ConnectorRegistry;
use std::sync::Arc;
use storage::{SharedRepository, SqliteRepository};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_subscriber;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    // Initialize storage (SQLite) with async access (wrapped in a Mutex)
    let repository: SharedRepository = match SqliteRepository::new("data.db") {
        Ok(r) => Arc::new(Mutex::new(r)),
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    // Register one HTTP connector per configured service and connect them all
    let mut registry = ConnectorRegistry::new();
    for service in &config.integration.services {
        registry.register(&service.name, Arc::new(HttpConnector::new()));
    }

    if let Err(e) = registry.connect_all(&config.integration).await {
        error!("API integration failed, shutting down: {}", e);
        return;
    }

    let Some(connector) = registry.get(&config.data_service) else {
        error!(
            "Data service connector {} is not registered",
            config.data_service
        );
        return;
    };

    let analyzer = Arc::new(MarketAnalyzer::new(
        connector,
        repository.clone(),
        config.clone(),
    ));

    info!("🚀 GapScout started!");

    // Main processing loop
    loop {
        info!("Entering analysis loop...");
        info!("Niches to process: {}", config.niches.len());

        // Process all niches concurrently
        let tasks: Vec<_> = config
            .niches
            .iter()
            .map(|niche_cfg| process_niche(niche_cfg, analyzer.clone(), repository.clone()))
            .collect();
        join_all(tasks).await;

        // Summarize the strongest opportunities across all niches
        match analyzer.get_top_gaps(5).await {
            Ok(gaps) => {
                info!("Current top gaps: {}", gaps.len());
                for gap in gaps {
                    info!(
                        "Gap {} | band {}-{} USD | score {:.2} | supply {} (was {:.1})",
                        gap.id,
                        gap.band.0,
                        gap.band.1,
                        gap.score,
                        gap.current_supply,
                        gap.historical_supply
                    );
                }
            }
            Err(e) => warn!("Top gaps query failed: {:?}", e),
        }

        info!("Waiting for timer ({}s)...", config.check_interval_seconds);
        sleep(Duration::from_secs(config.check_interval_seconds)).await;
        info!("Restarting analysis loop...");
    }
}

/// Runs one analysis cycle for a niche and logs the outcome. Failures are
/// logged and skipped; the service keeps running.
async fn process_niche(
    niche_cfg: &NicheConfig,
    analyzer: Arc<MarketAnalyzer>,
    repository: SharedRepository,
) {
    info!("Processing niche: {}", niche_cfg.niche);

    // Optionally, retrieve previous stats from storage for logging
    {
        let repository_guard = repository.lock().await;
        if let Ok(Some(prev_stats)) = repository_guard.get_stats(&niche_cfg.niche) {
            info!(
                "Previous stats: {:.2} USD | Updated: {}",
                prev_stats.avg_price, prev_stats.last_updated
            );
        }
    }

    let report = match analyzer.analyze_market(&niche_cfg.niche).await {
        Ok(report) => report,
        Err(e) => {
            warn!("Analysis error for {}: {:?}", niche_cfg.niche, e);
            return;
        }
    };

    info!(
        "Report for {} generated at {}",
        report.niche, report.generated_at
    );
    info!(
        "Base stats: avg = {:.2}, std_dev = {:.2}, entries = {}",
        report.stats.avg_price, report.stats.std_dev, report.stats.entry_count
    );
    info!("RSI: {}", report.rsi);
    info!("Found {} gaps for {}", report.gaps.len(), report.niche);
    for gap in &report.gaps {
        info!(
            "Gap candidate {} | score {:.2} | target price ~{:.0} USD",
            gap.id, gap.score, gap.avg_price
        );
    }

    info!("Finished processing niche: {}", niche_cfg.niche);
}
