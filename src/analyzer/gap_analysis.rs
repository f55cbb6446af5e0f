use crate::analyzer::market_indicators::MarketIndicators;
use crate::config::{AppConfig, NicheConfig};
use crate::connector::Connector;
use crate::model::{AnalysisError, Gap, GapReport, MarketEntry, MarketSnapshot, NicheStats};
use crate::normalizer::normalize_all;
use crate::storage::SharedRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Minimum mean historical supply a band needs before its decline counts.
const MIN_BAND_SUPPLY: f64 = 3.0;
/// Bands whose current price volatility exceeds this are too unstable to call.
const VOLATILITY_THRESHOLD: f64 = 20.0;

/// Orchestrates one analysis pass per niche: live fetch, historical fetch,
/// gap detection, persistence.
pub struct MarketAnalyzer {
    connector: Arc<dyn Connector>,
    repository: SharedRepository,
    config: Arc<AppConfig>,
}

impl MarketAnalyzer {
    pub fn new(
        connector: Arc<dyn Connector>,
        repository: SharedRepository,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            connector,
            repository,
            config,
        }
    }

    /// Analyzes the current market for a niche against stored history and
    /// persists the resulting snapshot, stats and gaps.
    pub async fn analyze_market(&self, niche: &str) -> Result<GapReport, AnalysisError> {
        info!("Starting market analysis for niche: {}", niche);

        match self.run_analysis(niche).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.log_error(&format!("Market analysis failed for niche {}: {}", niche, e));
                Err(e)
            }
        }
    }

    async fn run_analysis(&self, niche: &str) -> Result<GapReport, AnalysisError> {
        let mut snapshot = self.connector.get_market_data(niche).await?;

        let historical = {
            let repository = self.repository.lock().await;
            repository.get_historical_data(niche)?
        };

        normalize_all(&mut snapshot.entries, &self.config.niches);

        let report = self.process_gap_analysis(niche, &snapshot, &historical);

        {
            let repository = self.repository.lock().await;
            repository.save_snapshot(&snapshot)?;
            repository.update_stats(&report.stats)?;
            repository.save_gaps(&report.gaps)?;
        }

        Ok(report)
    }

    /// Merges the live snapshot with stored history into a gap report.
    ///
    /// A band becomes a gap when its historical supply was real but its
    /// current supply collapsed while the niche price trend held up.
    fn process_gap_analysis(
        &self,
        niche: &str,
        current: &MarketSnapshot,
        historical: &[MarketSnapshot],
    ) -> GapReport {
        let niche_cfg = self.config.niches.iter().find(|n| n.niche == niche);

        let entries = filter_entries(&current.entries, niche, niche_cfg);
        let stats = calculate_stats(niche, &entries);

        let historical_entries: Vec<Vec<MarketEntry>> = historical
            .iter()
            .map(|s| filter_entries(&s.entries, niche, niche_cfg))
            .collect();

        // Demand momentum over the mean-price series, history first. Snapshots
        // with no entries for the niche carry no price signal.
        let mut price_series: Vec<f64> = historical_entries
            .iter()
            .map(|entries| mean_price(entries))
            .filter(|&p| p > 0.0)
            .collect();
        if stats.avg_price > 0.0 {
            price_series.push(stats.avg_price);
        }
        let rsi = MarketIndicators::compute_rsi(&price_series);

        let mut gaps = Vec::new();

        // No supply baseline without at least two past snapshots.
        if historical_entries.len() >= 2 {
            let current_supply = MarketIndicators::supply_histogram(&entries);
            let volatility = MarketIndicators::price_volatility(&entries);
            let histograms: Vec<_> = historical_entries
                .iter()
                .map(|entries| MarketIndicators::supply_histogram(entries))
                .collect();
            let historical_supply = MarketIndicators::mean_supply(&histograms);

            let flat_history: Vec<MarketEntry> =
                historical_entries.iter().flatten().cloned().collect();
            let historical_prices = MarketIndicators::price_means(&flat_history);

            let supply_drop_ratio = niche_cfg.map(|c| c.supply_drop_ratio).unwrap_or(0.5);
            let min_gap_score = niche_cfg.map(|c| c.min_gap_score).unwrap_or(0.0);

            for (band, hist) in &historical_supply {
                if *hist < MIN_BAND_SUPPLY {
                    continue;
                }
                let cur = current_supply.get(band).copied().unwrap_or(0);
                if (cur as f64) >= hist * supply_drop_ratio {
                    continue;
                }
                // Unstable segments produce false vacancies
                if let Some(&vol) = volatility.get(band) {
                    if vol > VOLATILITY_THRESHOLD {
                        continue;
                    }
                }

                let scarcity = (hist - cur as f64) / hist;
                let momentum = rsi / 100.0;
                let score = round2(scarcity * momentum * 100.0);
                if score < min_gap_score {
                    continue;
                }

                gaps.push(Gap {
                    id: format!("{}:{}-{}", niche, band.0, band.1),
                    niche: niche.to_string(),
                    band: *band,
                    score,
                    current_supply: cur,
                    historical_supply: round2(*hist),
                    avg_price: historical_prices.get(band).copied().unwrap_or(0.0),
                    detected_at: Utc::now(),
                });
            }

            gaps.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        }

        GapReport {
            niche: niche.to_string(),
            stats,
            rsi,
            gaps,
            generated_at: Utc::now(),
        }
    }

    /// Highest-scoring persisted gaps across all niches.
    pub async fn get_top_gaps(&self, limit: usize) -> Result<Vec<Gap>, AnalysisError> {
        let repository = self.repository.lock().await;
        Ok(repository.get_top_gaps(limit)?)
    }

    /// Error-severity passthrough for failures surfaced by callers.
    pub fn log_error(&self, message: &str) {
        error!("{}", message);
    }
}

fn filter_entries(
    entries: &[MarketEntry],
    niche: &str,
    niche_cfg: Option<&NicheConfig>,
) -> Vec<MarketEntry> {
    entries
        .iter()
        .filter(|e| e.niche == niche && e.price > 0.0)
        .filter(|e| match niche_cfg {
            Some(cfg) => e.price >= cfg.min_price && e.price <= cfg.max_price,
            None => true,
        })
        .cloned()
        .collect()
}

/// Mean price and population standard deviation over the niche entries.
fn calculate_stats(niche: &str, entries: &[MarketEntry]) -> NicheStats {
    let prices: Vec<f64> = entries
        .iter()
        .map(|e| e.price)
        .filter(|&p| p > 0.0)
        .collect();

    if prices.is_empty() {
        return NicheStats {
            niche: niche.to_string(),
            avg_price: 0.0,
            std_dev: 0.0,
            entry_count: 0,
            last_updated: Utc::now(),
        };
    }

    let count = prices.len() as f64;
    let avg = prices.iter().sum::<f64>() / count;
    let stddev = (prices.iter().map(|p| (p - avg).powi(2)).sum::<f64>() / count).sqrt();

    NicheStats {
        niche: niche.to_string(),
        avg_price: avg,
        std_dev: stddev,
        entry_count: prices.len() as u32,
        last_updated: Utc::now(),
    }
}

fn mean_price(entries: &[MarketEntry]) -> f64 {
    let prices: Vec<f64> = entries
        .iter()
        .map(|e| e.price)
        .filter(|&p| p > 0.0)
        .collect();
    if prices.is_empty() {
        return 0.0;
    }
    prices.iter().sum::<f64>() / prices.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
