use crate::model::MarketEntry;
use std::collections::HashMap;

/// Half-open price segment `[low, high)`, the unit of gap detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceBand(pub u32, pub u32);

pub struct MarketIndicators;

impl MarketIndicators {
    pub const DEFAULT_STEP: u32 = 50;

    pub fn price_band(price: f64) -> PriceBand {
        Self::price_band_with_step(price, Self::DEFAULT_STEP)
    }

    pub fn price_band_with_step(price: f64, step: u32) -> PriceBand {
        let price_int = price.round() as u32;
        let lower = price_int / step * step;
        PriceBand(lower, lower + step)
    }

    /// Number of entries per price band.
    pub fn supply_histogram(entries: &[MarketEntry]) -> HashMap<PriceBand, u32> {
        let mut map: HashMap<PriceBand, u32> = HashMap::new();
        for entry in entries {
            *map.entry(Self::price_band(entry.price)).or_default() += 1;
        }
        map
    }

    /// Mean supply per band across a series of historical histograms.
    pub fn mean_supply(histograms: &[HashMap<PriceBand, u32>]) -> HashMap<PriceBand, f64> {
        if histograms.is_empty() {
            return HashMap::new();
        }

        let mut totals: HashMap<PriceBand, u32> = HashMap::new();
        for histogram in histograms {
            for (band, count) in histogram {
                *totals.entry(*band).or_default() += count;
            }
        }

        let n = histograms.len() as f64;
        totals
            .into_iter()
            .map(|(band, total)| (band, total as f64 / n))
            .collect()
    }

    /// Mean price per band over a set of entries.
    pub fn price_means(entries: &[MarketEntry]) -> HashMap<PriceBand, f64> {
        let mut map: HashMap<PriceBand, Vec<f64>> = HashMap::new();
        for entry in entries {
            map.entry(Self::price_band(entry.price))
                .or_default()
                .push(entry.price);
        }

        map.into_iter()
            .map(|(band, prices)| {
                let mean = prices.iter().sum::<f64>() / prices.len() as f64;
                (band, mean)
            })
            .collect()
    }

    /// Price volatility (standard deviation) per band.
    pub fn price_volatility(entries: &[MarketEntry]) -> HashMap<PriceBand, f64> {
        let mut map: HashMap<PriceBand, Vec<f64>> = HashMap::new();
        for entry in entries {
            map.entry(Self::price_band(entry.price))
                .or_default()
                .push(entry.price);
        }

        map.into_iter()
            .map(|(band, prices)| {
                let count = prices.len() as f64;
                let mean = prices.iter().sum::<f64>() / count;
                let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / count;
                (band, variance.sqrt())
            })
            .collect()
    }

    /// RSI (Relative Strength Index) over a chronological price series.
    /// Short or flat series read as neutral (50).
    pub fn compute_rsi(avg_prices: &[f64]) -> f64 {
        if avg_prices.len() < 2 {
            return 50.0;
        }

        let mut gains = 0.0;
        let mut losses = 0.0;

        for w in avg_prices.windows(2) {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                gains += delta;
            } else {
                losses -= delta;
            }
        }

        if gains + losses == 0.0 {
            return 50.0;
        }

        let rs = gains / losses.max(1e-6);
        100.0 - (100.0 / (1.0 + rs))
    }
}
