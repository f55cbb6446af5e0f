// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod gap_analysis;
pub mod market_indicators;

// Re-export the main analyzer implementation for ease of use.
pub use gap_analysis::MarketAnalyzer;
