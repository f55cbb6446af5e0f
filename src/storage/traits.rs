use crate::model::{Gap, MarketSnapshot, NicheStats, StorageError};

/// Storage seam for historical market knowledge.
pub trait KnowledgeRepository: Send {
    fn save_snapshot(&self, snapshot: &MarketSnapshot) -> Result<(), StorageError>;

    /// Snapshots previously stored for the niche, oldest first, bounded to
    /// the most recent history window.
    fn get_historical_data(&self, niche: &str) -> Result<Vec<MarketSnapshot>, StorageError>;

    fn get_stats(&self, niche: &str) -> Result<Option<NicheStats>, StorageError>;

    fn update_stats(&self, stats: &NicheStats) -> Result<(), StorageError>;

    fn save_gaps(&self, gaps: &[Gap]) -> Result<(), StorageError>;

    /// Highest-scoring gaps across all niches, score descending.
    fn get_top_gaps(&self, limit: usize) -> Result<Vec<Gap>, StorageError>;
}
