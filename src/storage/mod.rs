pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteRepository;
pub use traits::KnowledgeRepository;

use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to the knowledge repository, serialized behind one lock.
pub type SharedRepository = Arc<Mutex<dyn KnowledgeRepository>>;
