use crate::analyzer::market_indicators::PriceBand;
use crate::model::{Gap, MarketEntry, MarketSnapshot, NicheStats, StorageError};
use crate::storage::traits::KnowledgeRepository;
use crate::utils::parse_datetime;
use chrono::DateTime;
use rusqlite::{params, Connection, Row};

/// How many past snapshots per niche feed the analysis baseline.
const HISTORY_LIMIT: usize = 30;

pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens the database, creating and migrating the schema as needed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                niche TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshot_entries (
                snapshot_id INTEGER NOT NULL,
                entry_id TEXT NOT NULL,
                name TEXT NOT NULL,
                vendor TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT '',
                price REAL NOT NULL,
                listed_at TEXT NOT NULL,
                niche TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS niche_stats (
                niche TEXT PRIMARY KEY,
                avg_price REAL NOT NULL,
                std_dev REAL NOT NULL,
                entry_count INTEGER NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS gaps (
                id TEXT PRIMARY KEY,
                niche TEXT NOT NULL,
                band_low INTEGER NOT NULL,
                band_high INTEGER NOT NULL,
                score REAL NOT NULL,
                current_supply INTEGER NOT NULL,
                historical_supply REAL NOT NULL,
                avg_price REAL NOT NULL DEFAULT 0,
                detected_at TEXT NOT NULL
            );
            ",
        )?;

        // Additive migrations: columns that arrived after the first schema
        Self::migrate_add_column_if_missing(&conn, "snapshot_entries", "vendor", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "snapshot_entries", "category", "TEXT NOT NULL DEFAULT ''")?;
        Self::migrate_add_column_if_missing(&conn, "gaps", "avg_price", "REAL NOT NULL DEFAULT 0")?;

        Ok(Self { conn })
    }

    /// Checks for a column and adds it to the table when absent.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    fn load_entries(&self, snapshot_id: i64) -> Result<Vec<MarketEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, name, vendor, category, price, listed_at, niche
             FROM snapshot_entries WHERE snapshot_id = ?1",
        )?;

        let rows = stmt.query_map(params![snapshot_id], Self::map_entry)?;
        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }

        Ok(entries)
    }

    fn map_entry(row: &Row) -> Result<MarketEntry, rusqlite::Error> {
        let listed_at_str: String = row.get(5)?;
        let listed_at = parse_datetime(&listed_at_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("invalid datetime: {}", listed_at_str).into(),
            )
        })?;

        Ok(MarketEntry {
            id: row.get(0)?,
            name: row.get(1)?,
            vendor: row.get(2)?,
            category: row.get(3)?,
            price: row.get(4)?,
            listed_at,
            niche: row.get(6)?,
        })
    }

    fn map_gap(row: &Row) -> Result<Gap, rusqlite::Error> {
        let detected_at_str: String = row.get(8)?;
        let detected_at = parse_datetime(&detected_at_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                rusqlite::types::Type::Text,
                format!("invalid datetime: {}", detected_at_str).into(),
            )
        })?;

        Ok(Gap {
            id: row.get(0)?,
            niche: row.get(1)?,
            band: PriceBand(row.get(2)?, row.get(3)?),
            score: row.get(4)?,
            current_supply: row.get(5)?,
            historical_supply: row.get(6)?,
            avg_price: row.get(7)?,
            detected_at,
        })
    }
}

impl KnowledgeRepository for SqliteRepository {
    /// Appends a snapshot and its entries to the history.
    fn save_snapshot(&self, snapshot: &MarketSnapshot) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO snapshots (niche, fetched_at) VALUES (?1, ?2)",
            params![&snapshot.niche, &snapshot.fetched_at.to_rfc3339()],
        )?;
        let snapshot_id = self.conn.last_insert_rowid();

        let mut stmt = self.conn.prepare(
            "INSERT INTO snapshot_entries (
                snapshot_id, entry_id, name, vendor, category,
                price, listed_at, niche
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for entry in &snapshot.entries {
            stmt.execute(params![
                snapshot_id,
                &entry.id,
                &entry.name,
                &entry.vendor,
                &entry.category,
                &entry.price,
                &entry.listed_at.to_rfc3339(),
                &entry.niche,
            ])?;
        }

        Ok(())
    }

    fn get_historical_data(&self, niche: &str) -> Result<Vec<MarketSnapshot>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fetched_at FROM snapshots WHERE niche = ?1
             ORDER BY fetched_at DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![niche, HISTORY_LIMIT as i64], |row| {
            let id: i64 = row.get(0)?;
            let fetched_at: String = row.get(1)?;
            Ok((id, fetched_at))
        })?;

        let mut heads = Vec::new();
        for row in rows {
            heads.push(row?);
        }

        let mut snapshots = Vec::new();
        for (id, fetched_at_str) in heads {
            let fetched_at: DateTime<chrono::Utc> = fetched_at_str.parse()?;
            let entries = self.load_entries(id)?;
            snapshots.push(MarketSnapshot {
                niche: niche.to_string(),
                entries,
                fetched_at,
            });
        }

        // Oldest first for trend calculations
        snapshots.reverse();
        Ok(snapshots)
    }

    fn get_stats(&self, niche: &str) -> Result<Option<NicheStats>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT avg_price, std_dev, entry_count, last_updated
             FROM niche_stats WHERE niche = ?1",
        )?;

        let mut rows = stmt.query(params![niche])?;
        if let Some(row) = rows.next()? {
            let avg_price: f64 = row.get(0)?;
            let std_dev: f64 = row.get(1)?;
            let entry_count: u32 = row.get(2)?;
            let last_updated_str: String = row.get(3)?;
            let last_updated = last_updated_str.parse()?;

            Ok(Some(NicheStats {
                niche: niche.to_string(),
                avg_price,
                std_dev,
                entry_count,
                last_updated,
            }))
        } else {
            Ok(None)
        }
    }

    fn update_stats(&self, stats: &NicheStats) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO niche_stats (niche, avg_price, std_dev, entry_count, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &stats.niche,
                &stats.avg_price,
                &stats.std_dev,
                &stats.entry_count,
                &stats.last_updated.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Upserts gaps by id, so a re-detected gap keeps a single row.
    fn save_gaps(&self, gaps: &[Gap]) -> Result<(), StorageError> {
        let mut stmt = self.conn.prepare(
            "INSERT OR REPLACE INTO gaps (
                id, niche, band_low, band_high, score,
                current_supply, historical_supply, avg_price, detected_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for gap in gaps {
            stmt.execute(params![
                &gap.id,
                &gap.niche,
                gap.band.0,
                gap.band.1,
                gap.score,
                gap.current_supply,
                gap.historical_supply,
                gap.avg_price,
                &gap.detected_at.to_rfc3339(),
            ])?;
        }
        Ok(())
    }

    fn get_top_gaps(&self, limit: usize) -> Result<Vec<Gap>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, niche, band_low, band_high, score,
                    current_supply, historical_supply, avg_price, detected_at
             FROM gaps WHERE score > 0 ORDER BY score DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], Self::map_gap)?;
        let mut gaps = Vec::new();
        for gap in rows {
            gaps.push(gap?);
        }

        Ok(gaps)
    }
}
