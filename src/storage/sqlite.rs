//! SQLite storage backend
//!
//! One database holds the UTXO table and the color-value cache. All
//! statements run on tokio-rusqlite's connection thread, so they are
//! serialized with respect to each other.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, types::Type, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::{
    color_data::ColorDataStore,
    data_structures::{
        color_state::{ColorState, ColorValue},
        types::{ColorId, TxHash},
        utxo::Utxo,
    },
    errors::{ColorWalletError, ColorWalletResult},
    storage::{SqlitePerformanceConfig, UtxoStore},
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS utxo_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address TEXT NOT NULL,
        txhash TEXT NOT NULL,
        outindex INTEGER NOT NULL,
        value INTEGER NOT NULL,
        script TEXT NOT NULL,
        scantime INTEGER NOT NULL,
        commitment INTEGER NOT NULL DEFAULT 0
    );

    CREATE UNIQUE INDEX IF NOT EXISTS utxo_data_outpoint ON utxo_data (txhash, outindex);
    CREATE INDEX IF NOT EXISTS utxo_data_address ON utxo_data (address);
    CREATE INDEX IF NOT EXISTS utxo_data_scantime ON utxo_data (scantime);
    CREATE INDEX IF NOT EXISTS utxo_data_commitment ON utxo_data (commitment);

    -- Only colored outputs are stored; color_scans tells a miss from "not colored"
    CREATE TABLE IF NOT EXISTS color_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        color_id INTEGER NOT NULL,
        txhash TEXT NOT NULL,
        outindex INTEGER NOT NULL,
        value INTEGER NOT NULL,
        label TEXT NOT NULL DEFAULT ''
    );

    CREATE UNIQUE INDEX IF NOT EXISTS color_data_cto ON color_data (color_id, txhash, outindex);
    CREATE INDEX IF NOT EXISTS color_data_outpoint ON color_data (txhash, outindex);

    CREATE TABLE IF NOT EXISTS color_scans (
        color_id INTEGER NOT NULL,
        txhash TEXT NOT NULL,
        PRIMARY KEY (color_id, txhash)
    );
"#;

const UTXO_COLUMNS: &str = "id, address, txhash, outindex, value, script, scantime, commitment";

/// SQLite storage for UTXOs and cached colorvalues
pub struct SqliteStorage {
    connection: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database at `database_path`
    pub async fn new<P: AsRef<Path>>(database_path: P) -> ColorWalletResult<Self> {
        Self::new_with_config(database_path, SqlitePerformanceConfig::default()).await
    }

    pub async fn new_with_config<P: AsRef<Path>>(
        database_path: P,
        performance_config: SqlitePerformanceConfig,
    ) -> ColorWalletResult<Self> {
        let connection = Connection::open(database_path).await.map_err(|e| {
            ColorWalletError::Storage(format!("Failed to open SQLite database: {e}"))
        })?;
        Self::from_connection(connection, performance_config).await
    }

    /// Create an in-memory database (useful for testing)
    pub async fn new_in_memory() -> ColorWalletResult<Self> {
        let connection = Connection::open_in_memory().await.map_err(|e| {
            ColorWalletError::Storage(format!("Failed to create in-memory database: {e}"))
        })?;
        Self::from_connection(connection, SqlitePerformanceConfig::in_memory()).await
    }

    async fn from_connection(
        connection: Connection,
        performance_config: SqlitePerformanceConfig,
    ) -> ColorWalletResult<Self> {
        performance_config.apply_to_connection(&connection).await?;
        let storage = Self { connection };
        storage.create_schema().await?;
        Ok(storage)
    }

    async fn create_schema(&self) -> ColorWalletResult<()> {
        self.connection
            .call(|conn| Ok(conn.execute_batch(SCHEMA)?))
            .await
            .map_err(|e| ColorWalletError::Storage(format!("Failed to create schema: {e}")))?;
        tracing::debug!("UTXO and color data schema ready");
        Ok(())
    }

    fn row_to_utxo(row: &Row) -> rusqlite::Result<Utxo> {
        let txhash: String = row.get("txhash")?;
        let txhash = TxHash::from_hex(&txhash)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        let script: String = row.get("script")?;
        let script = hex::decode(script)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(Utxo {
            id: Some(row.get("id")?),
            address: row.get("address")?,
            txhash,
            outindex: row.get("outindex")?,
            value: row.get::<_, i64>("value")? as u64,
            script,
            scantime: row.get::<_, i64>("scantime")? as u64,
            commitment: row.get::<_, i64>("commitment")? as u64,
            address_rec: None,
            colorvalues: None,
        })
    }

    async fn select_utxos(
        &self,
        where_clause: &'static str,
        param: Option<String>,
    ) -> ColorWalletResult<Vec<Utxo>> {
        self.connection
            .call(move |conn| {
                let sql = format!("SELECT {UTXO_COLUMNS} FROM utxo_data {where_clause} ORDER BY id");
                let mut stmt = conn.prepare(&sql)?;
                let rows = match &param {
                    Some(p) => stmt.query_map(params![p], Self::row_to_utxo)?,
                    None => stmt.query_map([], Self::row_to_utxo)?,
                };

                let mut utxos = Vec::new();
                for row in rows {
                    utxos.push(row?);
                }
                Ok(utxos)
            })
            .await
            .map_err(|e| storage_error("Failed to query UTXOs", e))
    }
}

/// Keep constraint violations distinguishable from other database failures
fn storage_error(context: &str, e: tokio_rusqlite::Error) -> ColorWalletError {
    match ColorWalletError::from(e) {
        ColorWalletError::Storage(msg) => ColorWalletError::Storage(format!("{context}: {msg}")),
        other => other,
    }
}

#[async_trait]
impl UtxoStore for SqliteStorage {
    async fn add(&self, utxo: &Utxo) -> ColorWalletResult<i64> {
        let utxo = utxo.clone();
        self.connection
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO utxo_data
                        (address, txhash, outindex, value, script, scantime, commitment)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        utxo.address,
                        utxo.txhash.to_hex(),
                        utxo.outindex,
                        utxo.value as i64,
                        hex::encode(&utxo.script),
                        utxo.scantime as i64,
                        utxo.commitment as i64,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|e| storage_error("Failed to add UTXO", e))
    }

    async fn remove(&self, txhash: &TxHash, outindex: u32) -> ColorWalletResult<bool> {
        let txhash = txhash.to_hex();
        self.connection
            .call(move |conn| {
                let rows_affected = conn.execute(
                    "DELETE FROM utxo_data WHERE txhash = ?1 AND outindex = ?2",
                    params![txhash, outindex],
                )?;
                Ok(rows_affected > 0)
            })
            .await
            .map_err(|e| storage_error("Failed to remove UTXO", e))
    }

    async fn clear(&self) -> ColorWalletResult<()> {
        self.connection
            .call(|conn| {
                conn.execute("DELETE FROM utxo_data", [])?;
                Ok(())
            })
            .await
            .map_err(|e| storage_error("Failed to clear UTXOs", e))
    }

    async fn for_address(&self, address: &str) -> ColorWalletResult<Vec<Utxo>> {
        self.select_utxos("WHERE address = ?1", Some(address.to_string()))
            .await
    }

    async fn for_tx(&self, txhash: &TxHash) -> ColorWalletResult<Vec<Utxo>> {
        self.select_utxos("WHERE txhash = ?1", Some(txhash.to_hex()))
            .await
    }

    async fn all(&self) -> ColorWalletResult<Vec<Utxo>> {
        self.select_utxos("", None).await
    }

    async fn count(&self) -> ColorWalletResult<usize> {
        self.connection
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM utxo_data", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|e| storage_error("Failed to count UTXOs", e))
    }
}

#[async_trait]
impl ColorDataStore for SqliteStorage {
    async fn get(
        &self,
        color_id: ColorId,
        txhash: &TxHash,
        outindex: u32,
    ) -> ColorWalletResult<Option<ColorState>> {
        let txhash = txhash.to_hex();
        self.connection
            .call(move |conn| {
                let state = conn
                    .query_row(
                        "SELECT value, label FROM color_data
                         WHERE color_id = ?1 AND txhash = ?2 AND outindex = ?3",
                        params![color_id, txhash, outindex],
                        |row| {
                            Ok(ColorState::with_label(
                                row.get::<_, i64>(0)? as u64,
                                row.get::<_, String>(1)?,
                            ))
                        },
                    )
                    .optional()?;
                Ok(state)
            })
            .await
            .map_err(|e| storage_error("Failed to read color data", e))
    }

    async fn put(
        &self,
        color_id: ColorId,
        txhash: &TxHash,
        outindex: u32,
        state: &ColorState,
    ) -> ColorWalletResult<()> {
        let txhash_hex = txhash.to_hex();
        let new_state = state.clone();
        let existing = self
            .connection
            .call(move |conn| {
                let tx = conn.transaction()?;
                let existing = tx
                    .query_row(
                        "SELECT value, label FROM color_data
                         WHERE color_id = ?1 AND txhash = ?2 AND outindex = ?3",
                        params![color_id, txhash_hex, outindex],
                        |row| {
                            Ok(ColorState::with_label(
                                row.get::<_, i64>(0)? as u64,
                                row.get::<_, String>(1)?,
                            ))
                        },
                    )
                    .optional()?;
                if existing.is_none() {
                    tx.execute(
                        "INSERT INTO color_data (color_id, txhash, outindex, value, label)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            color_id,
                            txhash_hex,
                            outindex,
                            new_state.value as i64,
                            new_state.label
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(existing)
            })
            .await
            .map_err(|e| storage_error("Failed to write color data", e))?;

        match existing {
            Some(existing) if existing != *state => Err(ColorWalletError::ConstraintViolation(
                format!(
                    "color {color_id} of {txhash}:{outindex} is already {}, refusing {}",
                    existing.value, state.value
                ),
            )),
            _ => Ok(()),
        }
    }

    async fn get_any(&self, txhash: &TxHash, outindex: u32) -> ColorWalletResult<Vec<ColorValue>> {
        let txhash = txhash.to_hex();
        self.connection
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT color_id, value FROM color_data
                     WHERE txhash = ?1 AND outindex = ?2 ORDER BY color_id",
                )?;
                let rows = stmt.query_map(params![txhash, outindex], |row| {
                    Ok(ColorValue::new(row.get(0)?, row.get::<_, i64>(1)? as u64))
                })?;

                let mut colorvalues = Vec::new();
                for row in rows {
                    colorvalues.push(row?);
                }
                Ok(colorvalues)
            })
            .await
            .map_err(|e| storage_error("Failed to read color data", e))
    }

    async fn mark_scanned(&self, color_id: ColorId, txhash: &TxHash) -> ColorWalletResult<()> {
        let txhash = txhash.to_hex();
        self.connection
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO color_scans (color_id, txhash) VALUES (?1, ?2)",
                    params![color_id, txhash],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| storage_error("Failed to mark transaction scanned", e))
    }

    async fn is_scanned(&self, color_id: ColorId, txhash: &TxHash) -> ColorWalletResult<bool> {
        let txhash = txhash.to_hex();
        self.connection
            .call(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT 1 FROM color_scans WHERE color_id = ?1 AND txhash = ?2 LIMIT 1")?;
                Ok(stmt.exists(params![color_id, txhash])?)
            })
            .await
            .map_err(|e| storage_error("Failed to read color scans", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(b: u8) -> TxHash {
        TxHash::new([b; 32])
    }

    #[tokio::test]
    async fn test_round_trip_exact_fields() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let utxo = Utxo::new("mxVFsFW5N4mu1HPkxPttorvocvzeZ7KZyk", hash(1), 3, 5460, vec![0x76, 0xa9, 0x14])
            .with_scantime(1_400_000_000)
            .with_commitment(4);
        let id = storage.add(&utxo).await.unwrap();

        let rows = storage.for_tx(&hash(1)).await.unwrap();
        assert_eq!(rows.len(), 1);
        let mut expected = utxo.clone();
        expected.id = Some(id);
        assert_eq!(rows[0], expected);

        assert!(storage.remove(&hash(1), 3).await.unwrap());
        assert!(storage.for_tx(&hash(1)).await.unwrap().is_empty());
        assert!(!storage.remove(&hash(1), 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_outpoint_is_constraint_violation() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        storage.add(&Utxo::new("a", hash(1), 0, 10, vec![])).await.unwrap();
        let err = storage
            .add(&Utxo::new("b", hash(1), 0, 99, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ColorWalletError::ConstraintViolation(_)), "{err:?}");
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_address_queries_and_clear() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        storage.add(&Utxo::new("a", hash(1), 0, 10, vec![])).await.unwrap();
        storage.add(&Utxo::new("b", hash(1), 1, 20, vec![])).await.unwrap();
        storage.add(&Utxo::new("a", hash(2), 0, 30, vec![])).await.unwrap();

        let for_a = storage.for_address("a").await.unwrap();
        assert_eq!(for_a.iter().map(|u| u.value).collect::<Vec<_>>(), vec![10, 30]);
        assert_eq!(storage.all().await.unwrap().len(), 3);

        storage.clear().await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_color_cache() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        assert_eq!(storage.get(1, &hash(5), 0).await.unwrap(), None);
        assert!(!storage.is_scanned(1, &hash(5)).await.unwrap());

        storage.put(1, &hash(5), 0, &ColorState::new(600)).await.unwrap();
        storage.put(1, &hash(5), 0, &ColorState::new(600)).await.unwrap();
        let err = storage
            .put(1, &hash(5), 0, &ColorState::new(601))
            .await
            .unwrap_err();
        assert!(matches!(err, ColorWalletError::ConstraintViolation(_)));
        storage.put(3, &hash(5), 0, &ColorState::new(7)).await.unwrap();

        assert_eq!(
            storage.get(1, &hash(5), 0).await.unwrap(),
            Some(ColorState::new(600))
        );
        assert_eq!(
            storage.get_any(&hash(5), 0).await.unwrap(),
            vec![ColorValue::new(1, 600), ColorValue::new(3, 7)]
        );

        storage.mark_scanned(1, &hash(5)).await.unwrap();
        storage.mark_scanned(1, &hash(5)).await.unwrap();
        assert!(storage.is_scanned(1, &hash(5)).await.unwrap());
        assert!(!storage.is_scanned(3, &hash(5)).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utxo.db");
        {
            let storage = SqliteStorage::new(&path).await.unwrap();
            storage.add(&Utxo::new("a", hash(9), 0, 10, vec![0x51])).await.unwrap();
            storage.put(2, &hash(9), 0, &ColorState::new(10)).await.unwrap();
        }
        let storage = SqliteStorage::new(&path).await.unwrap();
        assert_eq!(storage.for_address("a").await.unwrap()[0].script, vec![0x51]);
        assert_eq!(storage.get(2, &hash(9), 0).await.unwrap(), Some(ColorState::new(10)));
    }
}
