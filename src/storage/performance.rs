//! SQLite connection tuning
//!
//! The UTXO store sees bursts of inserts during a full resync and otherwise
//! small point reads, so the presets differ mainly in durability.

use tokio_rusqlite::Connection;

use crate::errors::{ColorWalletError, ColorWalletResult};

/// Pragmas applied to a freshly opened connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlitePerformanceConfig {
    /// Enable WAL (Write-Ahead Logging); ignored by in-memory databases
    pub enable_wal_mode: bool,
    /// Synchronous mode (0=OFF, 1=NORMAL, 2=FULL)
    pub synchronous_mode: u8,
    /// Cache size in KB
    pub cache_size_kb: i32,
    /// Temporary storage mode (0=default, 1=file, 2=memory)
    pub temp_store: u8,
    /// Busy timeout in milliseconds
    pub busy_timeout_ms: u32,
}

impl Default for SqlitePerformanceConfig {
    fn default() -> Self {
        Self::balanced()
    }
}

impl SqlitePerformanceConfig {
    /// Every commit reaches the disk before returning
    pub fn durable() -> Self {
        Self {
            enable_wal_mode: true,
            synchronous_mode: 2, // FULL
            cache_size_kb: 8_000,
            temp_store: 2,
            busy_timeout_ms: 5000,
        }
    }

    /// WAL with NORMAL sync: safe against application crashes, not power loss
    pub fn balanced() -> Self {
        Self {
            enable_wal_mode: true,
            synchronous_mode: 1, // NORMAL
            cache_size_kb: 16_000,
            temp_store: 2,
            busy_timeout_ms: 5000,
        }
    }

    /// For `:memory:` databases, where durability is moot
    pub fn in_memory() -> Self {
        Self {
            enable_wal_mode: false,
            synchronous_mode: 0, // OFF
            cache_size_kb: 4_000,
            temp_store: 2,
            busy_timeout_ms: 1000,
        }
    }

    /// Check if configuration survives an application crash
    pub fn is_crash_safe(&self) -> bool {
        self.synchronous_mode > 0
    }

    pub async fn apply_to_connection(&self, connection: &Connection) -> ColorWalletResult<()> {
        let config = self.clone();
        connection
            .call(move |conn| {
                if config.enable_wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                }
                conn.pragma_update(None, "synchronous", config.synchronous_mode)?;
                // negative cache_size is in KB rather than pages
                conn.pragma_update(None, "cache_size", -config.cache_size_kb)?;
                conn.pragma_update(None, "temp_store", config.temp_store)?;
                conn.pragma_update(None, "busy_timeout", config.busy_timeout_ms)?;
                Ok(())
            })
            .await
            .map_err(|e| ColorWalletError::Storage(format!("Failed to apply SQLite pragmas: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(SqlitePerformanceConfig::durable().is_crash_safe());
        assert!(SqlitePerformanceConfig::default().is_crash_safe());
        assert_eq!(SqlitePerformanceConfig::default().synchronous_mode, 1);

        let memory = SqlitePerformanceConfig::in_memory();
        assert!(!memory.is_crash_safe());
        assert!(!memory.enable_wal_mode);
    }

    #[tokio::test]
    async fn test_apply_to_in_memory_connection() {
        let connection = Connection::open_in_memory().await.unwrap();
        SqlitePerformanceConfig::in_memory()
            .apply_to_connection(&connection)
            .await
            .unwrap();
        let sync: i64 = connection
            .call(|conn| Ok(conn.pragma_query_value(None, "synchronous", |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(sync, 0);
    }
}
