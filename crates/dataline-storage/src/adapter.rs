// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RecordStore and DispatchQueue traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use dataline_config::model::StorageConfig;
use dataline_core::types::{
    AdapterType, ConversationRecord, DispatchMessage, HealthStatus, QueuedMessage, ResultStatus,
};
use dataline_core::{DatalineError, DispatchQueue, PluginAdapter, RecordStore};

use crate::database::Database;
use crate::queries;

/// Name of the single queue the pipeline dispatches through.
const DISPATCH_QUEUE: &str = "dispatch";

/// SQLite-backed storage: conversation records and the dispatch queue share
/// one WAL-mode database behind a single writer.
///
/// The database is lazily initialized on the first call to
/// [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), DatalineError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| DatalineError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoint and close the database.
    pub async fn close(&self) -> Result<(), DatalineError> {
        self.db()?.close().await
    }

    fn db(&self) -> Result<&Database, DatalineError> {
        self.db.get().ok_or_else(|| DatalineError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DatalineError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DatalineError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStorage {
    async fn put(&self, record: &ConversationRecord) -> Result<(), DatalineError> {
        queries::records::put_record(self.db()?, record).await
    }

    async fn get(
        &self,
        user_id: &str,
        conversation_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConversationRecord>, DatalineError> {
        queries::records::get_record(self.db()?, user_id, conversation_id, now).await
    }

    async fn get_for_user(
        &self,
        user_id: &str,
        limit: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ConversationRecord>, DatalineError> {
        queries::records::get_records_for_user(self.db()?, user_id, limit, now).await
    }

    async fn update_result(
        &self,
        user_id: &str,
        conversation_id: &str,
        status: ResultStatus,
        result_count: Option<i64>,
        execution_time: Option<DateTime<Utc>>,
        error: Option<String>,
    ) -> Result<(), DatalineError> {
        queries::records::update_result(
            self.db()?,
            user_id,
            conversation_id,
            status,
            result_count,
            execution_time,
            error,
        )
        .await
    }

    async fn delete(&self, user_id: &str, conversation_id: &str) -> Result<(), DatalineError> {
        queries::records::delete_record(self.db()?, user_id, conversation_id).await
    }
}

#[async_trait]
impl DispatchQueue for SqliteStorage {
    async fn send(&self, message: &DispatchMessage) -> Result<(), DatalineError> {
        queries::dispatch::enqueue(self.db()?, DISPATCH_QUEUE, message).await?;
        Ok(())
    }

    async fn receive(&self) -> Result<Option<QueuedMessage>, DatalineError> {
        queries::dispatch::receive(self.db()?, DISPATCH_QUEUE).await
    }

    async fn ack(&self, receipt: i64) -> Result<(), DatalineError> {
        queries::dispatch::ack(self.db()?, receipt).await
    }

    async fn fail(&self, receipt: i64) -> Result<(), DatalineError> {
        queries::dispatch::fail(self.db()?, receipt).await
    }
}
