// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation record CRUD operations.
//!
//! Timestamps are stored as RFC 3339 UTC text with millisecond precision;
//! with a uniform format, lexicographic ordering matches chronological
//! ordering, so `ORDER BY timestamp` and expiry comparisons work directly
//! on the column text.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use dataline_core::types::{ConversationRecord, ResultStatus};
use dataline_core::DatalineError;
use rusqlite::params;

use crate::database::Database;

const RECORD_COLUMNS: &str = "user_id, conversation_id, query, sql_query, timestamp,
     result_status, result_count, execution_time, error, expiration_time";

/// Upsert a record by its (user_id, conversation_id) composite key.
///
/// On conflict, every field except `expiration_time` is replaced: expiry is
/// fixed at creation and never mutated by later writes.
pub async fn put_record(db: &Database, record: &ConversationRecord) -> Result<(), DatalineError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations
                     (user_id, conversation_id, query, sql_query, timestamp,
                      result_status, result_count, execution_time, error, expiration_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT (user_id, conversation_id) DO UPDATE SET
                     query = excluded.query,
                     sql_query = excluded.sql_query,
                     timestamp = excluded.timestamp,
                     result_status = excluded.result_status,
                     result_count = excluded.result_count,
                     execution_time = excluded.execution_time,
                     error = excluded.error",
                params![
                    record.user_id,
                    record.conversation_id,
                    record.query,
                    record.sql_query,
                    fmt_ts(record.timestamp),
                    record.result_status.map(|s| s.to_string()),
                    record.result_count,
                    record.execution_time.map(fmt_ts),
                    record.error,
                    fmt_ts(record.expiration_time),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one record by composite key. Expired records are invisible.
pub async fn get_record(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<ConversationRecord>, DatalineError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    let now = fmt_ts(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM conversations
                 WHERE user_id = ?1 AND conversation_id = ?2 AND expiration_time > ?3"
            ))?;
            let result = stmt.query_row(params![user_id, conversation_id, now], map_record);
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a user's records most-recent-first, excluding expired records.
///
/// Ties in `timestamp` break on `conversation_id` so ordering is stable
/// within one call. `limit: None` fetches all rows (used by prune).
pub async fn get_records_for_user(
    db: &Database,
    user_id: &str,
    limit: Option<i64>,
    now: DateTime<Utc>,
) -> Result<Vec<ConversationRecord>, DatalineError> {
    let user_id = user_id.to_string();
    let now = fmt_ts(now);
    let limit = limit.unwrap_or(-1);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM conversations
                 WHERE user_id = ?1 AND expiration_time > ?2
                 ORDER BY timestamp DESC, conversation_id DESC
                 LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![user_id, now, limit], map_record)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the terminal result fields on an existing record.
///
/// Deliberately leaves `expiration_time` (and the creation `timestamp`)
/// untouched.
pub async fn update_result(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
    status: ResultStatus,
    result_count: Option<i64>,
    execution_time: Option<DateTime<Utc>>,
    error: Option<String>,
) -> Result<(), DatalineError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    let status = status.to_string();
    let execution_time = execution_time.map(fmt_ts);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations
                 SET result_status = ?1, result_count = ?2, execution_time = ?3, error = ?4
                 WHERE user_id = ?5 AND conversation_id = ?6",
                params![status, result_count, execution_time, error, user_id, conversation_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete one record by composite key. Missing records are a no-op.
pub async fn delete_record(
    db: &Database,
    user_id: &str,
    conversation_id: &str,
) -> Result<(), DatalineError> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM conversations WHERE user_id = ?1 AND conversation_id = ?2",
                params![user_id, conversation_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(idx: usize, text: String) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_record(row: &rusqlite::Row<'_>) -> Result<ConversationRecord, rusqlite::Error> {
    let status: Option<String> = row.get(5)?;
    let result_status = match status {
        Some(text) => Some(ResultStatus::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    let execution_time: Option<String> = row.get(7)?;
    Ok(ConversationRecord {
        user_id: row.get(0)?,
        conversation_id: row.get(1)?,
        query: row.get(2)?,
        sql_query: row.get(3)?,
        timestamp: parse_ts(4, row.get(4)?)?,
        result_status,
        result_count: row.get(6)?,
        execution_time: execution_time.map(|t| parse_ts(7, t)).transpose()?,
        error: row.get(8)?,
        expiration_time: parse_ts(9, row.get(9)?)?,
    })
}
