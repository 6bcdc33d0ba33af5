// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch queue operations: crash-safe, at-least-once delivery.
//!
//! A received entry is moved to `processing` and locked for a visibility
//! window. Entries whose lock lapses (consumer crashed mid-flight) become
//! receivable again, which is where duplicate delivery comes from --
//! consumers must be idempotent per conversation.

use dataline_core::types::{DispatchMessage, QueuedMessage};
use dataline_core::DatalineError;
use rusqlite::params;

use crate::database::Database;

/// Visibility lock window for in-flight entries.
const LOCK_WINDOW: &str = "+5 minutes";

/// Enqueue a dispatch message. Returns the queue entry id.
///
/// Either the row is fully written or the call fails with no trace: the
/// submission path relies on this to uphold its persist-after-enqueue
/// ordering.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    message: &DispatchMessage,
) -> Result<i64, DatalineError> {
    let payload = serde_json::to_string(message).map_err(|e| DatalineError::Dispatch {
        message: format!("failed to serialize dispatch message: {e}"),
        source: Some(Box::new(e)),
    })?;
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO dispatch (queue_name, payload) VALUES (?1, ?2)",
                params![queue_name, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Receive the next available entry from the named queue.
///
/// Atomically selects the oldest receivable entry -- `pending`, or
/// `processing` with a lapsed lock -- marks it `processing`, bumps its
/// delivery attempt count, and renews the lock. Returns `None` when the
/// queue is empty.
pub async fn receive(
    db: &Database,
    queue_name: &str,
) -> Result<Option<QueuedMessage>, DatalineError> {
    let queue_name = queue_name.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(
                    "SELECT id, payload, attempts FROM dispatch
                     WHERE queue_name = ?1
                       AND (status = 'pending'
                            OR (status = 'processing'
                                AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))
                     ORDER BY id ASC
                     LIMIT 1",
                )?;
                stmt.query_row(params![queue_name], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i32>(2)?))
                })
            };

            match result {
                Ok((id, payload, attempts)) => {
                    tx.execute(
                        &format!(
                            "UPDATE dispatch SET status = 'processing',
                             attempts = attempts + 1,
                             locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '{LOCK_WINDOW}'),
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE id = ?1"
                        ),
                        params![id],
                    )?;
                    tx.commit()?;
                    Ok(Some((id, payload, attempts + 1)))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match row {
        None => Ok(None),
        Some((id, payload, attempts)) => {
            let message: DispatchMessage =
                serde_json::from_str(&payload).map_err(|e| DatalineError::Dispatch {
                    message: format!("malformed dispatch payload for entry {id}: {e}"),
                    source: Some(Box::new(e)),
                })?;
            Ok(Some(QueuedMessage {
                receipt: id,
                message,
                attempts,
            }))
        }
    }
}

/// Acknowledge successful processing: the entry will not redeliver.
pub async fn ack(db: &Database, id: i64) -> Result<(), DatalineError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE dispatch SET status = 'completed',
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Release an entry after a processing failure.
///
/// While delivery attempts remain below the entry's budget it returns to
/// `pending` for redelivery; once the budget is spent it is parked as
/// `failed` and never delivered again.
pub async fn fail(db: &Database, id: i64) -> Result<(), DatalineError> {
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i32, i32) = conn.query_row(
                "SELECT attempts, max_attempts FROM dispatch WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let next_status = if attempts >= max_attempts {
                "failed"
            } else {
                "pending"
            };
            conn.execute(
                "UPDATE dispatch SET status = ?1,
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![next_status, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
