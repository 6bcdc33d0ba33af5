// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence backends for the Dataline query pipeline.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`, holding both
//! conversation records and the crash-safe dispatch queue; plus a
//! filesystem blob store for raw results and an in-memory TTL cache for
//! formatted results.

pub mod adapter;
pub mod blob;
pub mod cache;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use blob::FsBlobStore;
pub use cache::MemoryCache;
pub use database::Database;
