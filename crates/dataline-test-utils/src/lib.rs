// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for Dataline tests.
//!
//! Every external resource the pipeline consumes has an in-memory stand-in
//! here: a scriptable translator and execution engine, plus record store,
//! dispatch queue, blob store, and result cache implementations with the
//! same observable semantics as the production backends.

pub mod mock_engine;
pub mod mock_translator;
pub mod stores;

pub use mock_engine::MockEngine;
pub use mock_translator::{MockTranslator, SeenTranslation};
pub use stores::{MemoryBlobStore, MemoryQueue, MemoryRecordStore, MemoryResultCache};
