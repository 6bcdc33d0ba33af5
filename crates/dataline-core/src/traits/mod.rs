// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Dataline pipeline.
//!
//! Every external resource the pipeline touches -- translation service,
//! execution engine, dispatch queue, blob store, result cache, durable
//! record store -- is injected behind one of these traits rather than
//! constructed ad hoc inside an operation.

pub mod adapter;
pub mod blob;
pub mod cache;
pub mod execution;
pub mod queue;
pub mod records;
pub mod translation;

pub use adapter::PluginAdapter;
pub use blob::BlobStore;
pub use cache::ResultCache;
pub use execution::ExecutionAdapter;
pub use queue::DispatchQueue;
pub use records::RecordStore;
pub use translation::TranslationAdapter;
