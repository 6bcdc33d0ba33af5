// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Dataline core pipeline.
//!
//! A submitted question moves through four stages, each an independently
//! invoked unit of work with no shared mutable state:
//!
//! 1. [`submit::TranslationRequester`] -- history-aware NL-to-SQL
//!    translation, provisional record, dispatch message.
//! 2. [`executor::ExecutionOrchestrator`] -- queue consumption, bounded
//!    status polling, raw result persistence.
//! 3. [`formatter::ResultFormatter`] -- presentation shaping, cache write,
//!    terminal record update.
//! 4. [`memory::ConversationStore`] -- bounded, expiring per-user history
//!    feeding translation context.
//!
//! Cross-stage communication goes through the dispatch queue, the record
//! store, and the blob store exclusively.

pub mod executor;
pub mod formatter;
pub mod history;
pub mod memory;
pub mod service;
pub mod submit;
pub mod worker;

pub use executor::{raw_result_path, ExecutionOrchestrator, PollOutcome, ProcessOutcome};
pub use formatter::ResultFormatter;
pub use history::HistoryAssembler;
pub use memory::ConversationStore;
pub use service::{PollResponse, QueryService};
pub use submit::TranslationRequester;
pub use worker::DispatchWorker;
