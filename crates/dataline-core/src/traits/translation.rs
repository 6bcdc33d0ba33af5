// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation adapter trait for natural-language-to-SQL services.

use async_trait::async_trait;

use crate::error::DatalineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::HistoryEntry;

/// Adapter for the external translation service.
///
/// Takes a natural-language question plus recent conversation history and
/// returns a SQL query string. The service is opaque to the pipeline: the
/// pipeline never inspects or validates the returned SQL.
#[async_trait]
pub trait TranslationAdapter: PluginAdapter {
    /// Translate `query` into SQL, using `history` as context.
    async fn translate(
        &self,
        query: &str,
        history: &[HistoryEntry],
    ) -> Result<String, DatalineError>;
}
