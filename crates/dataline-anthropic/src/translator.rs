// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural-language-to-SQL translator backed by the Anthropic Messages API.
//!
//! The prompt embeds the tabular dataset schema and the serialized
//! conversation history, and instructs the model to return bare SQL.

use async_trait::async_trait;
use tracing::debug;

use dataline_config::model::TranslationConfig;
use dataline_core::types::{AdapterType, HealthStatus, HistoryEntry};
use dataline_core::{DatalineError, PluginAdapter, TranslationAdapter};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Translation adapter: one Messages API call per question.
pub struct AnthropicTranslator {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
    table_schema: String,
}

impl AnthropicTranslator {
    /// Build a translator from configuration.
    ///
    /// The API key comes from config, falling back to the
    /// `ANTHROPIC_API_KEY` environment variable.
    pub fn new(config: &TranslationConfig) -> Result<Self, DatalineError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                DatalineError::Config(
                    "translation.api_key is not set and ANTHROPIC_API_KEY is absent".into(),
                )
            })?;
        let client = AnthropicClient::new(&api_key, &config.api_version)?;
        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            table_schema: config.table_schema.clone(),
        })
    }

    #[cfg(test)]
    fn with_client(mut self, client: AnthropicClient) -> Self {
        self.client = client;
        self
    }

    /// Render the translation prompt for `query` with `history` as context.
    fn build_prompt(&self, query: &str, history: &[HistoryEntry]) -> String {
        let history_json = serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string());
        format!(
            "You are a SQL query generator. Convert the following natural language query to SQL.\n\
             The data is stored in Parquet format with the following schema:\n\
             {schema}\n\
             \n\
             Previous conversation history:\n\
             {history}\n\
             \n\
             User query: {query}\n\
             \n\
             Return only the SQL query without any explanation.",
            schema = self.table_schema,
            history = history_json,
        )
    }
}

#[async_trait]
impl PluginAdapter for AnthropicTranslator {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Translation
    }

    async fn health_check(&self) -> Result<HealthStatus, DatalineError> {
        // No cheap side-effect-free API probe exists; report healthy if the
        // client was constructed.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DatalineError> {
        Ok(())
    }
}

#[async_trait]
impl TranslationAdapter for AnthropicTranslator {
    async fn translate(
        &self,
        query: &str,
        history: &[HistoryEntry],
    ) -> Result<String, DatalineError> {
        let request = MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: self.build_prompt(query, history),
            }],
            system: None,
            max_tokens: self.max_tokens,
        };

        let response = self.client.complete_message(&request).await?;
        let sql = response.text().trim().to_string();
        if sql.is_empty() {
            return Err(DatalineError::Translation {
                message: format!(
                    "translation service returned no SQL (stop_reason: {:?})",
                    response.stop_reason
                ),
                source: None,
            });
        }
        debug!(model = %response.model, history_len = history.len(), "query translated");
        Ok(sql)
    }
}
