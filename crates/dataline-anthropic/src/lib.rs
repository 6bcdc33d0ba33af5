// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API integration for Dataline.
//!
//! Implements the translation collaborator: natural-language questions in,
//! SQL out, with recent conversation history as context.

pub mod client;
pub mod translator;
pub mod types;

pub use client::AnthropicClient;
pub use translator::AnthropicTranslator;
