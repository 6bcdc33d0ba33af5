// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query execution engine integration for Dataline.
//!
//! Implements the execution collaborator against a REST coordinator:
//! submit a SQL string, poll a status endpoint, fetch a bounded result
//! page once the execution succeeds.

pub mod adapter;
pub mod client;
pub mod types;

pub use adapter::HttpQueryEngine;
pub use client::EngineClient;
