// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Dataline query pipeline.
//!
//! Thin transport layer: request parsing, structured error bodies, and
//! routing into [`dataline_pipeline::QueryService`]. All pipeline behavior
//! lives behind that service.

pub mod handlers;
pub mod server;

pub use server::{build_router, serve, GatewayState};
