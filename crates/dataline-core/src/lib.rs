// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Dataline query pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Dataline workspace. All collaborator
//! backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DatalineError;
pub use types::{AdapterType, HealthStatus, ResultStatus};

// Re-export all collaborator traits at crate root.
pub use traits::{
    BlobStore, DispatchQueue, ExecutionAdapter, PluginAdapter, RecordStore, ResultCache,
    TranslationAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn error_kinds_are_stable() {
        let cases: Vec<(DatalineError, &str)> = vec![
            (DatalineError::Config("bad".into()), "config"),
            (
                DatalineError::Storage {
                    source: Box::new(std::io::Error::other("x")),
                },
                "storage",
            ),
            (
                DatalineError::Translation {
                    message: "x".into(),
                    source: None,
                },
                "translation",
            ),
            (
                DatalineError::Dispatch {
                    message: "x".into(),
                    source: None,
                },
                "dispatch",
            ),
            (
                DatalineError::Execution {
                    message: "x".into(),
                    reason: None,
                },
                "execution",
            ),
            (
                DatalineError::Formatting {
                    message: "x".into(),
                    source: None,
                },
                "formatting",
            ),
            (DatalineError::Retention("x".into()), "retention"),
            (DatalineError::NotFound("x".into()), "not_found"),
            (
                DatalineError::Timeout {
                    duration: std::time::Duration::from_secs(10),
                },
                "timeout",
            ),
            (DatalineError::Internal("x".into()), "internal"),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn adapter_type_display_round_trips() {
        let variants = [
            AdapterType::Translation,
            AdapterType::Execution,
            AdapterType::Queue,
            AdapterType::Blob,
            AdapterType::Cache,
            AdapterType::Storage,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every collaborator trait is reachable
        // through the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_translation<T: TranslationAdapter>() {}
        fn _assert_execution<T: ExecutionAdapter>() {}
        fn _assert_queue<T: DispatchQueue>() {}
        fn _assert_blob<T: BlobStore>() {}
        fn _assert_cache<T: ResultCache>() {}
        fn _assert_records<T: RecordStore>() {}
    }
}
