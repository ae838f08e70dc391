// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tidings assistant core.
//!
//! Provides the error type, the shared data model (messages, tool schemas,
//! delivery events), and the traits for the external collaborators: the
//! language model and document context sources.

pub mod error;
pub mod traits;
pub mod types;

pub use error::TidingsError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{DocumentSource, FragmentStream, LanguageModel, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidings_error_variants_render() {
        let provider = TidingsError::provider("connection refused");
        assert_eq!(provider.to_string(), "provider error: connection refused");

        let tool = TidingsError::tool("duplicate tool name `search_news`");
        assert!(tool.to_string().contains("search_news"));

        let document = TidingsError::Document {
            message: "retrieval from notes.pdf failed".into(),
            source: Some(Box::new(TidingsError::Internal("index file truncated".into()))),
        };
        assert_eq!(document.to_string(), "document error: retrieval from notes.pdf failed");
        let cause = std::error::Error::source(&document).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("internal error: index file truncated"));

        let missing = TidingsError::ConversationNotFound("abc".into());
        assert_eq!(missing.to_string(), "conversation not found: abc");
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::LanguageModel,
            AdapterType::DocumentSource,
            AdapterType::ToolProvider,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn collaborator_traits_are_object_safe() {
        fn _language_model(_: &dyn LanguageModel) {}
        fn _document_source(_: &dyn DocumentSource) {}
    }
}
