// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the core depends on.
//!
//! The language model and document sources are external systems; the core
//! only sees them through these traits and `#[async_trait]` objects.

pub mod adapter;
pub mod document;
pub mod provider;

pub use adapter::PluginAdapter;
pub use document::DocumentSource;
pub use provider::{FragmentStream, LanguageModel};
