// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tidings integration tests.
//!
//! Provides scripted collaborators for fast, deterministic tests without
//! a running model server.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock language model with scripted completions and streams
//! - [`StaticDocuments`] - Document source returning fixed passages

pub mod mock_documents;
pub mod mock_provider;

pub use mock_documents::StaticDocuments;
pub use mock_provider::{MockProvider, StreamScript};
