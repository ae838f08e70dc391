// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context assembly for Tidings model calls.
//!
//! - [`ContextWindow`] bounds the turns sent to the model and triggers
//!   rolling summarization on overflow.
//! - [`Summarizer`] is the single-sentence summarization primitive shared
//!   with conversation naming.
//! - [`render_document_prompt`] builds the system prompt for
//!   document-bound conversations.

pub mod prompt;
pub mod summary;
pub mod window;

pub use prompt::render_document_prompt;
pub use summary::Summarizer;
pub use window::{BuiltContext, ContextRequest, ContextWindow, SUMMARY_PREFIX};
