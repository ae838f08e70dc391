// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool providers, registry, result cache and intent dispatch.
//!
//! - [`ToolProvider`] is the seam for external capabilities.
//! - [`ToolRegistry`] maps each tool name to its provider and schema.
//! - [`ToolResultCache`] is a TTL cache providers use for their results.
//! - [`IntentDispatcher`] asks the language model whether a query needs a
//!   tool and runs it.
//! - [`NewsProvider`] is the built-in news capability.

pub mod cache;
pub mod dispatcher;
pub mod news;
pub mod provider;
pub mod registry;

pub use cache::{ToolResultCache, cache_key};
pub use dispatcher::{Dispatch, IntentDispatcher, NoToolReason, ToolSuccess};
pub use news::NewsProvider;
pub use provider::ToolProvider;
pub use registry::ToolRegistry;
