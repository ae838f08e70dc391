// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool provider trait.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tidings_core::PluginAdapter;
use tidings_core::types::{ToolInvocationResult, ToolSchema};

/// A named bundle of tools backed by one external capability.
///
/// A provider may serve several tools; dispatch always goes by exact tool name.
/// `execute` never fails with an error: transport, protocol and upstream
/// problems are reported as [`ToolInvocationResult::Failure`].
#[async_trait]
pub trait ToolProvider: PluginAdapter {
    /// Schemas of every tool this provider serves.
    fn tools(&self) -> Vec<ToolSchema>;

    /// Runs `tool_name` with already-validated parameters.
    async fn execute(&self, tool_name: &str, params: &Map<String, Value>) -> ToolInvocationResult;
}
