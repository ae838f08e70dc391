// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat tool registry mapping each tool name to its provider and schema.
//!
//! Names are unique across all providers. Registering a provider that
//! exposes an already-registered name fails and leaves the registry unchanged.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tidings_core::TidingsError;
use tidings_core::types::ToolSchema;
use tracing::info;

use crate::provider::ToolProvider;

/// A registered tool: the schema plus the provider that executes it.
#[derive(Clone)]
pub struct RegisteredTool {
    pub schema: ToolSchema,
    pub provider: Arc<dyn ToolProvider>,
}

/// Registry of tools, indexed by name, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every tool exposed by `provider`.
    pub fn register(&mut self, provider: Arc<dyn ToolProvider>) -> Result<(), TidingsError> {
        let schemas = provider.tools();

        let mut incoming = HashSet::new();
        for schema in &schemas {
            if self.index.contains_key(&schema.name) || !incoming.insert(schema.name.as_str()) {
                return Err(TidingsError::tool(format!(
                    "duplicate tool name `{}` from provider `{}`",
                    schema.name,
                    provider.name()
                )));
            }
        }

        let count = schemas.len();
        for schema in schemas {
            self.index.insert(schema.name.clone(), self.tools.len());
            self.tools.push(RegisteredTool {
                schema,
                provider: Arc::clone(&provider),
            });
        }

        info!(provider = provider.name(), tools = count, "tool provider registered");
        Ok(())
    }

    /// Looks up a tool by exact name.
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Schemas of all registered tools, in registration order.
    pub fn schemas(&self) -> Vec<&ToolSchema> {
        self.tools.iter().map(|t| &t.schema).collect()
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use tidings_core::types::{AdapterType, HealthStatus, ToolInvocationResult};
    use tidings_core::PluginAdapter;

    struct FixedProvider {
        name: &'static str,
        tools: Vec<&'static str>,
    }

    #[async_trait]
    impl PluginAdapter for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::ToolProvider
        }

        async fn health_check(&self) -> Result<HealthStatus, TidingsError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl ToolProvider for FixedProvider {
        fn tools(&self) -> Vec<ToolSchema> {
            self.tools
                .iter()
                .map(|name| ToolSchema::new(name, "test tool"))
                .collect()
        }

        async fn execute(&self, tool_name: &str, _params: &Map<String, Value>) -> ToolInvocationResult {
            ToolInvocationResult::Success {
                tool_name: tool_name.to_string(),
                data: Value::Null,
                rendered: self.name.to_string(),
            }
        }
    }

    fn provider(name: &'static str, tools: Vec<&'static str>) -> Arc<dyn ToolProvider> {
        Arc::new(FixedProvider { name, tools })
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry
            .register(provider("weather", vec!["forecast", "alerts"]))
            .unwrap();
        registry.register(provider("news", vec!["headlines"])).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("alerts").unwrap().provider.name(), "weather");
        assert_eq!(registry.get("headlines").unwrap().provider.name(), "news");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn schemas_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(provider("b", vec!["zeta", "alpha"])).unwrap();
        registry.register(provider("a", vec!["mid"])).unwrap();

        let names: Vec<&str> = registry.schemas().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn duplicate_across_providers_is_rejected_atomically() {
        let mut registry = ToolRegistry::new();
        registry.register(provider("first", vec!["search"])).unwrap();

        let err = registry
            .register(provider("second", vec!["fresh", "search"]))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate tool name `search`"));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("fresh").is_none());
        assert_eq!(registry.get("search").unwrap().provider.name(), "first");
    }

    #[test]
    fn duplicate_within_one_provider_is_rejected() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(provider("dup", vec!["x", "x"])).is_err());
        assert!(registry.is_empty());
    }
}
