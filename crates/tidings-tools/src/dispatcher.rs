// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-intent detection and dispatch.
//!
//! The [`IntentDispatcher`] shows the language model the full tool catalogue,
//! asks it to classify a query as "use tool X with parameters P" or "no tool
//! needed", validates the answer against the registry, and runs the tool.
//!
//! Classification output that cannot be parsed, or that names a tool nobody
//! registered, fails open to [`Dispatch::NoTool`]. So does a classification
//! call that fails outright: the model path still gets its chance to answer.
//! Parameter validation and provider failures produce [`Dispatch::ToolFailed`].

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tidings_core::types::{ChatMessage, CompletionRequest, ParamType, ToolInvocationResult, ToolSchema};
use tidings_core::LanguageModel;
use tracing::{debug, info, warn};

use crate::registry::ToolRegistry;

/// A successful tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSuccess {
    pub tool_name: String,
    /// Label announced to the user.
    pub display_name: String,
    pub data: Value,
    pub rendered: String,
}

/// Why no tool was used for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoToolReason {
    /// The classifier decided no tool is needed.
    NotNeeded(Option<String>),
    /// The classifier answer was not a usable decision.
    Unparseable,
    /// The classifier named a tool that is not registered.
    UnknownTool(String),
    /// There are no tools to choose from.
    NoToolsRegistered,
    /// The classification call itself failed.
    ClassifierUnavailable(String),
}

/// Outcome of intent detection for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    ToolUsed(ToolSuccess),
    NoTool(NoToolReason),
    /// A tool was selected but did not produce a result; callers fall back
    /// to the model path.
    ToolFailed { tool_name: String, error: String },
}

#[derive(Debug, Deserialize)]
struct Decision {
    #[serde(default)]
    need_tool: bool,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
}

/// Classifies queries and runs the selected tool.
pub struct IntentDispatcher {
    model: Arc<dyn LanguageModel>,
    registry: Arc<ToolRegistry>,
    temperature: Option<f32>,
}

impl IntentDispatcher {
    pub fn new(model: Arc<dyn LanguageModel>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            registry,
            temperature: None,
        }
    }

    /// Sampling temperature for the classification call.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Runs at most one classification call and, if a tool is selected,
    /// exactly one tool execution.
    pub async fn detect(&self, query: &str, model: Option<&str>) -> Dispatch {
        if self.registry.is_empty() {
            return Dispatch::NoTool(NoToolReason::NoToolsRegistered);
        }

        let prompt = classification_prompt(&self.registry.schemas());
        let mut request = CompletionRequest::new(vec![ChatMessage::system(prompt), ChatMessage::user(query)])
            .with_model(model.map(str::to_string));
        request.temperature = self.temperature;

        let raw = match self.model.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "tool classification failed, falling back to model");
                return Dispatch::NoTool(NoToolReason::ClassifierUnavailable(e.to_string()));
            }
        };

        let Some(decision) = parse_decision(&raw) else {
            warn!(response_len = raw.len(), "unparseable tool classification, falling back to model");
            return Dispatch::NoTool(NoToolReason::Unparseable);
        };

        if !decision.need_tool {
            debug!(reason = ?decision.reason, "classifier chose no tool");
            return Dispatch::NoTool(NoToolReason::NotNeeded(decision.reason));
        }

        let Some(tool_name) = decision.tool_name else {
            warn!("classifier asked for a tool without naming one");
            return Dispatch::NoTool(NoToolReason::Unparseable);
        };

        let Some(tool) = self.registry.get(&tool_name) else {
            warn!(tool = %tool_name, "classifier selected an unregistered tool");
            return Dispatch::NoTool(NoToolReason::UnknownTool(tool_name));
        };

        let params = match validate_parameters(&tool.schema, decision.parameters) {
            Ok(params) => params,
            Err(error) => {
                warn!(tool = %tool_name, %error, "tool parameters rejected");
                return Dispatch::ToolFailed { tool_name, error };
            }
        };

        info!(tool = %tool_name, provider = tool.provider.name(), "executing tool");
        match tool.provider.execute(&tool_name, &params).await {
            ToolInvocationResult::Success { data, rendered, .. } => Dispatch::ToolUsed(ToolSuccess {
                display_name: tool.schema.label().to_string(),
                tool_name,
                data,
                rendered,
            }),
            ToolInvocationResult::Failure { error, .. } => {
                warn!(tool = %tool_name, %error, "tool execution failed");
                Dispatch::ToolFailed { tool_name, error }
            }
        }
    }
}

/// Builds the system prompt listing every tool and the expected JSON answer.
pub fn classification_prompt(schemas: &[&ToolSchema]) -> String {
    let mut catalogue = String::from("Available tools:\n\n");
    for schema in schemas {
        let _ = writeln!(catalogue, "Tool name: {}", schema.name);
        let _ = writeln!(catalogue, "Description: {}", schema.description);
        if !schema.parameters.is_empty() {
            catalogue.push_str("Parameters:\n");
            for param in &schema.parameters {
                let requirement = match (&param.default, param.required) {
                    (_, true) => "required".to_string(),
                    (Some(default), false) => format!("optional, default {default}"),
                    (None, false) => "optional".to_string(),
                };
                let _ = writeln!(
                    catalogue,
                    "  - {}: {} ({requirement}) - {}",
                    param.name, param.kind, param.description
                );
            }
        }
        catalogue.push('\n');
    }

    format!(
        "You decide whether the user's request needs one of the tools below.\n\n\
         {catalogue}\
         If a tool is needed, reply with JSON:\n\
         {{\"need_tool\": true, \"tool_name\": \"<tool name>\", \"parameters\": {{\"<parameter>\": <value>}}}}\n\n\
         If no tool is needed, reply with:\n\
         {{\"need_tool\": false, \"reason\": \"<short reason>\"}}\n\n\
         Reply with JSON only, no other text."
    )
}

/// Parses the classifier answer after removing markdown code fences.
///
/// Falls back to the outermost `{...}` span when the answer carries
/// surrounding prose.
fn parse_decision(raw: &str) -> Option<Decision> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    if let Ok(decision) = serde_json::from_str::<Decision>(cleaned) {
        return Some(decision);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

/// Checks classifier-supplied parameters against the schema.
///
/// Required parameters must be present. Values are coerced to the declared
/// type where the conversion is lossless. Absent optional parameters take
/// their default. Parameters the schema does not declare are dropped.
pub fn validate_parameters(schema: &ToolSchema, raw: Option<Value>) -> Result<Map<String, Value>, String> {
    let mut supplied = match raw {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(format!("parameters must be an object, got {other}")),
    };

    let mut params = Map::new();
    for param in &schema.parameters {
        match supplied.remove(&param.name) {
            Some(Value::Null) | None => {
                if param.required {
                    return Err(format!("missing required parameter `{}`", param.name));
                }
                if let Some(default) = &param.default {
                    params.insert(param.name.clone(), default.clone());
                }
            }
            Some(value) => {
                let coerced = coerce(param.kind, value).ok_or_else(|| {
                    format!("parameter `{}` must be of type {}", param.name, param.kind)
                })?;
                params.insert(param.name.clone(), coerced);
            }
        }
    }

    if !supplied.is_empty() {
        let extra: Vec<&String> = supplied.keys().collect();
        debug!(tool = %schema.name, ?extra, "dropping undeclared parameters");
    }

    Ok(params)
}

fn coerce(kind: ParamType, value: Value) -> Option<Value> {
    match (kind, value) {
        (ParamType::String, Value::String(s)) => Some(Value::String(s)),
        (ParamType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ParamType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (ParamType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Some(Value::Number(n))
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| Value::from(f as i64))
            }
        }
        (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (ParamType::Number, Value::Number(n)) => Some(Value::Number(n)),
        (ParamType::Number, Value::String(s)) => s.trim().parse::<f64>().ok().and_then(|f| {
            serde_json::Number::from_f64(f).map(Value::Number)
        }),

        (ParamType::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
        (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },

        _ => None,
    }
}
