//! Tool definitions and registry.
//!
//! Tools come in two capability-tagged flavors:
//!
//! - [`ToolDefinition::Auto`] - carries an [`AutoTool`] that runs as soon as
//!   the model calls it
//! - [`ToolDefinition::Confirm`] - a schema-only [`ConfirmToolSpec`]; its
//!   effect lives in a separately-supplied [`ExecutionMap`] entry and only
//!   runs after the user approves the call
//!
//! The registry is what the model sees (names, descriptions, schemas); the
//! execution map is what the confirmation resolver consults.

use crate::llm;
use crate::types::ToolResult;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Context passed to tool execution.
///
/// `Ctx` is the application-specific context (scheduler handle, clock,
/// user id). Tools that need nothing use `ToolContext<()>`.
pub struct ToolContext<Ctx> {
    pub app: Ctx,
}

impl<Ctx> ToolContext<Ctx> {
    #[must_use]
    pub fn new(app: Ctx) -> Self {
        Self { app }
    }
}

/// A tool that executes automatically when the model calls it.
#[async_trait]
pub trait AutoTool<Ctx>: Send + Sync {
    /// Tool name as the model sees it.
    fn name(&self) -> &'static str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &'static str;

    /// JSON schema for the tool's input parameters.
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given input.
    ///
    /// # Errors
    /// Returns an error if tool execution fails.
    async fn execute(&self, ctx: &ToolContext<Ctx>, input: Value) -> Result<ToolResult>;
}

/// The effect of a confirmation-required tool.
///
/// Keyed by tool name in the [`ExecutionMap`], invoked by the confirmation
/// resolver once the user approves the call.
#[async_trait]
pub trait ToolExecutor<Ctx>: Send + Sync {
    /// Run the approved call with its recorded input.
    ///
    /// # Errors
    /// Returns an error if execution fails. The resolver catches it per-call.
    async fn execute(&self, ctx: &ToolContext<Ctx>, input: Value) -> Result<ToolResult>;
}

/// Schema-only definition of a confirmation-required tool.
#[derive(Clone, Debug)]
pub struct ConfirmToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// A registered tool: either auto-executing or confirmation-required.
pub enum ToolDefinition<Ctx> {
    Auto(Arc<dyn AutoTool<Ctx>>),
    Confirm(ConfirmToolSpec),
}

impl<Ctx> Clone for ToolDefinition<Ctx> {
    fn clone(&self) -> Self {
        match self {
            Self::Auto(t) => Self::Auto(Arc::clone(t)),
            Self::Confirm(s) => Self::Confirm(s.clone()),
        }
    }
}

impl<Ctx> ToolDefinition<Ctx> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto(t) => t.name(),
            Self::Confirm(s) => s.name,
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auto(t) => t.description(),
            Self::Confirm(s) => s.description,
        }
    }

    #[must_use]
    pub fn input_schema(&self) -> Value {
        match self {
            Self::Auto(t) => t.input_schema(),
            Self::Confirm(s) => s.input_schema.clone(),
        }
    }
}

/// Registry of available tools, keyed by name for model lookup.
pub struct ToolRegistry<Ctx> {
    tools: HashMap<String, ToolDefinition<Ctx>>,
}

impl<Ctx> Clone for ToolRegistry<Ctx> {
    fn clone(&self) -> Self {
        Self {
            tools: self.tools.clone(),
        }
    }
}

impl<Ctx> Default for ToolRegistry<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> ToolRegistry<Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register an auto-executing tool.
    pub fn register_auto<T>(&mut self, tool: T) -> &mut Self
    where
        T: AutoTool<Ctx> + 'static,
    {
        let name = tool.name().to_string();
        self.tools.insert(name, ToolDefinition::Auto(Arc::new(tool)));
        self
    }

    /// Register a confirmation-required tool by its schema-only spec.
    pub fn register_confirm(&mut self, spec: ConfirmToolSpec) -> &mut Self {
        self.tools
            .insert(spec.name.to_string(), ToolDefinition::Confirm(spec));
        self
    }

    /// Get a tool definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition<Ctx>> {
        self.tools.get(name)
    }

    /// Get the auto tool registered under `name`, if that definition is auto.
    #[must_use]
    pub fn get_auto(&self, name: &str) -> Option<&Arc<dyn AutoTool<Ctx>>> {
        match self.tools.get(name) {
            Some(ToolDefinition::Auto(t)) => Some(t),
            _ => None,
        }
    }

    /// Whether `name` refers to an auto-executing tool.
    #[must_use]
    pub fn is_auto(&self, name: &str) -> bool {
        matches!(self.tools.get(name), Some(ToolDefinition::Auto(_)))
    }

    /// Get all registered tool definitions.
    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition<Ctx>> {
        self.tools.values()
    }

    /// Get the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Convert all definitions (auto + confirm) to model tool definitions.
    #[must_use]
    pub fn to_llm_tools(&self) -> Vec<llm::Tool> {
        self.tools
            .values()
            .map(|def| llm::Tool {
                name: def.name().to_string(),
                description: def.description().to_string(),
                input_schema: def.input_schema(),
            })
            .collect()
    }
}

/// Execution functions for confirmation-required tools, keyed by tool name.
///
/// Supplied separately from the schema-only definitions in the registry.
/// A tool-call part whose name has no entry here (and no recorded output)
/// is considered dangling and stripped by message cleanup.
pub struct ExecutionMap<Ctx> {
    executors: HashMap<String, Arc<dyn ToolExecutor<Ctx>>>,
}

impl<Ctx> Clone for ExecutionMap<Ctx> {
    fn clone(&self) -> Self {
        Self {
            executors: self.executors.clone(),
        }
    }
}

impl<Ctx> Default for ExecutionMap<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> ExecutionMap<Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under the given tool name.
    pub fn register<E>(&mut self, name: impl Into<String>, executor: E) -> &mut Self
    where
        E: ToolExecutor<Ctx> + 'static,
    {
        self.executors.insert(name.into(), Arc::new(executor));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolExecutor<Ctx>>> {
        self.executors.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}
