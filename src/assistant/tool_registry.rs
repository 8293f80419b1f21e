use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Core trait that all assistant tools implement
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Parameters as JSON schema
    fn parameters(&self) -> Value;

    async fn execute(&self, args: &Value) -> Result<String>;
}

/// Rewrites arguments addressed to an alias into the canonical tool's shape
pub trait ParameterMapper: Send + Sync {
    fn map(&self, args: &Value) -> Value;
}

/// Registry of tools and their aliases
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Box<dyn Tool>>>>,
    aliases: Arc<RwLock<HashMap<String, String>>>, // alias -> canonical_name
    mappers: Arc<RwLock<HashMap<String, Box<dyn ParameterMapper>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
            aliases: Arc::new(RwLock::new(HashMap::new())),
            mappers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register_tool(&self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        info!("Registering tool: {}", name);
        let mut tools = self.tools.write().await;
        tools.insert(name, tool);
    }

    pub async fn register_alias(
        &self,
        alias: &str,
        target: &str,
        mapper: Option<Box<dyn ParameterMapper>>,
    ) {
        info!("Registering alias '{}' -> '{}'", alias, target);

        let mut aliases = self.aliases.write().await;
        aliases.insert(alias.to_string(), target.to_string());

        if let Some(mapper) = mapper {
            let mut mappers = self.mappers.write().await;
            mappers.insert(alias.to_string(), mapper);
        }
    }

    /// Resolve a name to its canonical tool name, checking aliases first
    pub async fn resolve(&self, name: &str) -> Option<String> {
        let aliases = self.aliases.read().await;
        if let Some(canonical_name) = aliases.get(name) {
            return Some(canonical_name.clone());
        }

        let tools = self.tools.read().await;
        if tools.contains_key(name) {
            return Some(name.to_string());
        }

        // Models often change the casing of tool names
        tools
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub async fn execute_tool(&self, name: &str, args: &Value) -> Result<String> {
        info!("Executing tool: '{}'", name);

        let mapped_args = {
            let mappers = self.mappers.read().await;
            match mappers.get(name) {
                Some(mapper) => mapper.map(args),
                None => args.clone(),
            }
        };

        let Some(canonical_name) = self.resolve(name).await else {
            anyhow::bail!("Tool '{}' not found", name);
        };

        let tools = self.tools.read().await;
        match tools.get(&canonical_name) {
            Some(tool) => tool.execute(&mapped_args).await,
            None => anyhow::bail!("Tool '{}' not found", canonical_name),
        }
    }

    /// OpenAI-compatible function definitions for every tool (aliases are
    /// resolved server-side and not advertised)
    pub async fn function_definitions(&self) -> Vec<Value> {
        let tools = self.tools.read().await;
        let mut names: Vec<&String> = tools.keys().collect();
        names.sort();

        let defs: Vec<Value> = names
            .into_iter()
            .filter_map(|name| tools.get(name))
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters(),
                    }
                })
            })
            .collect();

        info!("Generated {} tool definitions", defs.len());
        defs
    }

    /// All available tool names, including aliases
    pub async fn list_tools(&self) -> Vec<String> {
        let mut tool_names = Vec::new();

        let tools = self.tools.read().await;
        tool_names.extend(tools.keys().cloned());

        let aliases = self.aliases.read().await;
        tool_names.extend(aliases.keys().cloned());

        tool_names.sort();
        tool_names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps the many shapes models use for a single text argument onto `{"query": ...}`
pub struct QueryArgMapper;

impl ParameterMapper for QueryArgMapper {
    fn map(&self, args: &Value) -> Value {
        let query = match args {
            Value::String(s) => s.clone(),
            Value::Object(obj) => ["query", "input", "q", "text", "__arg1"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
                .map(str::to_string)
                .unwrap_or_else(|| {
                    warn!("Tool call with no recognizable query field");
                    String::new()
                }),
            _ => String::new(),
        };

        json!({ "query": query })
    }
}

/// Pull the `query` argument out of a tool call, accepting a bare string too
pub fn query_arg(args: &Value) -> Option<String> {
    let raw = match args {
        Value::String(s) => Some(s.as_str()),
        other => other.get("query").and_then(|v| v.as_str()),
    };
    raw.map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

/// JSON schema shared by every single-query tool
pub fn query_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {"type": "string", "description": description}
        },
        "required": ["query"]
    })
}
