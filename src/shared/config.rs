use std::time::Duration;

use clap::Args;
use tracing::{info, warn};
use url::Url;

use super::error::{AssistantError, Result};

pub const DEFAULT_LLM_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "gemma2-9b-it";

/// Command-line and environment settings shared by every phonebot binary.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// API key for the OpenAI-compatible inference provider
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// SerpAPI key used for web and image search
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_api_key: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long, env = "PHONEBOT_LLM_URL", default_value = DEFAULT_LLM_URL)]
    pub llm_url: String,

    /// Model name sent with every completion request
    #[arg(long, env = "PHONEBOT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "PHONEBOT_HTTP_TIMEOUT_SECS", default_value_t = 60)]
    pub http_timeout_secs: u64,

    /// Maximum model/tool round trips per user turn
    #[arg(long, env = "PHONEBOT_MAX_TOOL_ROUNDS", default_value_t = 5)]
    pub max_tool_rounds: usize,

    /// Maximum number of image URLs shown per answer
    #[arg(long, env = "PHONEBOT_MAX_IMAGES", default_value_t = 3)]
    pub max_images: usize,

    /// Directory for rolling log files
    #[arg(long, env = "PHONEBOT_LOG_DIR", default_value = "logs")]
    pub log_dir: String,

    /// Extra comma-separated terms added to the content denylist
    #[arg(long, env = "PHONEBOT_EXTRA_DENYLIST", value_delimiter = ',')]
    pub extra_denylist: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub llm_url: String,
    pub model: String,
    pub http_timeout: Duration,
    pub max_tool_rounds: usize,
    pub max_images: usize,
    pub log_dir: String,
    pub extra_denylist: Vec<String>,
}

impl Config {
    pub fn from_args(args: ConfigArgs) -> Result<Self> {
        let llm_url = args.llm_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&llm_url).map_err(|e| {
            AssistantError::Config(format!("PHONEBOT_LLM_URL '{}' is not a valid URL: {}", llm_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AssistantError::Config(format!(
                "PHONEBOT_LLM_URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let model = args.model.trim().to_string();
        if model.is_empty() {
            return Err(AssistantError::Config("PHONEBOT_MODEL must not be empty".to_string()));
        }

        Ok(Self {
            groq_api_key: non_empty(args.groq_api_key),
            serpapi_api_key: non_empty(args.serpapi_api_key),
            llm_url,
            model,
            http_timeout: Duration::from_secs(args.http_timeout_secs.max(1)),
            max_tool_rounds: args.max_tool_rounds.max(1),
            max_images: args.max_images.max(1),
            log_dir: args.log_dir,
            extra_denylist: args
                .extra_denylist
                .into_iter()
                .map(|term| term.trim().to_string())
                .filter(|term| !term.is_empty())
                .collect(),
        })
    }

    /// Log the resolved settings and warn about missing credentials.
    pub fn log_summary(&self) {
        info!("Using inference endpoint: {} (model {})", self.llm_url, self.model);
        match self.groq_api_key.as_deref() {
            Some(key) => info!("Using GROQ_API_KEY: {}", mask_secret(key)),
            None => warn!("Missing GROQ_API_KEY; model calls will fail until it is set"),
        }
        match self.serpapi_api_key.as_deref() {
            Some(key) => info!("Using SERPAPI_API_KEY: {}", mask_secret(key)),
            None => warn!("Missing SERPAPI_API_KEY; web and image search will report errors"),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Partially mask a credential for log output.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "<too-short>".to_string()
    }
}
