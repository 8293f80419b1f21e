pub mod config;
pub mod error;
pub mod inference;
pub mod logging;
pub mod models;

pub use config::Config;
pub use error::{AssistantError, Result};
pub use inference::{ChatModel, InferenceClient, ModelResponse};
