pub mod message;
pub mod product;
pub mod recommendation;
pub mod session;

pub use message::{ChatMessage, ChatRole, ToolCall};
pub use product::{catalog, Product};
pub use recommendation::Recommendation;
pub use session::ChatSession;
