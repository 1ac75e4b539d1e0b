pub mod error;
pub mod constants;
pub mod api;
pub mod context;
pub mod session;
pub mod config;

// Re-export key types
pub use error::{PilotError, Result};
pub use api::{AiPlan, ApiClient, ApiRequest, ChatListItem, Dispatcher, HttpDispatcher, Message, Planner, Role};
pub use context::{estimate_tokens, ContextWindow, ConversationHistory};
pub use session::{ChatSession, EntryStatus, SessionKey, Toast};
pub use config::Settings;
