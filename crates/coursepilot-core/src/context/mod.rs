mod history;
mod tokens;
mod window;

pub use history::ConversationHistory;
pub use tokens::{estimate_messages, estimate_tokens};
pub use window::ContextWindow;
