mod traits;
mod types;
mod dispatcher;
mod client;
pub mod planner;

pub use traits::*;
pub use types::{ChatListItem, ChatRequest, ChatResponse, Message, Role};
pub use dispatcher::HttpDispatcher;
pub use client::ApiClient;
pub use planner::{AiPlan, Planner};
