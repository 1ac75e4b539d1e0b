mod chat_list;
mod chat_session;

pub use chat_list::{ChatListAction, ChatListState, EntryStatus, Toast};
pub use chat_session::{ChatSession, Conversation, SessionKey};
