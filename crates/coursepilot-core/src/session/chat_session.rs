use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::{ApiClient, ChatListItem, ChatRequest, Message, Role};
use crate::constants::messages::{NEW_CHAT_TITLE, PREVIEW_CHARS};
use crate::context::{ContextWindow, ConversationHistory};
use crate::error::PilotError;

use super::chat_list::{ChatListAction, ChatListState, EntryStatus, Toast};

/// Identifies a conversation in the session.
///
/// A draft has no server id yet; it gets a local one so that a send still in
/// flight keeps its own slot after the user starts another new chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Draft(Uuid),
    Chat(String),
}

impl SessionKey {
    pub fn draft() -> Self {
        Self::Draft(Uuid::new_v4())
    }

    pub fn chat_id(&self) -> Option<&str> {
        match self {
            Self::Chat(id) => Some(id),
            Self::Draft(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Option<String>,
    pub title: String,
    pub history: ConversationHistory,
    pub updated_at: DateTime<Utc>,
    pub last_message_preview: String,
}

impl Conversation {
    fn new(id: Option<String>, window: &ContextWindow) -> Self {
        Self {
            id,
            title: NEW_CHAT_TITLE.to_string(),
            history: ConversationHistory::new().with_window(window.clone()),
            updated_at: Utc::now(),
            last_message_preview: String::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.history.messages()
    }

    fn with_message(mut self, message: Message) -> Self {
        if self.title == NEW_CHAT_TITLE && message.role == Role::User {
            self.title = preview(&message.content);
        }
        self.updated_at = message.timestamp;
        self.last_message_preview = preview(&message.content);
        self.history.add_message(message);
        self
    }

    fn with_messages(mut self, messages: Vec<Message>) -> Self {
        if let Some(last) = messages.last() {
            self.updated_at = last.timestamp;
            self.last_message_preview = preview(&last.content);
        }
        self.history.replace(messages);
        self
    }

    fn list_item(&self, chat_id: &str) -> ChatListItem {
        ChatListItem {
            chat_id: chat_id.to_string(),
            title: self.title.clone(),
            created_at: self.messages().first().map(|m| m.timestamp).unwrap_or(self.updated_at),
            updated_at: self.updated_at,
            last_message: Some(self.last_message_preview.clone()),
        }
    }
}

fn preview(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// A send that is still waiting for its reply.
struct PendingSend {
    cancel: CancellationToken,
    message: Message,
}

struct SessionState {
    active: SessionKey,
    conversations: HashMap<SessionKey, Conversation>,
    pending: HashMap<SessionKey, PendingSend>,
    chats: ChatListState,
}

impl SessionState {
    fn new(window: &ContextWindow) -> Self {
        let active = SessionKey::draft();
        let mut conversations = HashMap::new();
        conversations.insert(active.clone(), Conversation::new(None, window));
        Self {
            active,
            conversations,
            pending: HashMap::new(),
            chats: ChatListState::default(),
        }
    }

    fn apply(&mut self, action: ChatListAction) {
        self.chats = std::mem::take(&mut self.chats).reduce(action);
    }
}

/// Client-side state of all conversations plus the chat list.
///
/// State is keyed per conversation: loading one chat while another one's
/// send is in flight leaves the pending one alone. Clones share state.
#[derive(Clone)]
pub struct ChatSession {
    api: ApiClient,
    window: ContextWindow,
    state: Arc<RwLock<SessionState>>,
}

impl ChatSession {
    pub fn new(api: ApiClient, window: ContextWindow) -> Self {
        let state = SessionState::new(&window);
        Self {
            api,
            window,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    pub async fn active(&self) -> SessionKey {
        self.state.read().await.active.clone()
    }

    pub async fn conversation(&self, key: &SessionKey) -> Option<Conversation> {
        self.state.read().await.conversations.get(key).cloned()
    }

    pub async fn messages(&self, key: &SessionKey) -> Vec<Message> {
        self.state
            .read()
            .await
            .conversations
            .get(key)
            .map(|c| c.messages().to_vec())
            .unwrap_or_default()
    }

    pub async fn active_messages(&self) -> Vec<Message> {
        let state = self.state.read().await;
        state
            .conversations
            .get(&state.active)
            .map(|c| c.messages().to_vec())
            .unwrap_or_default()
    }

    pub async fn chats(&self) -> Vec<ChatListItem> {
        self.state.read().await.chats.items().to_vec()
    }

    pub async fn chat_status(&self, chat_id: &str) -> EntryStatus {
        self.state.read().await.chats.status(chat_id)
    }

    pub async fn is_pending(&self, key: &SessionKey) -> bool {
        self.state.read().await.pending.contains_key(key)
    }

    pub async fn take_toasts(&self) -> Vec<Toast> {
        self.state.write().await.chats.take_toasts()
    }

    /// Start a fresh conversation. The server assigns its id on first send.
    pub async fn new_chat(&self) -> SessionKey {
        let mut state = self.state.write().await;
        let previous = state.active.clone();
        if matches!(previous, SessionKey::Draft(_)) && !state.pending.contains_key(&previous) {
            state.conversations.remove(&previous);
        }
        let key = SessionKey::draft();
        state.conversations.insert(key.clone(), Conversation::new(None, &self.window));
        state.active = key.clone();
        key
    }

    /// Switch to a chat and reload its messages from the server.
    pub async fn select_chat(&self, chat_id: &str) -> Result<Vec<Message>, PilotError> {
        self.select_chat_with(chat_id, &CancellationToken::new()).await
    }

    /// [`select_chat`](Self::select_chat) with a caller-held token. Once the
    /// token is cancelled the reloaded messages are not applied.
    pub async fn select_chat_with(&self, chat_id: &str, cancel: &CancellationToken) -> Result<Vec<Message>, PilotError> {
        let key = SessionKey::Chat(chat_id.to_string());
        self.state.write().await.active = key.clone();

        let call = cancel.child_token();
        let result = self.api.chat_messages(chat_id, &call).await;
        if call.is_cancelled() {
            return Err(result.err().unwrap_or(PilotError::Cancelled));
        }
        let mut messages = result?;

        let mut state = self.state.write().await;
        if let Some(pending) = state.pending.get(&key) {
            // the server copy does not have the question that is still waiting
            let stored = messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .is_some_and(|m| m.content == pending.message.content);
            if !stored {
                messages.push(pending.message.clone());
            }
        }
        let conversation = state
            .conversations
            .remove(&key)
            .unwrap_or_else(|| Conversation::new(Some(chat_id.to_string()), &self.window))
            .with_messages(messages);
        let snapshot = conversation.messages().to_vec();
        if let Some(item) = state.chats.items().iter().find(|i| i.chat_id == chat_id) {
            let title = item.title.clone();
            state.conversations.insert(key, Conversation { title, ..conversation });
        } else {
            state.conversations.insert(key, conversation);
        }
        tracing::debug!(chat_id, messages = snapshot.len(), "chat reloaded");
        Ok(snapshot)
    }

    pub async fn refresh_chats(&self) -> Result<Vec<ChatListItem>, PilotError> {
        let items = self.api.list_chats(&CancellationToken::new()).await?;
        let mut state = self.state.write().await;
        state.apply(ChatListAction::Loaded(items));
        Ok(state.chats.items().to_vec())
    }

    /// Send `text` in the active conversation and return the reply.
    ///
    /// The context is selected from a snapshot before anything is appended,
    /// and the reply lands in the conversation the message was sent from,
    /// even if the user switched chats in the meantime.
    pub async fn send_message(&self, text: &str) -> Result<Message, PilotError> {
        self.send_message_with(text, &CancellationToken::new()).await
    }

    /// [`send_message`](Self::send_message) with a caller-held token.
    ///
    /// A reply that arrives after the token was cancelled is dropped and the
    /// call returns [`PilotError::Cancelled`]. Deleting the chat cancels the
    /// send as well.
    pub async fn send_message_with(&self, text: &str, cancel: &CancellationToken) -> Result<Message, PilotError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PilotError::Invalid("Message is empty".into()));
        }

        let (key, request, call) = {
            let mut state = self.state.write().await;
            let key = state.active.clone();
            if state.pending.contains_key(&key) {
                return Err(PilotError::Invalid("Still waiting for the previous reply".into()));
            }

            let conversation = state
                .conversations
                .remove(&key)
                .unwrap_or_else(|| Conversation::new(key.chat_id().map(String::from), &self.window));
            let request = ChatRequest {
                message: text.to_string(),
                chat_id: key.chat_id().map(String::from),
                previous_messages: conversation.history.outbound_context(),
            };

            let mut user_message = Message::user(text);
            user_message.chat_id = request.chat_id.clone();
            let call = cancel.child_token();
            state.pending.insert(
                key.clone(),
                PendingSend {
                    cancel: call.clone(),
                    message: user_message.clone(),
                },
            );
            state.conversations.insert(key.clone(), conversation.with_message(user_message));
            (key, request, call)
        };

        tracing::debug!(
            context_messages = request.previous_messages.len(),
            chat_id = request.chat_id.as_deref().unwrap_or("<new>"),
            "sending chat message"
        );

        let result = self.api.send_chat(&request, &call).await;

        let mut state = self.state.write().await;
        state.pending.remove(&key);

        if call.is_cancelled() {
            tracing::debug!("discarding reply for cancelled request");
            return Err(result.err().unwrap_or(PilotError::Cancelled));
        }
        let response = result?;

        let chat_id = response.chat_id.clone();
        if state.chats.is_deleted(&chat_id) {
            tracing::debug!(chat_id = %chat_id, "discarding reply for deleted chat");
            state.conversations.remove(&key);
            return Err(PilotError::Cancelled);
        }
        let reply = response.into_message();
        let target = SessionKey::Chat(chat_id.clone());

        let mut conversation = state
            .conversations
            .remove(&key)
            .unwrap_or_else(|| Conversation::new(Some(chat_id.clone()), &self.window));
        if key != target {
            // draft got its id; fold in anything already stored under it
            if let Some(existing) = state.conversations.remove(&target) {
                let merged: Vec<Message> = existing
                    .messages()
                    .iter()
                    .chain(conversation.messages())
                    .cloned()
                    .collect();
                conversation = existing.with_messages(merged);
            }
            if state.active == key {
                state.active = target.clone();
            }
        }
        conversation.id = Some(chat_id.clone());
        let conversation = conversation.with_message(reply.clone());

        let item = conversation.list_item(&chat_id);
        state.conversations.insert(target, conversation);
        state.apply(ChatListAction::Touched(item));

        Ok(reply)
    }

    /// Optimistically remove a chat; it comes back at its old position if
    /// the server refuses.
    pub async fn delete_chat(&self, chat_id: &str) -> Result<(), PilotError> {
        {
            let mut state = self.state.write().await;
            match state.chats.status(chat_id) {
                EntryStatus::Present => {}
                EntryStatus::Deleting => {
                    return Err(PilotError::Invalid("Chat is already being deleted".into()));
                }
                EntryStatus::Absent => {
                    return Err(PilotError::Invalid(format!("Unknown chat: {chat_id}")));
                }
            }
            state.apply(ChatListAction::DeleteStarted(chat_id.to_string()));
        }

        let result = self.api.delete_chat(chat_id, &CancellationToken::new()).await;

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.apply(ChatListAction::DeleteSucceeded(chat_id.to_string()));
                let key = SessionKey::Chat(chat_id.to_string());
                if let Some(pending) = state.pending.get(&key) {
                    pending.cancel.cancel();
                }
                state.conversations.remove(&key);
                if state.active == key {
                    let draft = SessionKey::draft();
                    state.conversations.insert(draft.clone(), Conversation::new(None, &self.window));
                    state.active = draft;
                }
                tracing::info!(chat_id, "chat deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "delete failed, restoring chat");
                state.apply(ChatListAction::DeleteFailed(chat_id.to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_text() {
        assert_eq!(preview("  short  "), "short");
        let long = "word ".repeat(40);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert!(p.chars().count() <= PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_first_user_message_becomes_title() {
        let window = ContextWindow::default();
        let conv = Conversation::new(None, &window)
            .with_message(Message::user("When is the midterm?"))
            .with_message(Message::assistant("Next Tuesday."));
        assert_eq!(conv.title, "When is the midterm?");
        assert_eq!(conv.last_message_preview, "Next Tuesday.");
        assert_eq!(conv.messages().len(), 2);
    }

    #[test]
    fn test_draft_keys_are_unique() {
        assert_ne!(SessionKey::draft(), SessionKey::draft());
        assert_eq!(SessionKey::Chat("abc".into()).chat_id(), Some("abc"));
    }
}
