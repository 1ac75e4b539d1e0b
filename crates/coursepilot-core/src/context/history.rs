use crate::api::Message;

use super::tokens::estimate_messages;
use super::window::ContextWindow;

/// In-memory message list of one conversation.
///
/// Every change goes through [`ContextWindow::prune`], so the list never
/// grows past the available input tokens (down to the pruning floor).
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    window: ContextWindow,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: ContextWindow) -> Self {
        self.window = window;
        self.prune();
        self
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.prune();
    }

    /// Drop the current messages in favour of a full reload.
    pub fn replace(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.prune();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Owned copy of the trailing messages that fit in the next request.
    pub fn outbound_context(&self) -> Vec<Message> {
        self.window.select_context(&self.messages).to_vec()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn total_tokens(&self) -> usize {
        estimate_messages(&self.messages)
    }

    fn prune(&mut self) {
        let dropped = self.window.prune_count(&self.messages);
        if dropped > 0 {
            tracing::debug!(
                dropped,
                remaining = self.messages.len() - dropped,
                "pruned conversation history"
            );
            self.messages.drain(..dropped);
        }
    }
}
