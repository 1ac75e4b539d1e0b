use std::collections::HashSet;

use crate::api::ChatListItem;
use crate::constants::messages::DELETE_FAILED;

/// Where a chat stands in the optimistic delete flow.
///
/// `Present -> Deleting -> Absent` on success,
/// `Present -> Deleting -> Present` on failure.
/// `Absent` after a confirmed delete is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Present,
    Deleting,
    Absent,
}

/// Transient notification for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum ChatListAction {
    /// Full list from the server.
    Loaded(Vec<ChatListItem>),
    DeleteStarted(String),
    DeleteSucceeded(String),
    DeleteFailed(String),
    /// A chat saw new activity: upsert it at the top.
    Touched(ChatListItem),
}

/// The visible chat list plus the bookkeeping needed to undo deletes.
///
/// A chat being deleted stays in `entries` and is only hidden, so a failed
/// delete puts it back exactly where it was, even when several deletes
/// overlap. Transitions go through [`reduce`](Self::reduce), which consumes
/// the old state and returns the next one.
#[derive(Debug, Clone, Default)]
pub struct ChatListState {
    entries: Vec<ChatListItem>,
    visible: Vec<ChatListItem>,
    deleting: HashSet<String>,
    deleted: HashSet<String>,
    toasts: Vec<Toast>,
}

impl ChatListState {
    pub fn new(items: Vec<ChatListItem>) -> Self {
        Self::default().reduce(ChatListAction::Loaded(items))
    }

    pub fn reduce(mut self, action: ChatListAction) -> Self {
        match action {
            ChatListAction::Loaded(items) => {
                let mut entries: Vec<ChatListItem> = items
                    .into_iter()
                    .filter(|item| !self.deleted.contains(&item.chat_id))
                    .collect();
                // the server may not list a chat whose delete is still pending
                for (index, item) in self.entries.iter().enumerate() {
                    if self.deleting.contains(&item.chat_id)
                        && !entries.iter().any(|e| e.chat_id == item.chat_id)
                    {
                        let index = if index <= entries.len() { index } else { 0 };
                        entries.insert(index, item.clone());
                    }
                }
                self.entries = entries;
            }
            ChatListAction::DeleteStarted(id) => {
                if self.status(&id) == EntryStatus::Present {
                    self.deleting.insert(id);
                }
            }
            ChatListAction::DeleteSucceeded(id) => {
                if self.deleting.remove(&id) {
                    self.entries.retain(|item| item.chat_id != id);
                    self.deleted.insert(id);
                }
            }
            ChatListAction::DeleteFailed(id) => {
                if self.deleting.remove(&id) {
                    self.toasts.push(Toast {
                        message: DELETE_FAILED.to_string(),
                    });
                }
            }
            ChatListAction::Touched(item) => {
                if !self.deleting.contains(&item.chat_id) && !self.deleted.contains(&item.chat_id) {
                    self.entries.retain(|e| e.chat_id != item.chat_id);
                    self.entries.insert(0, item);
                }
            }
        }
        self.visible = self
            .entries
            .iter()
            .filter(|item| !self.deleting.contains(&item.chat_id))
            .cloned()
            .collect();
        self
    }

    pub fn items(&self) -> &[ChatListItem] {
        &self.visible
    }

    pub fn ids(&self) -> Vec<&str> {
        self.visible.iter().map(|item| item.chat_id.as_str()).collect()
    }

    pub fn status(&self, chat_id: &str) -> EntryStatus {
        if self.deleting.contains(chat_id) {
            EntryStatus::Deleting
        } else if self.visible.iter().any(|item| item.chat_id == chat_id) {
            EntryStatus::Present
        } else {
            EntryStatus::Absent
        }
    }

    /// Whether the server confirmed deleting this chat.
    pub fn is_deleted(&self, chat_id: &str) -> bool {
        self.deleted.contains(chat_id)
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str) -> ChatListItem {
        ChatListItem {
            chat_id: id.to_string(),
            title: format!("Chat {id}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_message: None,
        }
    }

    fn state(ids: &[&str]) -> ChatListState {
        ChatListState::new(ids.iter().map(|id| item(id)).collect())
    }

    #[test]
    fn test_delete_removes_immediately() {
        let state = state(&["a", "abc", "b"]).reduce(ChatListAction::DeleteStarted("abc".into()));

        assert_eq!(state.ids(), vec!["a", "b"]);
        assert_eq!(state.status("abc"), EntryStatus::Deleting);
    }

    #[test]
    fn test_delete_success_finalizes() {
        let state = state(&["a", "abc", "b"])
            .reduce(ChatListAction::DeleteStarted("abc".into()))
            .reduce(ChatListAction::DeleteSucceeded("abc".into()));

        assert_eq!(state.status("abc"), EntryStatus::Absent);
        assert!(state.is_deleted("abc"));
        assert!(state.toasts().is_empty());
    }

    #[test]
    fn test_delete_failure_restores_position() {
        let before = state(&["a", "abc", "b"]);
        let ids_before: Vec<String> = before.ids().iter().map(|s| s.to_string()).collect();

        let after = before
            .reduce(ChatListAction::DeleteStarted("abc".into()))
            .reduce(ChatListAction::DeleteFailed("abc".into()));

        assert_eq!(after.ids(), ids_before);
        assert_eq!(after.status("abc"), EntryStatus::Present);
        assert_eq!(after.toasts()[0].message, "Failed to delete chat. Please try again.");
    }

    #[test]
    fn test_overlapping_failed_deletes_keep_order() {
        let state = state(&["a", "b", "c"])
            .reduce(ChatListAction::DeleteStarted("a".into()))
            .reduce(ChatListAction::DeleteStarted("b".into()))
            .reduce(ChatListAction::DeleteFailed("a".into()))
            .reduce(ChatListAction::DeleteFailed("b".into()));

        assert_eq!(state.ids(), vec!["a", "b", "c"]);
        assert_eq!(state.toasts().len(), 2);
    }

    #[test]
    fn test_overlapping_failures_in_reverse_order() {
        let state = state(&["a", "b", "c"])
            .reduce(ChatListAction::DeleteStarted("a".into()))
            .reduce(ChatListAction::DeleteStarted("b".into()))
            .reduce(ChatListAction::DeleteFailed("b".into()));
        assert_eq!(state.ids(), vec!["b", "c"]);

        let state = state.reduce(ChatListAction::DeleteFailed("a".into()));
        assert_eq!(state.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rollback_prepends_when_index_is_gone() {
        let state = state(&["a", "b", "c", "d"])
            .reduce(ChatListAction::DeleteStarted("d".into()))
            .reduce(ChatListAction::Loaded(vec![item("a")]))
            .reduce(ChatListAction::DeleteFailed("d".into()));

        assert_eq!(state.ids(), vec!["d", "a"]);
    }

    #[test]
    fn test_reload_keeps_pending_delete_hidden() {
        let state = state(&["a", "b"])
            .reduce(ChatListAction::DeleteStarted("a".into()))
            .reduce(ChatListAction::Loaded(vec![item("a"), item("b")]));

        assert_eq!(state.ids(), vec!["b"]);
        assert_eq!(state.status("a"), EntryStatus::Deleting);
    }

    #[test]
    fn test_deleted_chat_never_comes_back() {
        let state = state(&["a", "b"])
            .reduce(ChatListAction::DeleteStarted("a".into()))
            .reduce(ChatListAction::DeleteSucceeded("a".into()))
            .reduce(ChatListAction::Touched(item("a")))
            .reduce(ChatListAction::Loaded(vec![item("a"), item("b")]));

        assert_eq!(state.ids(), vec!["b"]);
        assert_eq!(state.status("a"), EntryStatus::Absent);
    }

    #[test]
    fn test_delete_unknown_chat_is_noop() {
        let state = state(&["a"]).reduce(ChatListAction::DeleteStarted("zzz".into()));
        assert_eq!(state.status("zzz"), EntryStatus::Absent);
        let state = state.reduce(ChatListAction::DeleteFailed("zzz".into()));
        assert_eq!(state.ids(), vec!["a"]);
        assert!(state.toasts().is_empty());
    }

    #[test]
    fn test_touched_moves_to_front() {
        let state = state(&["a", "b", "c"]).reduce(ChatListAction::Touched(item("c")));
        assert_eq!(state.ids(), vec!["c", "a", "b"]);

        let state = state.reduce(ChatListAction::Touched(item("new")));
        assert_eq!(state.ids(), vec!["new", "c", "a", "b"]);
    }

    #[test]
    fn test_take_toasts_drains() {
        let mut state = state(&["a"])
            .reduce(ChatListAction::DeleteStarted("a".into()))
            .reduce(ChatListAction::DeleteFailed("a".into()));

        assert_eq!(state.take_toasts().len(), 1);
        assert!(state.toasts().is_empty());
    }
}
