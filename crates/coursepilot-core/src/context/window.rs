use crate::api::Message;
use crate::config::ContextSettings;

use super::tokens::{estimate_messages, estimate_tokens};

/// Token budget for a conversation, derived once from [`ContextSettings`].
///
/// Two independent jobs:
/// - [`select_context`](Self::select_context) picks what goes out with the
///   next request and never touches stored history.
/// - [`prune`](Self::prune) bounds what is kept in memory and never touches
///   a request that is already on its way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    available_input_tokens: usize,
    selection_cap: usize,
    prune_min_messages: usize,
    prune_floor: usize,
}

impl ContextWindow {
    pub fn new(settings: &ContextSettings) -> Self {
        let max = settings.max_context_tokens;
        let reserved = (max as f64 * settings.response_reserve).ceil() as usize;
        let available_input_tokens = max.saturating_sub(reserved);
        let selection_cap = (available_input_tokens as f64 * settings.safety_factor).floor() as usize;

        Self {
            available_input_tokens,
            selection_cap,
            prune_min_messages: settings.prune_min_messages,
            prune_floor: settings.prune_floor,
        }
    }

    /// Tokens left for input once the response reserve is taken out.
    pub fn available_input_tokens(&self) -> usize {
        self.available_input_tokens
    }

    /// Upper bound on the context attached to a single request.
    pub fn selection_cap(&self) -> usize {
        self.selection_cap
    }

    /// Longest suffix of `history` whose estimated size fits the selection cap.
    ///
    /// Walks backwards from the newest message and stops at the first one
    /// that would overflow, so the result is always contiguous and in
    /// chronological order. An oversized newest message yields an empty
    /// selection.
    pub fn select_context<'a>(&self, history: &'a [Message]) -> &'a [Message] {
        let mut used = 0;
        let mut start = history.len();

        for (idx, message) in history.iter().enumerate().rev() {
            let cost = estimate_tokens(&message.content);
            if used + cost > self.selection_cap {
                break;
            }
            used += cost;
            start = idx;
        }

        &history[start..]
    }

    /// How many of the oldest messages [`prune`](Self::prune) would drop.
    pub fn prune_count(&self, messages: &[Message]) -> usize {
        if messages.len() < self.prune_min_messages {
            return 0;
        }

        let mut total = estimate_messages(messages);
        let mut dropped = 0;
        while total > self.available_input_tokens && messages.len() - dropped > self.prune_floor {
            total -= estimate_tokens(&messages[dropped].content);
            dropped += 1;
        }
        dropped
    }

    /// Stored history with the oldest messages removed until it fits the
    /// available input tokens or only the floor is left.
    pub fn prune(&self, messages: &[Message]) -> Vec<Message> {
        let dropped = self.prune_count(messages);
        messages[dropped..].to_vec()
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(&ContextSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Window with `available` input tokens (no reserve) and the default 0.8 factor.
    fn window(available: usize) -> ContextWindow {
        ContextWindow::new(&ContextSettings {
            max_context_tokens: available,
            response_reserve: 0.0,
            ..ContextSettings::default()
        })
    }

    fn history(count: usize, tokens_each: usize) -> Vec<Message> {
        (0..count)
            .map(|i| {
                let body = format!("{i:0>width$}", width = tokens_each * 4);
                if i % 2 == 0 {
                    Message::user(body)
                } else {
                    Message::assistant(body)
                }
            })
            .collect()
    }

    #[test]
    fn test_default_budget() {
        let window = ContextWindow::default();
        assert_eq!(window.available_input_tokens(), 12_000);
        assert_eq!(window.selection_cap(), 9_600);
    }

    #[test]
    fn test_reserve_is_rounded_up() {
        let window = ContextWindow::new(&ContextSettings {
            max_context_tokens: 10,
            response_reserve: 0.25,
            ..ContextSettings::default()
        });
        // ceil(2.5) = 3 reserved
        assert_eq!(window.available_input_tokens(), 7);
    }

    #[test]
    fn test_select_everything_when_it_fits() {
        let window = window(6000);
        assert_eq!(window.selection_cap(), 4800);

        let msgs = history(5, 500);
        let selected = window.select_context(&msgs);
        assert_eq!(selected.len(), 5);
        assert_eq!(selected[0].content, msgs[0].content);
    }

    #[test]
    fn test_select_most_recent_suffix() {
        let window = window(6000);
        let msgs = history(20, 400);

        let selected = window.select_context(&msgs);
        assert_eq!(selected.len(), 12);
        assert_eq!(estimate_messages(selected), 4800);
        assert_eq!(selected.first().unwrap().content, msgs[8].content);
        assert_eq!(selected.last().unwrap().content, msgs[19].content);
        // stored history untouched
        assert_eq!(msgs.len(), 20);
    }

    #[test]
    fn test_select_stops_at_first_overflow() {
        let window = window(1000); // cap 800
        let mut msgs = history(3, 100);
        msgs.insert(1, Message::user("z".repeat(4 * 700)));

        let selected = window.select_context(&msgs);
        // the small message before the big one is not picked up past the gap
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].content, msgs[2].content);
    }

    #[test]
    fn test_oversized_newest_message_selects_nothing() {
        let window = window(100);
        let mut msgs = history(3, 5);
        msgs.push(Message::user("q".repeat(4 * 500)));
        assert!(window.select_context(&msgs).is_empty());
    }

    #[test]
    fn test_select_from_empty_history() {
        assert!(window(100).select_context(&[]).is_empty());
    }

    #[test]
    fn test_no_pruning_under_budget() {
        let window = window(6000);
        let msgs = history(10, 500);
        assert_eq!(window.prune_count(&msgs), 0);
        assert_eq!(window.prune(&msgs).len(), 10);
    }

    #[test]
    fn test_prune_drops_oldest_until_within_budget() {
        let window = window(6000);
        let msgs = history(10, 900); // 9000 tokens

        let pruned = window.prune(&msgs);
        assert_eq!(pruned.len(), 6); // 5400 tokens
        assert!(estimate_messages(&pruned) <= 6000);
        assert_eq!(pruned[0].content, msgs[4].content);
    }

    #[test]
    fn test_prune_respects_floor() {
        let window = window(100);
        let msgs = history(8, 1000);

        let pruned = window.prune(&msgs);
        assert_eq!(pruned.len(), 2);
        assert_eq!(pruned[1].content, msgs[7].content);
    }

    #[test]
    fn test_prune_ignores_short_conversations() {
        let window = window(100);
        let msgs = history(2, 1000);
        assert_eq!(window.prune(&msgs).len(), 2);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let window = window(6000);
        for (count, size) in [(10, 900), (8, 5000), (3, 100), (40, 160)] {
            let msgs = history(count, size);
            let once = window.prune(&msgs);
            let twice = window.prune(&once);
            assert_eq!(once.len(), twice.len());
            assert_eq!(window.prune_count(&once), 0);
        }
    }
}
