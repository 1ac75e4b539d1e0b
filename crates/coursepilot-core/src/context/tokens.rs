use crate::api::Message;
use crate::constants::context::CHARS_PER_TOKEN;

/// Rough token count: one token per four characters, rounded up.
///
/// This is not a tokenizer. It only has to be cheap, deterministic and
/// monotonic in the length of `text`, because every budgeting decision in
/// the context window is made against it.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Sum of [`estimate_tokens`] over the message bodies.
pub fn estimate_messages(messages: &[Message]) -> usize {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}
