/// CoursePilot centralized constants.
/// Defaults for everything `Settings` can override live here.

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
    pub const BASE_URL_ENV: &str = "COURSEPILOT_API_URL";

    pub const CHAT: &str = "/api/chat";
    pub const CHATS: &str = "/api/chats";
    pub const PLANNER_GENERATE: &str = "/api/ai-planner/generate";
    pub const SUMMARIZE: &str = "/api/ai/summarize";

    pub fn chat_messages(chat_id: &str) -> String {
        format!("{CHATS}/{chat_id}/messages")
    }

    pub fn chat(chat_id: &str) -> String {
        format!("{CHATS}/{chat_id}")
    }
}

// ─── Timeouts ─────────────────────────────────────────────────────────────────

pub mod timeouts {
    /// Regular REST calls.
    pub const REQUEST_TIMEOUT_MS: u64 = 30_000;
    /// Long-running AI generation (study plans).
    pub const GENERATION_TIMEOUT_MS: u64 = 120_000;
}

// ─── Context Window ───────────────────────────────────────────────────────────

pub mod context {
    pub const CHARS_PER_TOKEN: usize = 4;
    pub const MAX_CONTEXT_TOKENS: usize = 16_000;
    /// Share of the window kept free for the model's reply.
    pub const RESPONSE_RESERVE: f64 = 0.25;
    /// Outbound context may use at most this share of the available input tokens.
    pub const SAFETY_FACTOR: f64 = 0.8;
    /// Pruning only kicks in once a conversation has this many messages.
    pub const PRUNE_MIN_MESSAGES: usize = 3;
    /// Pruning never goes below this many messages.
    pub const PRUNE_FLOOR: usize = 2;
}

// ─── Planner ──────────────────────────────────────────────────────────────────

pub mod planner {
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_DELAY_MS: u64 = 3_000;
}

// ─── Chat UI text ─────────────────────────────────────────────────────────────

pub mod messages {
    pub const DELETE_FAILED: &str = "Failed to delete chat. Please try again.";
    pub const NEW_CHAT_TITLE: &str = "New chat";
    pub const PREVIEW_CHARS: usize = 80;
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "coursepilot";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const TOKEN_ENV: &str = "COURSEPILOT_TOKEN";
}
