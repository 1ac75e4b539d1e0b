use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{ApiClient, HttpDispatcher, Planner};
use crate::constants::{context, endpoints, paths, planner, timeouts};
use crate::context::ContextWindow;
use crate::error::PilotError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub planner: PlannerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// Environment variable holding the bearer token.
    pub token_env: String,
    pub request_timeout_ms: u64,
    pub generation_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextSettings {
    pub max_context_tokens: usize,
    pub response_reserve: f64,
    pub safety_factor: f64,
    pub prune_min_messages: usize,
    pub prune_floor: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerSettings {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: endpoints::DEFAULT_BASE_URL.to_string(),
            token_env: paths::TOKEN_ENV.to_string(),
            request_timeout_ms: timeouts::REQUEST_TIMEOUT_MS,
            generation_timeout_ms: timeouts::GENERATION_TIMEOUT_MS,
        }
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_context_tokens: context::MAX_CONTEXT_TOKENS,
            response_reserve: context::RESPONSE_RESERVE,
            safety_factor: context::SAFETY_FACTOR,
            prune_min_messages: context::PRUNE_MIN_MESSAGES,
            prune_floor: context::PRUNE_FLOOR,
        }
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_retries: planner::MAX_RETRIES,
            retry_delay_ms: planner::RETRY_DELAY_MS,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Self {
        let mut settings = Self::load_from(&Self::config_path());
        if let Ok(url) = std::env::var(endpoints::BASE_URL_ENV) {
            if !url.is_empty() {
                settings.api.base_url = url;
            }
        }
        settings
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config file");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), PilotError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PilotError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| PilotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PilotError> {
        let ctx = &self.context;
        if ctx.max_context_tokens == 0 {
            return Err(PilotError::Config("context.max_context_tokens must be positive".into()));
        }
        if !(0.0..1.0).contains(&ctx.response_reserve) {
            return Err(PilotError::Config("context.response_reserve must be in [0, 1)".into()));
        }
        if !(ctx.safety_factor > 0.0 && ctx.safety_factor <= 1.0) {
            return Err(PilotError::Config("context.safety_factor must be in (0, 1]".into()));
        }
        if ctx.prune_floor >= ctx.prune_min_messages {
            return Err(PilotError::Config(
                "context.prune_floor must be smaller than context.prune_min_messages".into(),
            ));
        }
        if self.api.request_timeout_ms == 0 || self.api.generation_timeout_ms == 0 {
            return Err(PilotError::Config("api timeouts must be positive".into()));
        }
        if self.api.base_url.is_empty() {
            return Err(PilotError::Config("api.base_url is empty".into()));
        }
        Ok(())
    }

    /// Bearer token from the environment variable named in settings.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api.token_env).ok().filter(|t| !t.is_empty())
    }

    pub fn context_window(&self) -> ContextWindow {
        ContextWindow::new(&self.context)
    }

    /// Build an API client over HTTP from the current settings.
    pub fn build_api_client(&self) -> Result<ApiClient, PilotError> {
        self.validate()?;
        let mut dispatcher = HttpDispatcher::new(&self.api.base_url);
        match self.api_token() {
            Some(token) => dispatcher = dispatcher.with_token(token),
            None => tracing::warn!(env = %self.api.token_env, "no API token set; requests will fail"),
        }
        Ok(ApiClient::new(Arc::new(dispatcher), &self.api))
    }

    pub fn build_planner(&self) -> Result<Planner, PilotError> {
        Ok(Planner::new(self.build_api_client()?, &self.planner))
    }
}
