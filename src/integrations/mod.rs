//! External collaborator clients.
//!
//! Each integration exposes `is_configured()` and a small set of domain
//! operations. Callers check configuration first and treat every failure as
//! a non-fatal, reported string — an integration can never take a request
//! down.

pub mod github;
pub mod notion;
pub mod telegram;

pub use github::GithubClient;
pub use notion::NotionClient;
pub use telegram::TelegramNotifier;

use crate::config::IntegrationsConfig;

/// All integration clients, built once from config and shared.
pub struct Integrations {
    pub github: GithubClient,
    pub notion: NotionClient,
    pub telegram: TelegramNotifier,
}

impl Integrations {
    pub fn from_config(config: &IntegrationsConfig) -> Self {
        Self {
            github: GithubClient::new(config.github_token.clone(), config.github_username.clone()),
            notion: NotionClient::new(
                config.notion_api_key.clone(),
                config.notion_daily_log_db.clone(),
            ),
            telegram: TelegramNotifier::new(
                config.telegram_bot_token.clone(),
                config.telegram_chat_id.clone(),
            ),
        }
    }
}
