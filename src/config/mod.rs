use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::services::resolver::DecisionTokens;

/// Fixed production endpoint of the file-processing backend.
pub const DEFAULT_BACKEND_URL: &str = "https://telegrambot-eljv.onrender.com/process-file";

/// Generous default so large files on slow backends make it through.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 120;

/// Constant tag identifying this caller to the backend.
pub const DEFAULT_SOURCE_TAG: &str = "bot";

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot authentication token (required secret).
    pub telegram_token: String,

    /// Where uploads are POSTed.
    pub backend_url: Url,

    /// Value of the multipart `source` field.
    pub source_tag: String,

    /// Client-wide timeout for one upload attempt.
    pub upload_timeout: Duration,

    /// Recognized duplicate-decision literals.
    pub tokens: DecisionTokens,
}

impl BotConfig {
    /// Load configuration from environment variables. Only the Telegram
    /// token is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN is not set")?;

        let backend_url =
            env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let backend_url = Url::parse(&backend_url)
            .with_context(|| format!("BACKEND_URL is not a valid URL: {backend_url}"))?;

        let upload_timeout = env::var("UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS));

        let source_tag = env::var("SOURCE_TAG").unwrap_or_else(|_| DEFAULT_SOURCE_TAG.to_string());

        Ok(Self {
            telegram_token,
            backend_url,
            source_tag,
            upload_timeout,
            tokens: DecisionTokens::from_env(),
        })
    }
}
