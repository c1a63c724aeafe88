use anyhow::{bail, Context};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MIN_MAX_TOKENS: u32 = 2;
const MAX_MAX_TOKENS: u32 = 8192;
const MAX_FIELD_LEN: usize = 256;

/// Immutable chat configuration, loaded once and validated before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base endpoint, e.g. "https://api.openai.com/".
    pub base_uri: String,

    /// Route fragment joined onto the base, e.g. "v1/chat/completions".
    pub chat_completions_url_fragment: String,

    pub model: String,

    /// Role attached to the outbound question message.
    pub role: String,

    pub max_tokens: u32,

    /// Request streamed responses.
    pub stream: bool,

    /// Ordered wait intervals (milliseconds) for transient-failure retries.
    pub retry_wait_ms: Vec<u64>,
}

impl ChatConfig {
    /// Load config if the file exists, otherwise return Ok(None).
    /// A loaded config is validated before being handed back.
    pub fn load_optional(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("failed to read config: {}", path.display()))
            }
        };

        let s = String::from_utf8(bytes).context("config is not valid UTF-8")?;
        let cfg: ChatConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(Some(cfg))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.base_url()?;

        let fragment = &self.chat_completions_url_fragment;
        if fragment.len() < 2 || fragment.len() > MAX_FIELD_LEN {
            bail!("chat_completions_url_fragment must be 2..=256 characters");
        }
        let mut chars = fragment.chars();
        if !chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            || !chars.all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '-')
        {
            bail!(
                "chat_completions_url_fragment must start with a letter \
                 followed by letters, digits, '/' or '-'"
            );
        }

        if self.model.is_empty() || self.model.len() > MAX_FIELD_LEN {
            bail!("model must be 1..=256 characters");
        }
        if !self
            .model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            bail!("model may only contain letters, digits, '-' or '.'");
        }

        if self.role.is_empty() || self.role.len() > MAX_FIELD_LEN {
            bail!("role must be 1..=256 characters");
        }
        if !self
            .role
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            bail!("role may only contain letters, digits or '-'");
        }

        if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&self.max_tokens) {
            bail!("max_tokens must be within {MIN_MAX_TOKENS}..={MAX_MAX_TOKENS}");
        }

        if self.retry_wait_ms.is_empty() {
            bail!("retry_wait_ms must list at least one wait interval");
        }

        Ok(())
    }

    pub fn base_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.base_uri)
            .with_context(|| format!("base_uri is not a valid URL: {}", self.base_uri))
    }

    pub fn retry_waits(&self) -> Vec<Duration> {
        self.retry_wait_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}
