use crate::constants::{env as env_keys, network};
use crate::errors::FetchError;

/// Settings shared by every request a `FeedClient` issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Field names consulted in order to find an error message in a failure body.
    pub error_flags: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    /// Upper bound on pages fetched by one pager run. `None` follows `next` forever.
    pub max_pages: Option<usize>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            error_flags: Vec::new(),
            timeout_ms: Some(network::TIMEOUT_REQUEST_MS),
            connect_timeout_ms: Some(network::TIMEOUT_CONNECTION_MS),
            max_pages: None,
            user_agent: network::USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, FetchError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(env_keys::ERROR_FLAGS) {
            config.error_flags = parse_flags(&raw);
        }
        if let Some(ms) = read_env_number(env_keys::TIMEOUT_MS)? {
            config.timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(ms) = read_env_number(env_keys::CONNECT_TIMEOUT_MS)? {
            config.connect_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(pages) = read_env_number(env_keys::MAX_PAGES)? {
            config.max_pages = page_cap(pages)?;
        }
        Ok(config)
    }

    pub fn with_error_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.error_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn parse_flags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|flag| !flag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Zero means unbounded. Values past `usize::MAX` are a config error.
fn page_cap(pages: u64) -> Result<Option<usize>, FetchError> {
    if pages == 0 {
        return Ok(None);
    }
    usize::try_from(pages).map(Some).map_err(|_| {
        FetchError::config(format!(
            "{} must not exceed {}",
            env_keys::MAX_PAGES,
            usize::MAX
        ))
    })
}

fn read_env_number(key: &str) -> Result<Option<u64>, FetchError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| FetchError::config(format!("{} must be a non-negative integer", key)))
}
