use crate::config::ClientConfig;
use crate::constants::{headers, messages, protocols::ALLOWED_HTTP};
use crate::errors::FetchError;
use crate::managers::normalizer::{ResponseNormalizer, TransportOutcome};
use crate::models::{FeedRequest, HttpMethod, Record, ResponseEnvelope};
use crate::services::activity::ActivityTracker;
use crate::services::logger::Logger;
use crate::utils::redact::redact_feed;
use once_cell::sync::OnceCell;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

static SHARED: OnceCell<FeedClient> = OnceCell::new();

/// Issues JSON requests against feeds and normalizes every outcome into a
/// `ResponseEnvelope`.
///
/// Cloning is cheap: clones share the HTTP connection pool and the activity
/// tracker.
#[derive(Clone)]
pub struct FeedClient {
    client: Client,
    config: ClientConfig,
    normalizer: ResponseNormalizer,
    activity: ActivityTracker,
    logger: Logger,
}

impl FeedClient {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        Self::with_logger(config, Logger::new("restfeed"))
    }

    pub fn with_logger(config: ClientConfig, logger: Logger) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = config.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|err| FetchError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self::from_parts(client, config, logger))
    }

    /// Wraps an already configured `reqwest::Client`. Timeouts and user agent
    /// in `config` are ignored in favour of the client's own settings.
    pub fn from_parts(client: Client, config: ClientConfig, logger: Logger) -> Self {
        let logger = logger.child("executor");
        Self {
            client,
            normalizer: ResponseNormalizer::new(config.error_flags.clone(), logger.clone()),
            config,
            activity: ActivityTracker::new(),
            logger,
        }
    }

    /// Process-wide client configured from the environment on first use.
    pub fn shared() -> Result<&'static FeedClient, FetchError> {
        SHARED.get_or_try_init(|| FeedClient::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn fetch_data(
        &self,
        feed: &str,
        token: Option<&str>,
        parameters: Option<Record>,
        method: HttpMethod,
    ) -> ResponseEnvelope {
        let mut request = FeedRequest::new(feed).with_method(method);
        if let Some(token) = token {
            request = request.with_token(token);
        }
        if let Some(parameters) = parameters {
            request = request.with_record(parameters);
        }
        self.fetch(&request).await
    }

    /// Dispatches the request on the runtime and returns immediately.
    pub fn spawn(&self, request: FeedRequest) -> tokio::task::JoinHandle<ResponseEnvelope> {
        let client = self.clone();
        tokio::spawn(async move { client.fetch(&request).await })
    }

    pub async fn fetch(&self, request: &FeedRequest) -> ResponseEnvelope {
        let url = match parse_feed(request.feed()) {
            Ok(url) => url,
            Err(err) => {
                self.logger.warn(
                    "Rejected malformed feed",
                    Some(&serde_json::json!({
                        "feed": redact_feed(request.feed()),
                        "error": err.message,
                    })),
                );
                return ResponseEnvelope::failure(messages::CANNOT_CONNECT, None);
            }
        };

        let body = request.body();

        let mut builder = self
            .client
            .request(request.method().into(), url)
            .header(CACHE_CONTROL, headers::NO_CACHE);
        if let Some(token) = request.token() {
            builder = builder.header(
                AUTHORIZATION,
                format!("{} {}", headers::TOKEN_SCHEME, token),
            );
        }
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, headers::JSON_CONTENT_TYPE)
                .header(CONTENT_LENGTH, body.len())
                .body(body);
        }

        let guard = self.activity.begin();
        let started = Instant::now();
        let envelope = match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.bytes().await {
                    Ok(bytes) => self.normalizer.normalize(TransportOutcome {
                        body: Some(&bytes),
                        status_code: Some(status),
                        error: None,
                    }),
                    Err(err) => {
                        let err = FetchError::from(err);
                        self.normalizer.normalize(TransportOutcome {
                            body: None,
                            status_code: Some(status),
                            error: Some(&err.message),
                        })
                    }
                }
            }
            Err(err) => {
                let status = err.status().map(|s| s.as_u16());
                let err = FetchError::from(err);
                self.logger.warn(
                    "Transport error",
                    Some(&serde_json::json!({
                        "feed": redact_feed(request.feed()),
                        "kind": err.kind,
                        "error": err.message,
                    })),
                );
                self.normalizer.normalize(TransportOutcome {
                    body: None,
                    status_code: status,
                    error: Some(&err.message),
                })
            }
        };
        drop(guard);

        self.logger.debug(
            "Request completed",
            Some(&serde_json::json!({
                "method": request.method().as_str(),
                "feed": redact_feed(request.feed()),
                "status": envelope.status_code,
                "success": envelope.success,
                "duration_ms": started.elapsed().as_millis() as u64,
            })),
        );
        envelope
    }
}

pub fn parse_feed(raw: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(raw.trim()).map_err(|err| FetchError::invalid_url(err.to_string()))?;
    if !scheme_allowed(parsed.scheme()) {
        return Err(FetchError::invalid_url(
            "Only http/https URLs are supported",
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::invalid_url("URL has no host"));
    }
    Ok(parsed)
}

fn scheme_allowed(scheme: &str) -> bool {
    let normalized = scheme.trim_end_matches(':');
    ALLOWED_HTTP
        .iter()
        .any(|allowed| allowed.trim_end_matches(':') == normalized)
}
