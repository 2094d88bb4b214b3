//! Request and response shapes shared by the executor, normalizer and pager.

use crate::constants::messages;
use crate::errors::FetchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One JSON object from a response body.
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = FetchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(FetchError::config(format!(
                "Unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Describes a single request against a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRequest {
    feed: String,
    method: HttpMethod,
    token: Option<String>,
    parameters: Option<Record>,
}

impl FeedRequest {
    pub fn new(feed: impl Into<String>) -> Self {
        Self {
            feed: feed.into(),
            method: HttpMethod::Get,
            token: None,
            parameters: None,
        }
    }

    pub fn get(feed: impl Into<String>) -> Self {
        Self::new(feed)
    }

    pub fn post(feed: impl Into<String>) -> Self {
        Self::new(feed).with_method(HttpMethod::Post)
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_record(mut self, parameters: Record) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Attaches any serializable value as the JSON body. The value must
    /// serialize to a JSON object.
    pub fn with_parameters<T: Serialize + ?Sized>(self, parameters: &T) -> Result<Self, FetchError> {
        match serde_json::to_value(parameters)? {
            Value::Object(map) => Ok(self.with_record(map)),
            other => Err(FetchError::serialization(format!(
                "Request parameters must serialize to a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn feed(&self) -> &str {
        &self.feed
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn parameters(&self) -> Option<&Record> {
        self.parameters.as_ref()
    }

    /// JSON encoding of the parameters. A string-keyed map always encodes, so
    /// encoding problems surface earlier from `with_parameters`.
    pub fn body(&self) -> Option<Vec<u8>> {
        self.parameters
            .as_ref()
            .map(|map| Value::Object(map.clone()).to_string().into_bytes())
    }
}

/// The normalized outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub message: String,
    pub results: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_code: Option<String>,
}

impl ResponseEnvelope {
    pub fn success(results: Vec<Record>, status_code: Option<u16>) -> Self {
        Self {
            success: true,
            message: messages::SUCCESSFUL.to_string(),
            results,
            status_code,
            error_code: None,
        }
    }

    pub fn failure(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            success: false,
            message: message.into(),
            results: Vec::new(),
            status_code,
            error_code: None,
        }
    }

    pub fn unknown_error(status_code: Option<u16>) -> Self {
        Self::failure(messages::UNKNOWN_ERROR, status_code)
    }

    pub fn with_error_code(mut self, error_code: Option<String>) -> Self {
        self.error_code = error_code;
        self
    }

    pub fn first(&self) -> Option<&Record> {
        self.results.first()
    }
}

/// One page of a paginated feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedEnvelope {
    #[serde(flatten)]
    pub response: ResponseEnvelope,
    pub is_last_page: bool,
}

impl PagedEnvelope {
    pub fn success(&self) -> bool {
        self.response.success
    }

    pub fn message(&self) -> &str {
        &self.response.message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response.status_code
    }

    pub fn error_code(&self) -> Option<&str> {
        self.response.error_code.as_deref()
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
