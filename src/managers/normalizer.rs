use crate::constants::{fields, limits, messages, status};
use crate::models::{Record, ResponseEnvelope};
use crate::services::logger::Logger;
use crate::utils::redact::redact_text;
use crate::utils::text::body_preview;
use serde_json::Value;

/// What the transport handed back for one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportOutcome<'a> {
    pub body: Option<&'a [u8]>,
    pub status_code: Option<u16>,
    pub error: Option<&'a str>,
}

/// Turns raw transport output into a `ResponseEnvelope`.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    error_flags: Vec<String>,
    logger: Logger,
}

impl ResponseNormalizer {
    pub fn new(error_flags: Vec<String>, logger: Logger) -> Self {
        Self {
            error_flags,
            logger: logger.child("normalizer"),
        }
    }

    pub fn error_flags(&self) -> &[String] {
        &self.error_flags
    }

    pub fn normalize(&self, outcome: TransportOutcome<'_>) -> ResponseEnvelope {
        let status_code = outcome.status_code;

        let Some(body) = outcome.body else {
            self.logger.warn(
                "Response carried no body",
                Some(&serde_json::json!({
                    "status": status_code,
                    "transport_error": outcome.error,
                })),
            );
            return ResponseEnvelope::unknown_error(status_code);
        };

        if let Some(code) = status_code {
            if status::DUMP_BODY_CODES.contains(&code) {
                self.logger.warn(
                    &format!("HTTP {} response body", code),
                    Some(&Value::String(redact_text(&body_preview(
                        body,
                        limits::LOG_BODY_BYTES,
                    )))),
                );
            }
        }

        if is_success(status_code, outcome.error) {
            self.success_envelope(body, status_code)
        } else {
            self.failure_envelope(body, status_code, outcome.error)
        }
    }

    fn success_envelope(&self, body: &[u8], status_code: Option<u16>) -> ResponseEnvelope {
        if body.iter().all(u8::is_ascii_whitespace) {
            return ResponseEnvelope::success(Vec::new(), status_code);
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(parsed) => ResponseEnvelope::success(records_from(parsed), status_code),
            Err(err) => {
                self.logger.error(
                    "Failed to parse successful response body",
                    Some(&serde_json::json!({"status": status_code, "error": err.to_string()})),
                );
                ResponseEnvelope::unknown_error(status_code)
            }
        }
    }

    fn failure_envelope(
        &self,
        body: &[u8],
        status_code: Option<u16>,
        transport_error: Option<&str>,
    ) -> ResponseEnvelope {
        let parsed = match serde_json::from_slice::<Value>(body) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.logger.error(
                    "Failed to parse error response body",
                    Some(&serde_json::json!({
                        "status": status_code,
                        "transport_error": transport_error,
                        "error": err.to_string(),
                    })),
                );
                return ResponseEnvelope::unknown_error(status_code);
            }
        };

        let object = parsed.as_object();
        let message = object
            .and_then(|map| error_message(map, &self.error_flags))
            .unwrap_or_else(|| messages::UNKNOWN_ERROR.to_string());
        if message == messages::UNKNOWN_ERROR {
            self.logger.debug(
                "No configured error flag matched the response body",
                Some(&serde_json::json!({"status": status_code, "flags": self.error_flags})),
            );
        }
        let error_code = object
            .and_then(|map| map.get(fields::ERROR_CODE))
            .and_then(Value::as_str)
            .map(str::to_string);

        ResponseEnvelope::failure(message, status_code).with_error_code(error_code)
    }
}

pub fn is_success(status_code: Option<u16>, transport_error: Option<&str>) -> bool {
    transport_error.is_none()
        && status_code.is_some_and(|code| status::SUCCESS_CODES.contains(&code))
}

/// Scans `flags` in order; the first flag holding a string, or a list whose
/// first element is a string, supplies the message.
pub fn error_message(body: &Record, flags: &[String]) -> Option<String> {
    flags.iter().find_map(|flag| match body.get(flag)? {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => items.first()?.as_str().map(str::to_string),
        _ => None,
    })
}

fn records_from(parsed: Value) -> Vec<Record> {
    match parsed {
        Value::Object(map) => vec![map],
        Value::Array(items) if items.iter().all(Value::is_object) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
