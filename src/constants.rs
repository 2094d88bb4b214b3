pub mod messages {
    pub const UNKNOWN_ERROR: &str = "Unknown error occurred";
    pub const SUCCESSFUL: &str = "Successful";
    pub const CANNOT_CONNECT: &str = "Couldn't connect to the server";
}

pub mod status {
    /// Status codes treated as success when no transport error occurred.
    pub const SUCCESS_CODES: &[u16] = &[200, 201, 202, 204, 304];
    /// Status codes whose raw body is dumped to the log.
    pub const DUMP_BODY_CODES: &[u16] = &[400, 500];
}

pub mod fields {
    pub const ERROR_CODE: &str = "error_code";
    pub const RESULTS: &str = "results";
    pub const NEXT: &str = "next";
    pub const PREVIOUS: &str = "previous";
}

pub mod headers {
    pub const TOKEN_SCHEME: &str = "Token";
    pub const JSON_CONTENT_TYPE: &str = "application/json";
    pub const NO_CACHE: &str = "no-cache";
}

pub mod network {
    pub const TIMEOUT_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_CONNECTION_MS: u64 = 5_000;
    pub const USER_AGENT: &str = concat!("restfeed/", env!("CARGO_PKG_VERSION"));
}

pub mod limits {
    pub const LOG_BODY_BYTES: usize = 4 * 1024;
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http:", "https:"];
}

pub mod env {
    pub const ERROR_FLAGS: &str = "RESTFEED_ERROR_FLAGS";
    pub const TIMEOUT_MS: &str = "RESTFEED_TIMEOUT_MS";
    pub const CONNECT_TIMEOUT_MS: &str = "RESTFEED_CONNECT_TIMEOUT_MS";
    pub const MAX_PAGES: &str = "RESTFEED_MAX_PAGES";
    pub const LOG_LEVEL: &str = "RESTFEED_LOG_LEVEL";
}
