//! JSON REST client that normalizes every response into a fixed envelope
//! shape and walks `next`-linked feeds page by page.

pub mod config;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod models;
pub mod services;
pub mod utils;

pub use config::ClientConfig;
pub use errors::{FetchError, FetchErrorKind};
pub use managers::executor::FeedClient;
pub use managers::pager::{FnHandler, LastPageFlag, PageHandler, PageRun, Pager};
pub use models::{FeedRequest, HttpMethod, PagedEnvelope, Record, ResponseEnvelope};
