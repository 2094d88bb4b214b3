use crate::constants::fields;
use crate::managers::executor::FeedClient;
use crate::models::{FeedRequest, PagedEnvelope, Record, ResponseEnvelope};
use crate::services::logger::Logger;
use crate::utils::redact::redact_feed;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Which last-page flag `PageHandler::on_page` receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LastPageFlag {
    /// The page's real position: `false` whenever a `next` link follows.
    #[default]
    Accurate,
    /// Always `true`, as older callers of the three-callback pager observed.
    /// `on_complete` still carries the real value.
    Legacy,
}

/// Receives pages as the pager walks a feed.
#[async_trait]
pub trait PageHandler: Send {
    /// Called once, for the page that has no `previous` link.
    async fn on_first_page(&mut self) {}

    async fn on_page(&mut self, results: &[Record], is_last_page: bool);

    /// Called after `on_page` for every fetched page, including failed ones.
    async fn on_complete(&mut self, _page: &PagedEnvelope) {}
}

/// Summary of one pager run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRun {
    pub pages: usize,
    /// True when every fetched page succeeded.
    pub success: bool,
    /// The final page succeeded and carried no `next` link.
    pub reached_last_page: bool,
    /// The page cap stopped the run while a `next` link was still pending.
    pub truncated: bool,
    pub next: Option<String>,
}

/// The paging fields of one envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLinks {
    pub results: Vec<Record>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl PageLinks {
    /// Reads `results`, `next` and `previous` from the first record of the
    /// response, which holds the paging wrapper.
    pub fn from_envelope(envelope: &ResponseEnvelope) -> Self {
        let Some(wrapper) = envelope.first() else {
            return Self::default();
        };
        let results = wrapper
            .get(fields::RESULTS)
            .and_then(Value::as_array)
            .filter(|items| items.iter().all(Value::is_object))
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            results,
            next: string_field(wrapper, fields::NEXT),
            previous: string_field(wrapper, fields::PREVIOUS),
        }
    }
}

fn string_field(record: &Record, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Follows `next` links from a feed, one page at a time.
pub struct Pager<'a> {
    client: &'a FeedClient,
    last_page_flag: LastPageFlag,
    max_pages: Option<usize>,
    logger: Logger,
}

impl<'a> Pager<'a> {
    pub fn new(client: &'a FeedClient) -> Self {
        Self {
            client,
            last_page_flag: LastPageFlag::default(),
            max_pages: client.config().max_pages,
            logger: client.logger().child("pager"),
        }
    }

    pub fn last_page_flag(mut self, flag: LastPageFlag) -> Self {
        self.last_page_flag = flag;
        self
    }

    pub fn max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Walks the feed until a page without `next`, the page cap, or a failed
    /// page ends the chain. Pages are fetched strictly one after another.
    pub async fn run<H>(&self, feed: &str, token: Option<&str>, handler: &mut H) -> PageRun
    where
        H: PageHandler + ?Sized,
    {
        let mut feed = feed.to_string();
        let mut pages = 0usize;
        let mut success = true;
        let mut first_page_seen = false;

        loop {
            let request = FeedRequest::get(feed.as_str())
                .with_optional_token(token.map(str::to_string));
            let response = self.client.fetch(&request).await;
            pages += 1;
            success &= response.success;

            let links = PageLinks::from_envelope(&response);
            if links.previous.is_none() && response.success && !first_page_seen {
                first_page_seen = true;
                handler.on_first_page().await;
            }

            let is_last_page = links.next.is_none();
            let on_page_flag = match self.last_page_flag {
                LastPageFlag::Accurate => is_last_page,
                LastPageFlag::Legacy => true,
            };
            handler.on_page(&links.results, on_page_flag).await;

            let page_succeeded = response.success;
            let page = PagedEnvelope {
                response,
                is_last_page,
            };
            handler.on_complete(&page).await;

            let Some(next) = links.next else {
                return PageRun {
                    pages,
                    success,
                    reached_last_page: page_succeeded,
                    truncated: false,
                    next: None,
                };
            };

            if self.max_pages.is_some_and(|max| pages >= max) {
                self.logger.info(
                    "Page cap reached before the last page",
                    Some(&serde_json::json!({
                        "pages": pages,
                        "next": redact_feed(&next),
                    })),
                );
                return PageRun {
                    pages,
                    success,
                    reached_last_page: false,
                    truncated: true,
                    next: Some(next),
                };
            }

            self.logger.debug(
                "Following next page",
                Some(&serde_json::json!({"page": pages + 1, "feed": redact_feed(&next)})),
            );
            feed = next;
        }
    }

    /// Gathers every page's results. The first failed page ends the walk and
    /// is returned as the error.
    pub async fn collect(
        &self,
        feed: &str,
        token: Option<&str>,
    ) -> Result<Vec<Record>, ResponseEnvelope> {
        let mut collector = Collector::default();
        self.run(feed, token, &mut collector).await;
        match collector.failure {
            Some(failure) => Err(failure),
            None => Ok(collector.records),
        }
    }
}

#[derive(Default)]
struct Collector {
    records: Vec<Record>,
    failure: Option<ResponseEnvelope>,
}

#[async_trait]
impl PageHandler for Collector {
    async fn on_page(&mut self, results: &[Record], _is_last_page: bool) {
        if self.failure.is_none() {
            self.records.extend_from_slice(results);
        }
    }

    async fn on_complete(&mut self, page: &PagedEnvelope) {
        if !page.success() && self.failure.is_none() {
            self.failure = Some(page.response.clone());
        }
    }
}

/// Adapts three closures to `PageHandler`.
pub struct FnHandler<F, P, C> {
    on_first_page: F,
    on_page: P,
    on_complete: C,
}

impl<F, P, C> FnHandler<F, P, C>
where
    F: FnMut() + Send,
    P: FnMut(&[Record], bool) + Send,
    C: FnMut(&PagedEnvelope) + Send,
{
    pub fn new(on_first_page: F, on_page: P, on_complete: C) -> Self {
        Self {
            on_first_page,
            on_page,
            on_complete,
        }
    }
}

#[async_trait]
impl<F, P, C> PageHandler for FnHandler<F, P, C>
where
    F: FnMut() + Send,
    P: FnMut(&[Record], bool) + Send,
    C: FnMut(&PagedEnvelope) + Send,
{
    async fn on_first_page(&mut self) {
        (self.on_first_page)();
    }

    async fn on_page(&mut self, results: &[Record], is_last_page: bool) {
        (self.on_page)(results, is_last_page);
    }

    async fn on_complete(&mut self, page: &PagedEnvelope) {
        (self.on_complete)(page);
    }
}
