mod common;
use common::{client, client_with};

use async_trait::async_trait;
use mockito::{Mock, Server, ServerGuard};
use restfeed::constants::messages;
use restfeed::{ClientConfig, FnHandler, LastPageFlag, PageHandler, PagedEnvelope, Pager, Record};
use serde_json::{json, Value};

#[derive(Default)]
struct Recorder {
    first_pages: usize,
    pages: Vec<(Vec<Value>, bool)>,
    completions: Vec<(bool, bool)>,
    events: Vec<&'static str>,
}

#[async_trait]
impl PageHandler for Recorder {
    async fn on_first_page(&mut self) {
        self.first_pages += 1;
        self.events.push("first");
    }

    async fn on_page(&mut self, results: &[Record], is_last_page: bool) {
        let ids = results.iter().map(|r| r["id"].clone()).collect();
        self.pages.push((ids, is_last_page));
        self.events.push("page");
    }

    async fn on_complete(&mut self, page: &PagedEnvelope) {
        self.completions.push((page.success(), page.is_last_page));
        self.events.push("complete");
    }
}

async fn page_mock(
    server: &mut ServerGuard,
    path: &str,
    previous: Option<&str>,
    next: Option<&str>,
    id: &str,
) -> Mock {
    let base = server.url();
    let link = |p: Option<&str>| p.map(|p| Value::String(format!("{}{}", base, p)));
    let body = json!({
        "count": 3,
        "previous": link(previous),
        "next": link(next),
        "results": [{"id": id}],
    });
    server
        .mock("GET", path)
        .match_header("authorization", "Token secret-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await
}

async fn three_page_feed(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        page_mock(server, "/items/p1", None, Some("/items/p2"), "a").await,
        page_mock(server, "/items/p2", Some("/items/p1"), Some("/items/p3"), "b").await,
        page_mock(server, "/items/p3", Some("/items/p2"), None, "c").await,
    ]
}

#[tokio::test]
async fn three_page_chain_fires_callbacks_in_order() {
    let mut server = Server::new_async().await;
    let mocks = three_page_feed(&mut server).await;
    let client = client();

    let mut recorder = Recorder::default();
    let run = Pager::new(&client)
        .run(
            &format!("{}/items/p1", server.url()),
            Some("secret-token"),
            &mut recorder,
        )
        .await;

    for mock in &mocks {
        mock.assert_async().await;
    }
    assert_eq!(run.pages, 3);
    assert!(run.success);
    assert!(run.reached_last_page);
    assert!(!run.truncated);

    assert_eq!(recorder.first_pages, 1);
    assert_eq!(
        recorder.pages,
        vec![
            (vec![json!("a")], false),
            (vec![json!("b")], false),
            (vec![json!("c")], true),
        ]
    );
    assert_eq!(
        recorder.completions,
        vec![(true, false), (true, false), (true, true)]
    );
    assert_eq!(
        recorder.events,
        vec!["first", "page", "complete", "page", "complete", "page", "complete"]
    );
    assert_eq!(client.activity().in_flight(), 0);
}

#[tokio::test]
async fn legacy_flag_reports_last_page_to_every_page_callback() {
    let mut server = Server::new_async().await;
    let _mocks = three_page_feed(&mut server).await;
    let client = client();

    let mut recorder = Recorder::default();
    Pager::new(&client)
        .last_page_flag(LastPageFlag::Legacy)
        .run(
            &format!("{}/items/p1", server.url()),
            Some("secret-token"),
            &mut recorder,
        )
        .await;

    assert!(recorder.pages.iter().all(|(_, last)| *last));
    assert_eq!(
        recorder.completions,
        vec![(true, false), (true, false), (true, true)]
    );
}

#[tokio::test]
async fn failed_page_ends_the_chain() {
    let mut server = Server::new_async().await;
    let _first = page_mock(&mut server, "/items/p1", None, Some("/items/p2"), "a").await;
    server
        .mock("GET", "/items/p2")
        .with_status(500)
        .with_body(r#"{"detail":"boom","error_code":"E500"}"#)
        .create_async()
        .await;
    let client = client();

    let mut recorder = Recorder::default();
    let run = Pager::new(&client)
        .run(
            &format!("{}/items/p1", server.url()),
            Some("secret-token"),
            &mut recorder,
        )
        .await;

    assert_eq!(run.pages, 2);
    assert!(!run.success);
    assert!(!run.reached_last_page);
    assert_eq!(recorder.first_pages, 1);
    assert_eq!(recorder.pages[1], (Vec::new(), true));
    assert_eq!(recorder.completions, vec![(true, false), (false, true)]);
}

#[tokio::test]
async fn first_page_callback_skipped_when_first_request_fails() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/items/p1")
        .with_status(401)
        .with_body(r#"{"detail":"Invalid token."}"#)
        .create_async()
        .await;
    let client = client();

    let mut recorder = Recorder::default();
    let run = Pager::new(&client)
        .run(&format!("{}/items/p1", server.url()), None, &mut recorder)
        .await;

    assert_eq!(run.pages, 1);
    assert_eq!(recorder.first_pages, 0);
    assert_eq!(recorder.completions, vec![(false, true)]);
}

#[tokio::test]
async fn page_cap_stops_before_last_page() {
    let mut server = Server::new_async().await;
    let _p1 = page_mock(&mut server, "/items/p1", None, Some("/items/p2"), "a").await;
    let _p2 = page_mock(&mut server, "/items/p2", Some("/items/p1"), Some("/items/p3"), "b").await;
    let p3 = server
        .mock("GET", "/items/p3")
        .expect(0)
        .create_async()
        .await;
    let client = client_with(ClientConfig::new().with_max_pages(Some(2)));

    let mut recorder = Recorder::default();
    let run = Pager::new(&client)
        .run(
            &format!("{}/items/p1", server.url()),
            Some("secret-token"),
            &mut recorder,
        )
        .await;

    p3.assert_async().await;
    assert_eq!(run.pages, 2);
    assert!(run.truncated);
    assert!(!run.reached_last_page);
    assert_eq!(run.next, Some(format!("{}/items/p3", server.url())));
    assert_eq!(recorder.completions.last(), Some(&(true, false)));
}

#[tokio::test]
async fn collect_gathers_every_page() {
    let mut server = Server::new_async().await;
    let _mocks = three_page_feed(&mut server).await;
    let client = client();

    let records = Pager::new(&client)
        .collect(&format!("{}/items/p1", server.url()), Some("secret-token"))
        .await
        .expect("all pages succeed");

    let ids: Vec<&str> = records.iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn collect_returns_first_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/items/p1")
        .with_status(404)
        .with_body("not json")
        .create_async()
        .await;
    let client = client();

    let failure = Pager::new(&client)
        .collect(&format!("{}/items/p1", server.url()), None)
        .await
        .unwrap_err();

    assert!(!failure.success);
    assert_eq!(failure.message, messages::UNKNOWN_ERROR);
    assert_eq!(failure.status_code, Some(404));
}

#[tokio::test]
async fn closure_handler_receives_pages() {
    let mut server = Server::new_async().await;
    let _mocks = three_page_feed(&mut server).await;
    let client = client();

    let mut first_pages = 0;
    let mut seen = Vec::new();
    let mut last_flags = Vec::new();
    {
        let mut handler = FnHandler::new(
            || first_pages += 1,
            |results: &[Record], _| seen.extend(results.iter().map(|r| r["id"].clone())),
            |page: &PagedEnvelope| last_flags.push(page.is_last_page),
        );
        Pager::new(&client)
            .run(
                &format!("{}/items/p1", server.url()),
                Some("secret-token"),
                &mut handler,
            )
            .await;
    }

    assert_eq!(first_pages, 1);
    assert_eq!(seen, vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(last_flags, vec![false, false, true]);
}
