#![allow(dead_code)]

use once_cell::sync::Lazy;
use restfeed::services::logger::{LogLevel, Logger};
use restfeed::{ClientConfig, FeedClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const ERROR_FLAGS: &[&str] = &["detail", "non_field_errors", "error"];

pub fn client() -> FeedClient {
    client_with(ClientConfig::new())
}

pub fn client_with(config: ClientConfig) -> FeedClient {
    let config = if config.error_flags.is_empty() {
        config.with_error_flags(ERROR_FLAGS.iter().copied())
    } else {
        config
    };
    FeedClient::with_logger(config, Logger::with_level("test", LogLevel::Error))
        .expect("client builds")
}

/// A one-shot HTTP server that accepts a single request and answers only
/// after `release` fires.
pub struct HeldServer {
    pub url: String,
    pub accepted: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

pub async fn held_server(status_line: &'static str, body: &'static str) -> HeldServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (accepted_tx, accepted_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let _ = accepted_tx.send(());
        let _ = release_rx.await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    HeldServer {
        url: format!("http://{}/feed/", addr),
        accepted: accepted_rx,
        release: release_tx,
    }
}

/// A URL on localhost where nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/feed/", addr)
}
