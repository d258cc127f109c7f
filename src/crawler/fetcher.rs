//! HTTP fetcher implementation
//!
//! This module handles every request the crawler makes:
//! - Building the shared HTTP client with the configured user agent
//! - The `Transport` capability that actually sends a request
//! - Enforcing the per-request timeout over send and body read
//! - Classifying responses into pages, not-found, and network errors
//! - Decoding bodies, strictly first and permissively as a fallback

use crate::config::UserAgentConfig;
use crate::FetchError;
use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Raw response handed back by a transport
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Capability to send one GET request
///
/// Implementations hold no per-request state and are shared by every task of
/// a run.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<TransportResponse, FetchError>>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout, also enforced by [`DocumentFetcher`]
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn classify(&self, url: &Url, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if error.is_connect() {
            FetchError::Transport {
                url: url.to_string(),
                message: format!("Connection failed: {}", error),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<TransportResponse, FetchError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| self.classify(url, e))?;

            let status = response.status();

            // Not-found and error bodies are never parsed
            if !status.is_success() {
                return Ok(TransportResponse {
                    status: status.as_u16(),
                    body: Vec::new(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| self.classify(url, e))?;

            Ok(TransportResponse {
                status: status.as_u16(),
                body: body.to_vec(),
            })
        })
    }
}

/// A fetched page, ready to be queried
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    body: String,
    degraded: bool,
}

impl Page {
    /// Builds a page from an already decoded body
    pub fn from_html(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
            degraded: false,
        }
    }

    /// Decodes a raw body as UTF-8, falling back to lossy decoding
    ///
    /// The fallback is best-effort and never fails; the page is flagged as
    /// degraded instead.
    pub fn from_bytes(url: Url, bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(body) => Self {
                url,
                body,
                degraded: false,
            },
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    valid_up_to = e.utf8_error().valid_up_to(),
                    "Body is not valid UTF-8, decoding permissively"
                );
                let body = String::from_utf8_lossy(e.as_bytes()).into_owned();
                Self {
                    url,
                    body,
                    degraded: true,
                }
            }
        }
    }

    /// The URL the page was requested from
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns true if the body needed the permissive decoder
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Parses the body into a queryable document
    ///
    /// The returned document is not `Send`; query it and drop it before the
    /// next await point.
    pub fn document(&self) -> Html {
        let document = Html::parse_document(&self.body);
        if !document.errors.is_empty() {
            tracing::trace!(
                url = %self.url,
                errors = document.errors.len(),
                "Markup parsed with recoverable errors"
            );
        }
        document
    }

    /// All text content of the page, one text node per line
    pub fn text(&self) -> String {
        let document = self.document();
        let text = document.root_element().text().collect::<Vec<_>>().join("\n");
        text
    }
}

/// Fetches documents through a transport with a hard per-request timeout
#[derive(Clone)]
pub struct DocumentFetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl DocumentFetcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues exactly one request for `url`
    ///
    /// # Response Mapping
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Ok(Page)` |
    /// | 404 | `Err(NotFound)` (terminal) |
    /// | other status | `Err(Status)` |
    /// | timeout elapsed | `Err(Timeout)` |
    /// | transport failure | `Err(Transport)` |
    pub async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        tracing::trace!(url = %url, "Fetching");

        let response = match tokio::time::timeout(self.timeout, self.transport.send(url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        };

        let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(Page::from_bytes(url.clone(), response.body))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// One scripted reaction of [`ScriptedTransport`]
    #[derive(Debug, Clone)]
    pub(crate) enum Reply {
        Html(String),
        Bytes(Vec<u8>),
        Status(u16),
        Fail,
        Hang,
    }

    /// In-memory transport: per-URL queues of replies, the last one repeats
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<HashMap<String, Vec<Reply>>>,
        hits: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        latency: Option<Duration>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_latency(latency: Duration) -> Self {
            Self {
                latency: Some(latency),
                ..Self::default()
            }
        }

        pub(crate) fn on(&self, url: &str, replies: Vec<Reply>) {
            self.replies
                .lock()
                .unwrap()
                .insert(url.to_string(), replies);
        }

        pub(crate) fn hits(&self, url: &str) -> usize {
            self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        pub(crate) fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }

        fn next_reply(&self, url: &str) -> Reply {
            let hit = {
                let mut hits = self.hits.lock().unwrap();
                let counter = hits.entry(url.to_string()).or_insert(0);
                *counter += 1;
                *counter - 1
            };
            let replies = self.replies.lock().unwrap();
            match replies.get(url) {
                Some(queue) if !queue.is_empty() => queue[hit.min(queue.len() - 1)].clone(),
                _ => Reply::Status(404),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send<'a>(
            &'a self,
            url: &'a Url,
        ) -> BoxFuture<'a, Result<TransportResponse, FetchError>> {
            Box::pin(async move {
                let reply = self.next_reply(url.as_str());

                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
                if let Some(latency) = self.latency {
                    tokio::time::sleep(latency).await;
                }
                if matches!(reply, Reply::Hang) {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                match reply {
                    Reply::Html(body) => Ok(TransportResponse {
                        status: 200,
                        body: body.into_bytes(),
                    }),
                    Reply::Bytes(body) => Ok(TransportResponse { status: 200, body }),
                    Reply::Status(status) => Ok(TransportResponse {
                        status,
                        body: Vec::new(),
                    }),
                    Reply::Fail | Reply::Hang => Err(FetchError::Transport {
                        url: url.to_string(),
                        message: "connection reset".to_string(),
                    }),
                }
            })
        }
    }

    fn fetcher(transport: ScriptedTransport) -> DocumentFetcher {
        DocumentFetcher::new(Arc::new(transport), Duration::from_millis(200))
    }

    fn url(path: &str) -> Url {
        Url::parse("https://example.com/").unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let transport = ScriptedTransport::new();
        transport.on(
            "https://example.com/page",
            vec![Reply::Html("<html><body>hello</body></html>".to_string())],
        );

        let page = fetcher(transport).fetch(&url("page")).await.unwrap();
        assert_eq!(page.url().as_str(), "https://example.com/page");
        assert!(page.body().contains("hello"));
        assert!(!page.is_degraded());
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let transport = ScriptedTransport::new();
        transport.on("https://example.com/gone", vec![Reply::Status(404)]);

        let result = fetcher(transport).fetch(&url("gone")).await;
        assert!(matches!(result, Err(FetchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let transport = ScriptedTransport::new();
        transport.on("https://example.com/broken", vec![Reply::Status(503)]);

        let result = fetcher(transport).fetch(&url("broken")).await;
        assert!(matches!(
            result,
            Err(FetchError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        let transport = ScriptedTransport::new();
        transport.on("https://example.com/reset", vec![Reply::Fail]);

        let result = fetcher(transport).fetch(&url("reset")).await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let transport = ScriptedTransport::new();
        transport.on("https://example.com/slow", vec![Reply::Hang]);

        let result = fetcher(transport).fetch(&url("slow")).await;
        assert!(matches!(
            result,
            Err(FetchError::Timeout {
                timeout_ms: 200,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_invalid_utf8_falls_back_to_lossy() {
        let transport = ScriptedTransport::new();
        let mut body = b"<html><body>caf".to_vec();
        body.push(0xE9);
        body.extend_from_slice(b"</body></html>");
        transport.on("https://example.com/latin1", vec![Reply::Bytes(body)]);

        let page = fetcher(transport).fetch(&url("latin1")).await.unwrap();
        assert!(page.is_degraded());
        assert!(page.body().contains("caf\u{FFFD}"));
    }

    #[test]
    fn test_page_text_joins_nodes() {
        let page = Page::from_html(
            url("x"),
            "<html><body><p><b>SMILES:</b> CCO</p><p>InChI: abc</p></body></html>",
        );
        let text = page.text();
        assert!(text.contains("SMILES:\n CCO"));
        assert!(text.contains("InChI: abc"));
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(15));
        assert!(client.is_ok());
    }
}
