//! Mock collaborators and page fixtures for tests.
//!
//! Lets the pipeline run end to end without touching the network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use url::Url;

use crate::error::{Result, SaleWatchError};
use crate::traits::{BasePageFetcher, BasePushService};

// =============================================================================
// Mock Page Fetcher
// =============================================================================

enum FetchResponse {
    Page(String),
    Fail(String),
}

/// Returns queued pages in order; repeats the last one once the queue drains.
#[derive(Clone, Default)]
pub struct MockPageFetcher {
    responses: Arc<Mutex<VecDeque<FetchResponse>>>,
    last: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<Url>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, html: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(FetchResponse::Page(html.into()));
        self
    }

    /// Next fetch fails with a network error.
    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(FetchResponse::Fail(reason.into()));
        self
    }

    /// Get all URLs that were fetched
    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BasePageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        self.calls.lock().unwrap().push(url.clone());

        let next = self.responses.lock().unwrap().pop_front();

        match next {
            Some(FetchResponse::Page(html)) => {
                *self.last.lock().unwrap() = Some(html.clone());
                Ok(html)
            }
            Some(FetchResponse::Fail(reason)) => Err(SaleWatchError::Network(reason.into())),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| SaleWatchError::Network("no mock page queued".into())),
        }
    }
}

// =============================================================================
// Mock Push Service
// =============================================================================

#[derive(Clone, Default)]
pub struct MockPushService {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failure_status: Arc<Mutex<Option<u16>>>,
}

impl MockPushService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every push is rejected with `status`.
    pub fn failing_with(self, status: u16) -> Self {
        *self.failure_status.lock().unwrap() = Some(status);
        self
    }

    /// Get all (recipient, text) pairs that were pushed
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn push_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl BasePushService for MockPushService {
    async fn push_text(&self, to: &str, text: &str) -> Result<()> {
        if let Some(status) = *self.failure_status.lock().unwrap() {
            return Err(SaleWatchError::Delivery {
                status,
                body: "mock push rejected".to_string(),
            });
        }

        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}

// =============================================================================
// Listing page fixtures
// =============================================================================

/// One `<tr>` of the sale table, rendered with the site's class names.
#[derive(Debug, Clone)]
pub struct SaleRow {
    pub store: String,
    pub address: Option<String>,
    pub title: Option<String>,
    pub term: Option<String>,
    pub detail: Option<String>,
    pub notes: Option<String>,
    /// Use the `_f` (featured) class variants for title and term.
    pub featured: bool,
}

impl SaleRow {
    pub fn new(store: &str, term: &str) -> Self {
        Self {
            store: store.to_string(),
            address: Some(format!("{store}の住所")),
            title: Some("セール".to_string()),
            term: Some(term.to_string()),
            detail: Some("対象商品10%OFF".to_string()),
            notes: None,
            featured: false,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn without_address(mut self) -> Self {
        self.address = None;
        self
    }

    pub fn without_term(mut self) -> Self {
        self.term = None;
        self
    }

    fn render(&self) -> String {
        let suffix = if self.featured { "_f" } else { "" };
        let mut html = String::from("<tr>\n<td>");
        html.push_str(&format!("<span class=\"salename\">{}</span>", self.store));
        if let Some(address) = &self.address {
            html.push_str(&format!("<br><span class=\"saleadress\">{address}</span>"));
        }
        html.push_str("</td>\n<td>");
        if let Some(title) = &self.title {
            html.push_str(&format!("<span class=\"saletitle{suffix}\">{title}</span>"));
        }
        if let Some(term) = &self.term {
            html.push_str(&format!("<p class=\"saledate{suffix}\">{term}</p>"));
        }
        if let Some(detail) = &self.detail {
            html.push_str(&format!("<p class=\"saledetail\">{detail}</p>"));
        }
        if let Some(notes) = &self.notes {
            html.push_str(&format!("<p class=\"saledetail_notes\">{notes}</p>"));
        }
        html.push_str("</td>\n</tr>\n");
        html
    }
}

/// Full listing page: a header row (no store field) followed by `rows`.
pub fn listing_page(rows: &[SaleRow]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><title>セール情報</title></head><body>\n\
         <table class=\"cz_sp_table\">\n<tr><th>店舗</th><th>内容</th></tr>\n",
    );
    for row in rows {
        html.push_str(&row.render());
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

// =============================================================================
// One-shot HTTP stub
// =============================================================================

/// Request captured by [`serve_once`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request line and headers, header names lowercased.
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}:", name.to_lowercase());
        self.head
            .lines()
            .find_map(|line| line.strip_prefix(prefix.as_str()))
            .map(str::trim)
    }
}

/// Bind a loopback listener that answers exactly one request with `status`
/// and `body`. Returns the base URL and a handle resolving to the request.
pub async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> (String, tokio::task::JoinHandle<CapturedRequest>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = listener.local_addr().expect("stub listener has no address");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("stub accept failed");

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let (head_end, content_length) = loop {
            let n = socket.read(&mut chunk).await.expect("stub read failed");
            assert!(n > 0, "client closed before sending a full request");
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (end, len);
            }
        };
        while buf.len() < head_end + 4 + content_length {
            let n = socket.read(&mut chunk).await.expect("stub read failed");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("stub write failed");
        let _ = socket.shutdown().await;

        CapturedRequest {
            head: String::from_utf8_lossy(&buf[..head_end]).to_lowercase(),
            body: String::from_utf8_lossy(&buf[head_end + 4..]).into_owned(),
        }
    });

    (format!("http://{addr}"), handle)
}
