//! Data sources for the vitals poller
//!
//! Both sources are plain HTTP GET endpoints returning a JSON object. Failures
//! are reported as [`SourceError`] and never escape the poll cycle.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::{FallEvent, FallPayload, VitalsPayload, VitalsReading};

/// Which upstream a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Fall,
    Vitals,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Fall => "fall",
            SourceKind::Vitals => "vitals",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Fall => "Fall detection",
            SourceKind::Vitals => "Vitals",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetch failure
#[derive(Debug, Error)]
pub enum SourceError {
    /// Endpoint unreachable, connection reset or timed out
    #[error("network failure: {0}")]
    NetworkFailure(#[source] reqwest::Error),

    /// Non-2xx status or a body that is not the expected JSON
    #[error("bad response: {0}")]
    BadResponse(String),
}

#[async_trait]
pub trait FallSource: Send + Sync {
    async fn fetch_fall(&self) -> Result<FallEvent, SourceError>;
}

#[async_trait]
pub trait VitalsSource: Send + Sync {
    async fn fetch_vitals(&self) -> Result<VitalsReading, SourceError>;
}

/// Build the shared HTTP client. `timeout` of `None` means wait indefinitely.
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// GET `url` and decode a JSON body
async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T, SourceError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(SourceError::NetworkFailure)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::BadResponse(format!("HTTP {}", status)));
    }

    let body = response.bytes().await.map_err(SourceError::NetworkFailure)?;
    serde_json::from_slice(&body)
        .map_err(|e| SourceError::BadResponse(format!("malformed body: {}", e)))
}

/// Fall-detection endpoint
#[derive(Debug, Clone)]
pub struct HttpFallSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFallSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FallSource for HttpFallSource {
    async fn fetch_fall(&self) -> Result<FallEvent, SourceError> {
        let payload: FallPayload = get_json(&self.client, &self.url).await?;
        Ok(payload.into_event(Local::now()))
    }
}

/// Vitals snapshot endpoint
#[derive(Debug, Clone)]
pub struct HttpVitalsSource {
    client: reqwest::Client,
    url: String,
}

impl HttpVitalsSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl VitalsSource for HttpVitalsSource {
    async fn fetch_vitals(&self) -> Result<VitalsReading, SourceError> {
        let payload: VitalsPayload = get_json(&self.client, &self.url).await?;
        Ok(payload.into_reading(Utc::now()))
    }
}

/// One-shot HTTP responder bound to a random local port
#[cfg(test)]
pub(crate) async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            // Drain headers and body before replying
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .filter_map(|l| l.split_once(':'))
                        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}", addr)
}

/// Client that never routes through an environment proxy
#[cfg(test)]
pub(crate) fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
