//! Overpass API HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::{OverpassQuery, OverpassResponse};

pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_USER_AGENT: &str = concat!("poimap/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 429: the server's rate limit for this client is exhausted
    #[error("too many requests")]
    TooManyRequests,
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Something that can answer an Overpass query.
///
/// Implemented by [`OverpassClient`] for the real service; tests substitute
/// canned responses.
#[allow(async_fn_in_trait)]
pub trait GeodataProvider {
    async fn execute(&self, query: &OverpassQuery) -> Result<OverpassResponse, ProviderError>;
}

/// Client for an Overpass API interpreter endpoint
#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: Url,
}

impl OverpassClient {
    pub fn new(endpoint: Url, user_agent: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Wrap a preconfigured HTTP client
    pub fn from_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl GeodataProvider for OverpassClient {
    async fn execute(&self, query: &OverpassQuery) -> Result<OverpassResponse, ProviderError> {
        let ql = query.to_ql();
        info!("Querying Overpass at {}", self.endpoint);
        debug!("Overpass query:\n{}", ql);

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("data", ql.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Overpass rate limit hit");
            return Err(ProviderError::TooManyRequests);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: OverpassResponse = serde_json::from_slice(&bytes)?;

        if let Some(remark) = &parsed.remark {
            warn!("Overpass remark: {}", remark);
        }
        info!("Overpass returned {} elements", parsed.elements.len());

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP request with a fixed status line and body,
    /// returning the request body the client sent.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            // Read headers, then the announced body
            let header_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            while buf.len() < header_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&buf[header_end..]).to_string()
        });

        (Url::parse(&format!("http://{}/api/interpreter", addr)).unwrap(), handle)
    }

    fn query() -> OverpassQuery {
        let bbox = BoundingBox::new(42.05, -87.73, 42.06, -87.67).unwrap();
        OverpassQuery::new(bbox, &[r#"["leisure"="park"]"#])
    }

    fn client(endpoint: Url) -> OverpassClient {
        let http = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        OverpassClient::from_client(http, endpoint)
    }

    #[tokio::test]
    async fn test_successful_query() {
        let body = r#"{"elements":[{"type":"node","id":1,"lat":1.0,"lon":2.0,"tags":{"name":"X"}}]}"#;
        let (url, server) = serve_once("200 OK", body).await;

        let response = client(url).execute(&query()).await.unwrap();
        assert_eq!(response.elements.len(), 1);

        let sent = server.await.unwrap();
        assert!(sent.starts_with("data="));
        assert!(sent.contains("out+body"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let (url, _server) = serve_once("429 Too Many Requests", "").await;
        let err = client(url).execute(&query()).await.unwrap_err();
        assert!(matches!(err, ProviderError::TooManyRequests));
    }

    #[tokio::test]
    async fn test_server_error() {
        let (url, _server) = serve_once("504 Gateway Timeout", "busy").await;
        let err = client(url).execute(&query()).await.unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 504);
                assert_eq!(body, "busy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (url, _server) = serve_once("200 OK", "<html>not json</html>").await;
        let err = client(url).execute(&query()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }
}
