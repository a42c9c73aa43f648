//! fetch::transport
//!
//! Content fetch transport: request-by-URL returning a body.
//!
//! # Design
//!
//! The pipeline is the only caller. [`HttpTransport`] is the production
//! implementation over reqwest; [`MockTransport`] serves deterministic
//! bodies and records calls for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// User-Agent header value for asset requests.
const USER_AGENT_VALUE: &str = "gsync-cli";

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from a single fetch.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, DNS, or timeout failure.
    #[error("request to '{url}' failed: {message}")]
    Request { url: String, message: String },

    /// Non-success HTTP status.
    #[error("'{url}' returned status {status}")]
    Status { url: String, status: u16 },
}

/// Request-by-URL primitive.
#[async_trait]
pub trait ContentTransport: Send + Sync {
    /// Fetch the body at `url`.
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// HTTP transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with stock timeouts.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Request` if the underlying client cannot
    /// be constructed.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping, so clones share
/// state with the instance handed to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    /// Scripted bodies by exact URL.
    bodies: HashMap<String, String>,
    /// URL substrings whose requests fail.
    fail_matching: Vec<String>,
    /// Every requested URL, in call order.
    calls: Vec<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a body for an exact URL.
    pub fn serve(&self, url: impl Into<String>, body: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.bodies.insert(url.into(), body.into());
    }

    /// Fail every request whose URL contains `fragment`.
    pub fn fail_matching(&self, fragment: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_matching.push(fragment.into());
    }

    /// Stop failing requests matching `fragment`.
    pub fn heal_matching(&self, fragment: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_matching.retain(|f| f != fragment);
    }

    /// Requested URLs in call order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of requests issued.
    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl ContentTransport for MockTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(url.to_string());

        if inner.fail_matching.iter().any(|f| url.contains(f)) {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        match inner.bodies.get(url) {
            Some(body) => Ok(body.clone()),
            None => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_and_records() {
        tokio_test::block_on(async {
            let mock = MockTransport::new();
            mock.serve("https://example.test/a.svg", "<svg/>");

            let body = mock.fetch("https://example.test/a.svg").await.unwrap();
            assert_eq!(body, "<svg/>");

            let err = mock.fetch("https://example.test/missing.svg").await;
            assert!(matches!(err, Err(TransportError::Status { status: 404, .. })));

            assert_eq!(mock.call_count(), 2);
        });
    }

    #[test]
    fn mock_failure_injection_can_be_healed() {
        tokio_test::block_on(async {
            let mock = MockTransport::new();
            mock.serve("https://example.test/a.svg", "<svg/>");
            mock.fail_matching("a.svg");

            assert!(mock.fetch("https://example.test/a.svg").await.is_err());
            mock.heal_matching("a.svg");
            assert!(mock.fetch("https://example.test/a.svg").await.is_ok());
        });
    }
}
