//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use super::FetchError;

/// Default bound on a single origin request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body, or an error for transport failures, timeouts and
    /// non-success statuses.
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default 30 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("atlas/", env!("CARGO_PKG_VERSION")))
            // Several tile origins still serve from self-signed hosts.
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(format!("Request failed: {}", e))
        }
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!("HTTP {} from {}", response.status(), url)));
        }

        response.bytes().await.map_err(|e| self.classify(e))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock HTTP client for testing.
    ///
    /// Answers with the first route whose pattern occurs in the URL, else
    /// with `fallback`. Every requested URL is recorded.
    pub struct MockHttpClient {
        pub routes: Vec<(String, Result<Bytes, FetchError>)>,
        pub fallback: Result<Bytes, FetchError>,
        pub delay: Duration,
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockHttpClient {
        pub fn ok(body: &'static [u8]) -> Self {
            Self::answering(Ok(Bytes::from_static(body)))
        }

        pub fn failing(error: FetchError) -> Self {
            Self::answering(Err(error))
        }

        fn answering(fallback: Result<Bytes, FetchError>) -> Self {
            Self {
                routes: Vec::new(),
                fallback,
                delay: Duration::ZERO,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn route(mut self, pattern: &str, response: Result<Bytes, FetchError>) -> Self {
            self.routes.push((pattern.to_string(), response));
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<Bytes, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.routes
                .iter()
                .find(|(pattern, _)| url.contains(pattern.as_str()))
                .map(|(_, response)| response.clone())
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockHttpClient::ok(&[1, 2, 3, 4]);

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap(), Bytes::from_static(&[1, 2, 3, 4]));
        assert_eq!(mock.calls(), vec!["http://example.com"]);
    }

    #[tokio::test]
    async fn test_mock_client_error() {
        let mock = MockHttpClient::failing(FetchError::Http("Test error".to_string()));

        let result = mock.get("http://example.com").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_routes() {
        let mock = MockHttpClient::ok(b"tile").route("lookup", Ok(Bytes::from_static(b"token")));

        assert_eq!(mock.get("http://x/lookup?1").await.unwrap(), Bytes::from_static(b"token"));
        assert_eq!(mock.get("http://x/tile").await.unwrap(), Bytes::from_static(b"tile"));
    }

    #[test]
    fn test_reqwest_client_keeps_timeout() {
        let client = ReqwestClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert_eq!(ReqwestClient::new().unwrap().timeout(), DEFAULT_FETCH_TIMEOUT);
    }

    #[tokio::test]
    async fn test_reqwest_client_unreachable_host_fails() {
        // Port 9 (discard) on localhost is almost never listening.
        let client = ReqwestClient::with_timeout(Duration::from_secs(2)).unwrap();
        let result = client.get("http://127.0.0.1:9/tile.jpg").await;
        assert!(matches!(result, Err(FetchError::Http(_)) | Err(FetchError::Timeout(_))));
    }
}
