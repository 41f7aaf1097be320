use crate::errors::AppError;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// HTTP client with timeout and optional retry
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_retries,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Fetch JSON from URL, retrying with exponential backoff when
    /// `max_retries` is non-zero.
    ///
    /// The query string is kept out of the span since it carries the API key.
    #[instrument(skip(self, query), fields(url = %url))]
    pub async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.fetch_with_timeout(url, query).await {
                Ok(response) => {
                    debug!(url = %url, attempt = attempt + 1, "Request successful");
                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let backoff = backoff_delay(attempt);
                        warn!(
                            url = %url,
                            attempt = attempt + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying with exponential backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        error!(
            url = %url,
            attempts = self.max_retries + 1,
            "All attempts failed"
        );
        Err(last_error.unwrap_or_else(|| AppError::internal("Unknown error after retries")))
    }

    async fn fetch_with_timeout<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let full_url = Url::parse_with_params(url, query)
            .map_err(|e| AppError::internal(format!("Invalid URL {}: {}", url, e)))?;
        let response = tokio::time::timeout(self.timeout, self.client.get(full_url).send())
            .await
            .map_err(|_| AppError::timeout(format!("Request to {} timed out", url)))?
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout(format!("Request to {} timed out", url))
                } else {
                    AppError::NetworkError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(
                status.as_u16(),
                format!("HTTP error: {}", status),
            ));
        }

        let text = response.text().await.map_err(AppError::NetworkError)?;
        let json: T = serde_json::from_str(&text).map_err(AppError::ParseError)?;

        Ok(json)
    }
}

/// Exponential backoff starting at 100ms; saturates instead of overflowing
/// for large retry counts.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(2_u64.saturating_pow(attempt).saturating_mul(100))
}
