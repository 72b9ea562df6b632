use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::GeoError;
use crate::retry::retry_with_backoff;
use crate::types::GeocodeMatch;

/// HTTP client for a Nominatim-compatible `/search` endpoint.
///
/// One best match per query (`limit=1`). A fixed delay between consecutive
/// requests honours the public service's rate limit; 429 and network
/// failures are retried with exponential backoff, everything else is a
/// terminal error for the query. Zero results is not an error.
pub struct GeocodeClient {
    client: Client,
    base_url: String,
    /// Minimum gap between consecutive requests.
    inter_request_delay_ms: u64,
    /// Retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `base * 2^attempt`.
    backoff_base_secs: u64,
    last_request: Mutex<Option<Instant>>,
}

impl GeocodeClient {
    /// Creates a client against `base_url` (scheme + host, no trailing
    /// path).
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        inter_request_delay_ms: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            inter_request_delay_ms,
            max_retries,
            backoff_base_secs,
            last_request: Mutex::new(None),
        })
    }

    /// Geocode a free-text query to at most one best match.
    ///
    /// # Errors
    ///
    /// - [`GeoError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`GeoError::NotFound`] — HTTP 404 (not retried).
    /// - [`GeoError::UnexpectedStatus`] — any other non-2xx status (not retried).
    /// - [`GeoError::Http`] — network failure after all retries exhausted.
    /// - [`GeoError::Deserialize`] — response body is not the expected JSON
    ///   array (not retried).
    /// - [`GeoError::InvalidBaseUrl`] — the configured base URL does not parse.
    pub async fn search(&self, query: &str) -> Result<Option<GeocodeMatch>, GeoError> {
        let url = self.search_url(query)?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                self.throttle().await;

                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(GeoError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(GeoError::NotFound {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(GeoError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                let matches = serde_json::from_str::<Vec<GeocodeMatch>>(&body).map_err(|e| {
                    GeoError::Deserialize {
                        context: "geocoder search response".to_string(),
                        source: e,
                    }
                })?;

                Ok(matches.into_iter().next())
            }
        })
        .await
    }

    /// Wait out the remainder of the inter-request delay since the previous
    /// call, then record this one.
    async fn throttle(&self) {
        if self.inter_request_delay_ms == 0 {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let gap = Duration::from_millis(self.inter_request_delay_ms);
            let elapsed = prev.elapsed();
            if elapsed < gap {
                tokio::time::sleep(gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn search_url(&self, query: &str) -> Result<reqwest::Url, GeoError> {
        let mut url = reqwest::Url::parse(&format!("{}/search", self.base_url)).map_err(|e| {
            GeoError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "jsonv2")
            .append_pair("addressdetails", "1")
            .append_pair("limit", "1");
        Ok(url)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
