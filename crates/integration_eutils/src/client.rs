//! reqwest-backed transport

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use tracing::{debug, instrument, warn};

use crate::{
    config::EutilsConfig,
    error::TransportError,
    transport::{EutilsTransport, TransportRequest, TransportResponse},
};

/// Longest error body kept in a [`TransportError`] message
const MAX_ERROR_BODY: usize = 512;

/// HTTP transport built on a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new transport
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &EutilsConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { client })
    }

    fn classify_send_error(err: &reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::ConnectionFailed(err.to_string())
        }
    }
}

/// Parse a `Retry-After` header value given as delta-seconds or an HTTP date
pub(crate) fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    // A date in the past means "now"
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl EutilsTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let start = Instant::now();

        let response = self
            .client
            .get(&request.url)
            .query(&request.params)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(&e, request.timeout))?;

        let status = response.status();
        debug!(status = %status, "Received E-utilities response");

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| parse_retry_after(v, Utc::now()));

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(retry_after = ?retry_after, "E-utilities rate limit hit");
            return Err(TransportError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = truncate_body(&body);
            return Err(if status.is_server_error() {
                TransportError::ServerError {
                    status: status.as_u16(),
                    message,
                    retry_after,
                }
            } else {
                TransportError::ClientError {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::classify_send_error(&e, request.timeout))?;

        debug!(
            bytes = body.len(),
            time_ms = start.elapsed().as_millis(),
            "E-utilities request completed"
        );

        Ok(TransportResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
