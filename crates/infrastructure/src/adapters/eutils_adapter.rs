//! E-utilities request pipeline
//!
//! Implements [`EutilsPort`] by chaining the response cache, the rate
//! limiter, the retry policy and the HTTP transport:
//!
//! 1. A fresh, intact cache entry is returned without touching the rate
//!    limiter or the network.
//! 2. Otherwise every attempt first acquires a rate-limiter slot and then
//!    calls the transport; transient failures are retried with backoff.
//! 3. Payloads that pass validation are written back to the cache; an
//!    Entrez error envelope or malformed body is returned as an error and
//!    never stored.
//!
//! A cache that fails (unreadable file, full disk) is switched off for the
//! rest of the session and requests go straight to the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use application::{ApplicationError, EutilsPort, ResponseCachePort, validate_response};
use async_trait::async_trait;
use domain::{RequestDescriptor, ResponsePayload};
use integration_eutils::{
    EutilsConfig, EutilsTransport, ReqwestTransport, TransportError, TransportRequest,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::Credentials;
use crate::cache::SqliteResponseCache;
use crate::config::AppConfig;
use crate::rate_limiter::RateLimiter;
use crate::retry::{RetryConfig, with_retry};

/// Request pipeline behind [`EutilsPort`]
pub struct EutilsAdapter {
    transport: Arc<dyn EutilsTransport>,
    config: EutilsConfig,
    credentials: Credentials,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryConfig,
    request_timeout: Option<Duration>,
    cache: Option<Arc<dyn ResponseCachePort>>,
    cache_disabled: AtomicBool,
}

impl std::fmt::Debug for EutilsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EutilsAdapter")
            .field("base_url", &self.config.base_url)
            .field("credentials", &self.credentials)
            .field("rate_limit", &self.rate_limiter.ceiling())
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .field("cache_active", &self.cache_active())
            .finish_non_exhaustive()
    }
}

impl EutilsAdapter {
    /// Create a pipeline without a cache
    ///
    /// The rate limiter follows the NCBI policy for the given credentials.
    pub fn new(
        transport: Arc<dyn EutilsTransport>,
        config: EutilsConfig,
        credentials: Credentials,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::for_policy(credentials.has_api_key(), None));
        Self {
            transport,
            config,
            credentials,
            rate_limiter,
            retry: RetryConfig::default(),
            request_timeout: None,
            cache: None,
            cache_disabled: AtomicBool::new(false),
        }
    }

    /// Build the full pipeline from configuration
    ///
    /// A cache that cannot be opened is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] if the configuration is
    /// invalid (e.g. no contact email) or the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        config.validate()?;
        let credentials = config.credentials()?;

        let transport = ReqwestTransport::new(&config.eutils)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;

        let rate_limiter = Arc::new(RateLimiter::for_policy(
            credentials.has_api_key(),
            config.requests_per_second,
        ));

        let mut adapter = Self::new(Arc::new(transport), config.eutils.clone(), credentials)
            .with_rate_limiter(rate_limiter)
            .with_retry_config(config.retry.clone())
            .with_request_timeout(config.request_timeout());

        if config.cache.enabled {
            let path = config.cache.resolved_path();
            match SqliteResponseCache::open(&path, config.cache.max_age()) {
                Ok(cache) => adapter = adapter.with_cache(Arc::new(cache)),
                Err(e) => warn!(path = %path, error = %e, "Response cache unavailable, continuing without it"),
            }
        }

        info!(
            rate_limit = adapter.rate_limiter.ceiling(),
            cache = adapter.cache_active(),
            "E-utilities client ready"
        );
        Ok(adapter)
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCachePort>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Bound the total time of one request across all attempts
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub const fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether requests currently consult the cache
    pub fn cache_active(&self) -> bool {
        self.cache.is_some() && !self.cache_disabled.load(Ordering::Acquire)
    }

    fn active_cache(&self) -> Option<&Arc<dyn ResponseCachePort>> {
        self.cache
            .as_ref()
            .filter(|_| !self.cache_disabled.load(Ordering::Acquire))
    }

    fn disable_cache(&self, error: &ApplicationError) {
        if !self.cache_disabled.swap(true, Ordering::AcqRel) {
            warn!(error = %error, "Response cache failed, caching disabled for this session");
        }
    }

    async fn cached(&self, descriptor: &RequestDescriptor) -> Option<ResponsePayload> {
        let cache = self.active_cache()?;
        match cache.get(descriptor).await {
            Ok(hit) => hit,
            Err(e) => {
                self.disable_cache(&e);
                None
            },
        }
    }

    async fn store(&self, descriptor: &RequestDescriptor, payload: &ResponsePayload) {
        let Some(cache) = self.active_cache() else {
            return;
        };
        if let Err(e) = cache.put(descriptor, payload).await {
            self.disable_cache(&e);
        }
    }

    /// Outbound request: descriptor parameters followed by credentials
    fn build_request(&self, descriptor: &RequestDescriptor) -> TransportRequest {
        let mut params = descriptor.query_pairs();
        params.extend(self.credentials.query_pairs());
        TransportRequest::new(
            self.config.endpoint_url(descriptor.endpoint()),
            params,
            self.config.timeout(),
        )
    }

    /// Rate-limited, retried network round trip
    async fn fetch_remote(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponsePayload, ApplicationError> {
        let endpoint = descriptor.endpoint();
        let request = self.build_request(descriptor);
        let transport = &self.transport;
        let rate_limiter = &self.rate_limiter;
        let request = &request;

        let outcome = with_retry(&self.retry, || async move {
            rate_limiter.acquire().await;
            transport
                .send(request)
                .await
                .map_err(|e| classify(endpoint, e))
        })
        .await;

        let attempts = outcome.attempts;
        match outcome.result {
            Ok(response) => {
                debug!(
                    attempts,
                    bytes = response.body.len(),
                    "Fetched response from network"
                );
                Ok(ResponsePayload::new(response.body))
            },
            Err(source) => Err(ApplicationError::RequestFailed {
                endpoint: endpoint.to_string(),
                params: descriptor.summary(),
                attempts,
                source: Box::new(source),
            }),
        }
    }
}

/// Map a transport failure onto the application error taxonomy
fn classify(endpoint: &str, error: TransportError) -> ApplicationError {
    match error {
        TransportError::ClientError { status, message } => ApplicationError::ClientRequest {
            endpoint: endpoint.to_string(),
            status,
            reason: message,
        },
        TransportError::InvalidRequest(reason) => {
            ApplicationError::Configuration(format!("cannot build request to {endpoint}: {reason}"))
        },
        other => ApplicationError::Transient {
            endpoint: endpoint.to_string(),
            status: other.status(),
            retry_after: other.retry_after(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl EutilsPort for EutilsAdapter {
    #[instrument(skip(self, descriptor), fields(endpoint = descriptor.endpoint(), params = %descriptor.summary()))]
    async fn request(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponsePayload, ApplicationError> {
        if let Some(payload) = self.cached(descriptor).await {
            return Ok(payload);
        }

        let started = Instant::now();
        let payload = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_remote(descriptor))
                .await
                .map_err(|_| ApplicationError::Timeout {
                    endpoint: descriptor.endpoint().to_string(),
                    elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                })??,
            None => self.fetch_remote(descriptor).await?,
        };

        if let Err(e) = validate_response(descriptor, &payload) {
            warn!(error = %e, "Rejected response, not caching");
            return Err(e);
        }

        self.store(descriptor, &payload).await;
        Ok(payload)
    }
}
