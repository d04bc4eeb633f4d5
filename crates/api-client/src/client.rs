//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::ofeed::OFeedTarget;
use crate::endpoints::{OFeedApi, SiDroidApi};
use crate::error::{ApiError, ApiResult, ErrorContext};
use ofeed_core::circular_log::CircularLog;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Connector HTTP client
///
/// This client wraps `reqwest` and adds:
/// - Timeouts and user agent from the connector settings
/// - Optional retry with exponential backoff
/// - Request correlation IDs for tracing
/// - A summary of every exchange in a shared HTTP log
#[derive(Clone)]
pub struct ConnectorClient {
    inner: Client,
    config: Arc<ClientConfig>,
    http_log: Option<Arc<CircularLog>>,
}

impl ConnectorClient {
    /// Create a new client with specific configuration
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the TLS backend cannot be set up.
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.read_timeout {
            builder = builder.read_timeout(timeout);
        }
        if let Some(timeout) = config.call_timeout {
            builder = builder.timeout(timeout);
        }

        let inner = builder.build().map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            http_log: None,
        })
    }

    /// Record request and response summaries in `log`
    #[must_use]
    pub fn with_http_log(mut self, log: Arc<CircularLog>) -> Self {
        self.http_log = Some(log);
        self
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared HTTP log, if one is attached
    #[must_use]
    pub fn http_log(&self) -> Option<&Arc<CircularLog>> {
        self.http_log.as_ref()
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access the SI-Droid Event Result Service
    #[must_use]
    pub fn sidroid(&self) -> SiDroidApi {
        SiDroidApi::new(self.clone())
    }

    /// Access the OFeed upload endpoint for one event
    #[must_use]
    pub fn ofeed(&self, target: OFeedTarget) -> OFeedApi {
        OFeedApi::new(self.clone(), target)
    }

    // -------------------------------------------------------------------------
    // Low-level request execution
    // -------------------------------------------------------------------------

    pub(crate) fn inner(&self) -> &Client {
        &self.inner
    }

    /// Send a request built by `build`, retrying per the configured policy
    ///
    /// `build` is called once per attempt since multipart bodies cannot be cloned.
    /// Non-success statuses are returned as [`ApiError::ApiResponse`].
    pub(crate) async fn execute<F>(&self, method: &str, url: &str, build: F) -> ApiResult<Response>
    where
        F: Fn() -> ApiResult<RequestBuilder>,
    {
        let request_id = Uuid::new_v4().to_string();
        let retry_config = &self.config.retry;
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..retry_config.max_attempts {
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let ctx = ErrorContext {
                request_id: request_id.clone(),
                url: url.to_string(),
                method: method.to_string(),
            };

            match self.execute_once(&ctx, build()?).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if e.is_retryable() && attempt + 1 < retry_config.max_attempts {
                        debug!(
                            request = %ctx,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        debug!(
                            request = %ctx,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, not retrying"
                        );
                        return Err(e);
                    }
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: retry_config.max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_once(&self, ctx: &ErrorContext, request: RequestBuilder) -> ApiResult<Response> {
        self.log_http(format!("--> {} {}", ctx.method, ctx.url));
        let start = Instant::now();

        let response = match request.header(X_REQUEST_ID, &ctx.request_id).send().await {
            Ok(response) => response,
            Err(e) => {
                self.log_http(format!("<-- HTTP FAILED: {e}"));
                warn!(request = %ctx, error = %e, "Request failed");
                return Err(ApiError::Request(e));
            }
        };

        let elapsed = start.elapsed();
        let status = response.status();
        self.log_http(format!(
            "<-- {} {} {} ({}ms)",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            ctx.url,
            elapsed.as_millis()
        ));
        debug!(
            request = %ctx,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis(),
            "Response received"
        );

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            if !body.is_empty() {
                debug!(request = %ctx, body = %body, "Error response body");
            }
            Err(ApiError::from_status(status.as_u16()))
        }
    }

    fn log_http(&self, line: String) {
        if let Some(log) = &self.http_log {
            log.add(line);
        }
    }
}
