//! SI-Droid Event Result Service

use crate::client::ConnectorClient;
use crate::error::{ApiError, ApiResult};
use tracing::{debug, instrument};

/// SI-Droid Event API
pub struct SiDroidApi {
    client: ConnectorClient,
}

impl SiDroidApi {
    /// Create a new SI-Droid API instance
    #[must_use]
    pub fn new(client: ConnectorClient) -> Self {
        Self { client }
    }

    /// Fetch the IOF XML 3.0 results report
    ///
    /// # Errors
    ///
    /// Fails when SI-Droid cannot be reached, answers with a non-success
    /// status, or the body cannot be read. An empty body is returned as is;
    /// it holds no results.
    #[instrument(skip(self))]
    pub async fn fetch_results(&self, url: &str) -> ApiResult<String> {
        let response = self
            .client
            .execute("GET", url, || Ok(self.client.inner().get(url)))
            .await?;

        let body = response.text().await.map_err(|e| {
            debug!(error = %e, "Results report body unreadable");
            ApiError::EmptyResponse
        })?;

        debug!(bytes = body.len(), "Results report received");
        Ok(body)
    }

    /// Check that the Result Service answers with a success status
    #[instrument(skip(self))]
    pub async fn ping(&self, url: &str) -> bool {
        match self
            .client
            .execute("GET", url, || Ok(self.client.inner().get(url)))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "SI-Droid ping failed");
                false
            }
        }
    }
}
