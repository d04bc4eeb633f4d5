//! OFeed result upload
//!
//! Results are posted as `multipart/form-data` with two parts: the `eventId`
//! text field and the IOF XML document as the `file` part. Requests carry
//! Basic authorization built from the event id and event password.

use crate::client::ConnectorClient;
use crate::error::{ApiError, ApiResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ofeed_core::config::Settings;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// File name of the uploaded result list
pub const UPLOAD_FILE_NAME: &str = "result-list-iof-3.0.xml";

/// Content type of the uploaded result list
pub const UPLOAD_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Where and as whom results are uploaded
#[derive(Clone, PartialEq, Eq)]
pub struct OFeedTarget {
    /// Upload endpoint
    pub url: String,
    /// Event id, sent as the `eventId` form field
    pub event_id: String,
    /// `Authorization` header value
    pub authorization: String,
}

impl OFeedTarget {
    /// Create a target with Basic authorization for `event_id:password`
    #[must_use]
    pub fn new(url: impl Into<String>, event_id: impl Into<String>, password: &str) -> Self {
        let event_id = event_id.into();
        let authorization = basic_auth(&event_id, password);
        Self {
            url: url.into(),
            event_id,
            authorization,
        }
    }

    /// Target from the connector settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.ofeed.server.clone(),
            settings.ofeed.event_id.clone(),
            &settings.ofeed.event_password,
        )
    }
}

impl fmt::Debug for OFeedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OFeedTarget")
            .field("url", &self.url)
            .field("event_id", &self.event_id)
            .field("authorization", &"Basic ********")
            .finish()
    }
}

/// `Basic base64(user:password)`
#[must_use]
pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// Successful upload
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// HTTP status code
    pub status: u16,
    /// Response body as sent by OFeed
    pub body: String,
    /// Time taken by the request
    pub elapsed: Duration,
}

/// OFeed API
pub struct OFeedApi {
    client: ConnectorClient,
    target: OFeedTarget,
}

impl OFeedApi {
    /// Create a new OFeed API instance
    #[must_use]
    pub fn new(client: ConnectorClient, target: OFeedTarget) -> Self {
        Self { client, target }
    }

    /// Target this API uploads to
    #[must_use]
    pub fn target(&self) -> &OFeedTarget {
        &self.target
    }

    /// Upload an IOF XML result list
    ///
    /// # Errors
    ///
    /// Fails when OFeed cannot be reached or answers with a non-success status.
    #[instrument(skip(self, xml), fields(event_id = %self.target.event_id, bytes = xml.len()))]
    pub async fn upload_results(&self, xml: String) -> ApiResult<UploadReceipt> {
        let start = Instant::now();
        let response = self
            .client
            .execute("POST", &self.target.url, || self.build_upload(&xml))
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let elapsed = start.elapsed();

        info!(status, elapsed_ms = elapsed.as_millis(), "Results uploaded");

        Ok(UploadReceipt {
            status,
            body,
            elapsed,
        })
    }

    fn build_upload(&self, xml: &str) -> ApiResult<reqwest::RequestBuilder> {
        let file = Part::text(xml.to_string())
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_CONTENT_TYPE)
            .map_err(|e| ApiError::config(format!("Invalid upload content type: {e}")))?;

        let form = Form::new()
            .text("eventId", self.target.event_id.clone())
            .part("file", file);

        Ok(self
            .client
            .inner()
            .post(&self.target.url)
            .header(AUTHORIZATION, &self.target.authorization)
            .multipart(form))
    }
}
