//! HTTP client for the OFeed SI-Droid connector
//!
//! This crate talks to the two ends of the connector:
//!
//! - **SI-Droid Event**: pulls the IOF XML 3.0 results report from the local
//!   Result Service and checks that the service is up
//! - **OFeed**: uploads result lists as `multipart/form-data` with Basic
//!   authorization derived from the event id and password
//!
//! # Features
//!
//! - **Settings-based configuration**: timeouts and user agent come from the connector settings
//! - **Retry with exponential backoff**: optional, for transient failures
//! - **Request correlation**: every request carries an `X-Request-ID`
//! - **HTTP log**: request and response summaries in a bounded in-memory log
//!
//! # Example
//!
//! ```rust,no_run
//! use ofeed_api_client::{ClientConfig, ConnectorClient, OFeedTarget};
//! use ofeed_core::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Config::load(None)?.settings;
//!     let client = ConnectorClient::with_config(ClientConfig::from_settings(&settings))?;
//!
//!     let xml = client.sidroid().fetch_results(&settings.sidroid_results_url()).await?;
//!     let receipt = client
//!         .ofeed(OFeedTarget::from_settings(&settings))
//!         .upload_results(xml)
//!         .await?;
//!     println!("Uploaded: {}", receipt.status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod server_url;

pub use client::ConnectorClient;
pub use config::ClientConfig;
pub use credentials::{parse_credentials_link, OFeedCredentials};
pub use endpoints::ofeed::{OFeedTarget, UploadReceipt};
pub use error::{ApiError, ApiResult};
pub use server_url::ServerUrl;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::ConnectorClient;
    pub use crate::config::ClientConfig;
    pub use crate::endpoints::{OFeedApi, SiDroidApi};
    pub use crate::endpoints::ofeed::{OFeedTarget, UploadReceipt};
    pub use crate::error::{ApiError, ApiResult};
}
