//! OFeed server URL normalisation
//!
//! Users type the server in many shapes: a bare host, a host with a port, or
//! the event URL shown next to the QR code. Everything is reduced to
//! `scheme://authority/path` with the upload path filled in.

use crate::error::{ApiError, ApiResult};
use reqwest::Url;
use std::fmt;

/// Upload path used when none is given
pub const UPLOAD_DEFAULT_PATH: &str = "/rest/v1/upload/iof";

/// Path of the event URL encoded in OFeed QR codes
pub const QR_CODE_DEFAULT_PATH: &str = "/rest/v1/events";

/// Parsed and normalised server URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerUrl {
    scheme: String,
    authority: String,
    path: String,
}

impl ServerUrl {
    /// Parse user input into a server URL
    ///
    /// `https://` is assumed when no scheme is given. A missing path, or the QR
    /// code event path, becomes [`UPLOAD_DEFAULT_PATH`]. Query and fragment are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Fails on empty input, or input that is not a URL with a host.
    pub fn parse(input: &str) -> ApiResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ApiError::InvalidUrl("Server not specified".to_string()));
        }

        let with_scheme = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{input}")
        };

        let url = Url::parse(&with_scheme).map_err(|e| ApiError::InvalidUrl(format!("{input}: {e}")))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ApiError::InvalidUrl(format!("{input}: missing host")))?;

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let path = url.path().strip_suffix('/').unwrap_or(url.path());
        let path = if path.is_empty() || path == QR_CODE_DEFAULT_PATH {
            UPLOAD_DEFAULT_PATH.to_string()
        } else {
            path.to_string()
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            authority,
            path,
        })
    }

    /// Complete URL, `scheme://authority/path`
    #[must_use]
    pub fn full(&self) -> String {
        format!("{}://{}{}", self.scheme, self.authority, self.path)
    }

    /// Short form for display; `https://` and the default path are hidden
    #[must_use]
    pub fn display(&self) -> String {
        let scheme = if self.is_https() {
            String::new()
        } else {
            format!("{}://", self.scheme)
        };
        let path = if self.path == UPLOAD_DEFAULT_PATH {
            ""
        } else {
            self.path.as_str()
        };
        format!("{scheme}{}{path}", self.authority)
    }

    /// Whether the scheme is `https`
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    /// Scheme, e.g. `https`
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host and optional port
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path, always starting with `/`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full())
    }
}
