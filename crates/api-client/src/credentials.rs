//! OFeed credentials links
//!
//! OFeed shows a QR code per event that encodes an app link of the form
//! `https://stigning.se/ofeed?url=<server>&auth=basic&id=<event id>&pwd=<password>`.
//! The `auth` parameter is ignored; Basic authorization is always used.

use crate::error::{ApiError, ApiResult};
use reqwest::Url;
use std::fmt;

/// Required start of a credentials link
pub const CREDENTIALS_LINK_PREFIX: &str = "https://stigning.se/ofeed";

/// Event credentials taken from a link
#[derive(Clone, PartialEq, Eq)]
pub struct OFeedCredentials {
    /// Server URL as given in the link
    pub server: String,
    /// Event id
    pub event_id: String,
    /// Event password
    pub password: String,
}

impl fmt::Debug for OFeedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OFeedCredentials")
            .field("server", &self.server)
            .field("event_id", &self.event_id)
            .field("password", &"********")
            .finish()
    }
}

/// Parse a credentials link
///
/// # Errors
///
/// Fails when the link does not start with [`CREDENTIALS_LINK_PREFIX`], or the
/// server is missing or not `https`, or the event id or password is missing.
pub fn parse_credentials_link(link: &str) -> ApiResult<OFeedCredentials> {
    let link = link.trim();
    if !link.starts_with(CREDENTIALS_LINK_PREFIX) {
        return Err(ApiError::invalid_credentials(format!(
            "Link must start with {CREDENTIALS_LINK_PREFIX}"
        )));
    }

    let url = Url::parse(link).map_err(|e| ApiError::invalid_credentials(e.to_string()))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    let server = param("url").ok_or_else(|| ApiError::invalid_credentials("Server not specified"))?;
    if !is_https_url(&server) {
        return Err(ApiError::invalid_credentials("Server must use https"));
    }
    let event_id = param("id").ok_or_else(|| ApiError::invalid_credentials("Event id is missing"))?;
    let password = param("pwd").ok_or_else(|| ApiError::invalid_credentials("Password is missing"))?;

    Ok(OFeedCredentials {
        server,
        event_id,
        password,
    })
}

/// Whether `url` starts with `https://`, ignoring case
#[must_use]
pub fn is_https_url(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str = "https://stigning.se/ofeed?url=https%3A%2F%2Fapi.orienteerfeed.com%2Frest%2Fv1%2Fevents%2F&auth=basic&id=abc123&pwd=s3cr%26t";

    #[test]
    fn test_parse_valid_link() {
        let creds = parse_credentials_link(LINK).unwrap();
        assert_eq!(creds.server, "https://api.orienteerfeed.com/rest/v1/events/");
        assert_eq!(creds.event_id, "abc123");
        assert_eq!(creds.password, "s3cr&t");
    }

    #[test]
    fn test_wrong_prefix() {
        let err = parse_credentials_link("https://example.com/ofeed?url=https://x&id=1&pwd=2").unwrap_err();
        assert!(err.to_string().contains(CREDENTIALS_LINK_PREFIX));
    }

    #[test]
    fn test_missing_server() {
        let err = parse_credentials_link("https://stigning.se/ofeed?id=1&pwd=2").unwrap_err();
        assert!(err.to_string().contains("Server not specified"));

        let err = parse_credentials_link("https://stigning.se/ofeed?url=&id=1&pwd=2").unwrap_err();
        assert!(err.to_string().contains("Server not specified"));
    }

    #[test]
    fn test_server_must_be_https() {
        let err = parse_credentials_link("https://stigning.se/ofeed?url=http://x.com&id=1&pwd=2").unwrap_err();
        assert!(err.to_string().contains("https"));
    }

    #[test]
    fn test_missing_id_and_password() {
        let err = parse_credentials_link("https://stigning.se/ofeed?url=https://x.com&pwd=2").unwrap_err();
        assert!(err.to_string().contains("Event id is missing"));

        let err = parse_credentials_link("https://stigning.se/ofeed?url=https://x.com&id=1").unwrap_err();
        assert!(err.to_string().contains("Password is missing"));
    }

    #[test]
    fn test_auth_parameter_is_ignored() {
        let creds =
            parse_credentials_link("https://stigning.se/ofeed?url=https://x.com&auth=digest&id=1&pwd=2").unwrap();
        assert_eq!(creds.event_id, "1");
    }

    #[test]
    fn test_is_https_url() {
        assert!(is_https_url("HTTPS://example.com"));
        assert!(!is_https_url("http://example.com"));
        assert!(!is_https_url("https:"));
    }
}
