//! Settings schema definitions

use crate::validation::{ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OFeed upload endpoint
pub const DEFAULT_OFEED_SERVER: &str = "https://api.orienteerfeed.com/rest/v1/upload/iof";

/// Path of the SI-Droid Event IOF XML 3.0 results report
pub const SIDROID_RESULTS_PATH: &str = "/reports/ResultsIof30Xml";

/// Lowest port SI-Droid may be configured on (non-privileged)
pub const MIN_SIDROID_PORT: u16 = 1025;

/// Shortest allowed interval between uploads
pub const MIN_UPLOAD_INTERVAL_SECS: u64 = 5;

/// Longest allowed interval between uploads (10:59)
pub const MAX_UPLOAD_INTERVAL_SECS: u64 = 10 * 60 + 59;

/// Root settings schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// SI-Droid Event connection
    #[serde(default)]
    pub sidroid: SiDroidSettings,

    /// OFeed event and server
    #[serde(default)]
    pub ofeed: OFeedSettings,

    /// Upload scheduling
    #[serde(default)]
    pub upload: UploadSettings,

    /// HTTP client timeouts
    #[serde(default)]
    pub http: HttpSettings,

    /// In-memory log sizes
    #[serde(default)]
    pub log: LogSettings,
}

/// SI-Droid Event settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiDroidSettings {
    /// Port of the SI-Droid Result Service on localhost
    #[serde(default = "default_sidroid_port")]
    pub port: u16,
}

impl Default for SiDroidSettings {
    fn default() -> Self {
        Self {
            port: default_sidroid_port(),
        }
    }
}

fn default_sidroid_port() -> u16 {
    8080
}

/// OFeed settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OFeedSettings {
    /// Upload endpoint URL
    #[serde(default = "default_ofeed_server")]
    pub server: String,

    /// Event id
    #[serde(default)]
    pub event_id: String,

    /// Event password
    #[serde(default)]
    pub event_password: String,
}

impl Default for OFeedSettings {
    fn default() -> Self {
        Self {
            server: default_ofeed_server(),
            event_id: String::new(),
            event_password: String::new(),
        }
    }
}

impl std::fmt::Debug for OFeedSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OFeedSettings")
            .field("server", &self.server)
            .field("event_id", &self.event_id)
            .field("event_password", &mask_secret(&self.event_password))
            .finish()
    }
}

fn default_ofeed_server() -> String {
    DEFAULT_OFEED_SERVER.to_string()
}

/// Upload scheduling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Seconds between two uploads
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

/// HTTP timeouts in seconds; zero disables a timeout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Timeout for establishing the TCP connection
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout between reads of the response
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Timeout for the complete call, from DNS lookup to the last byte of the body
    #[serde(default)]
    pub call_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            call_timeout_secs: 0,
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    10
}

impl HttpSettings {
    /// Connect timeout, `None` when disabled
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.connect_timeout_secs)
    }

    /// Read timeout, `None` when disabled
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.read_timeout_secs)
    }

    /// Whole-call timeout, `None` when disabled
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.call_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Log buffer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Number of entries kept in each of the server and HTTP logs
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}

fn default_log_capacity() -> usize {
    25
}

impl Settings {
    /// Check every setting the results service depends on
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        Validator::new()
            .range("sidroid.port", self.sidroid.port, MIN_SIDROID_PORT, u16::MAX)
            .required("ofeed.server", &self.ofeed.server)
            .starts_with("ofeed.server", &self.ofeed.server, "https://")
            .required("ofeed.event_id", &self.ofeed.event_id)
            .required("ofeed.event_password", &self.ofeed.event_password)
            .range(
                "upload.interval_secs",
                self.upload.interval_secs,
                MIN_UPLOAD_INTERVAL_SECS,
                MAX_UPLOAD_INTERVAL_SECS,
            )
            .custom("log.capacity", || {
                (self.log.capacity == 0).then(|| "Must hold at least one entry".to_string())
            })
            .warn_if(
                "http",
                self.http.connect_timeout_secs == 0
                    && self.http.read_timeout_secs == 0
                    && self.http.call_timeout_secs == 0,
                "All HTTP timeouts are disabled; a stalled upload blocks later cycles",
            )
            .validate()
    }

    /// Shorthand for `validate().is_valid()`
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    /// URL of the SI-Droid IOF XML 3.0 results report
    #[must_use]
    pub fn sidroid_results_url(&self) -> String {
        format!("http://localhost:{}{SIDROID_RESULTS_PATH}", self.sidroid.port)
    }

    /// URL used to check that the SI-Droid Result Service is running
    #[must_use]
    pub fn sidroid_ping_url(&self) -> String {
        format!("http://localhost:{}", self.sidroid.port)
    }

    /// Interval between uploads
    #[must_use]
    pub fn upload_interval(&self) -> Duration {
        Duration::from_secs(self.upload.interval_secs)
    }

    /// Restore the default HTTP timeouts
    pub fn reset_http_timeouts(&mut self) {
        self.http = HttpSettings::default();
    }

    /// Copy with the event password replaced by a mask, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.ofeed.event_password = mask_secret(&self.ofeed.event_password);
        copy
    }
}

/// Render an upload interval as `m:ss`
#[must_use]
pub fn format_interval(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.ofeed.event_id = "42".to_string();
        settings.ofeed.event_password = "secret".to_string();
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sidroid.port, 8080);
        assert_eq!(settings.ofeed.server, DEFAULT_OFEED_SERVER);
        assert_eq!(settings.upload.interval_secs, 30);
        assert_eq!(settings.http.connect_timeout_secs, 10);
        assert_eq!(settings.http.call_timeout(), None);
        assert_eq!(settings.log.capacity, 25);
    }

    #[test]
    fn test_default_settings_are_not_configured() {
        let result = Settings::default().validate();
        assert!(!result.is_valid());
        assert!(result.has_error_for("ofeed.event_id"));
        assert!(result.has_error_for("ofeed.event_password"));
    }

    #[test]
    fn test_configured_settings_are_valid() {
        assert!(configured().is_valid());
    }

    #[test]
    fn test_port_bounds() {
        let mut settings = configured();
        settings.sidroid.port = 1024;
        assert!(settings.validate().has_error_for("sidroid.port"));
        settings.sidroid.port = 1025;
        assert!(settings.is_valid());
        settings.sidroid.port = 65535;
        assert!(settings.is_valid());
    }

    #[test]
    fn test_server_must_be_https() {
        let mut settings = configured();
        settings.ofeed.server = "http://api.orienteerfeed.com/rest/v1/upload/iof".to_string();
        assert!(settings.validate().has_error_for("ofeed.server"));

        settings.ofeed.server = String::new();
        assert!(settings.validate().has_error_for("ofeed.server"));
    }

    #[test]
    fn test_interval_bounds() {
        let mut settings = configured();
        settings.upload.interval_secs = 4;
        assert!(settings.validate().has_error_for("upload.interval_secs"));
        settings.upload.interval_secs = 5;
        assert!(settings.is_valid());
        settings.upload.interval_secs = 659;
        assert!(settings.is_valid());
        settings.upload.interval_secs = 660;
        assert!(!settings.is_valid());
    }

    #[test]
    fn test_sidroid_urls() {
        let mut settings = Settings::default();
        settings.sidroid.port = 8888;
        assert_eq!(
            settings.sidroid_results_url(),
            "http://localhost:8888/reports/ResultsIof30Xml"
        );
        assert_eq!(settings.sidroid_ping_url(), "http://localhost:8888");
    }

    #[test]
    fn test_reset_http_timeouts() {
        let mut settings = Settings::default();
        settings.http.connect_timeout_secs = 99;
        settings.http.call_timeout_secs = 120;
        settings.reset_http_timeouts();
        assert_eq!(settings.http, HttpSettings::default());
    }

    #[test]
    fn test_zero_timeout_is_disabled() {
        let http = HttpSettings {
            connect_timeout_secs: 0,
            read_timeout_secs: 15,
            call_timeout_secs: 60,
        };
        assert_eq!(http.connect_timeout(), None);
        assert_eq!(http.read_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(http.call_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(30), "0:30");
        assert_eq!(format_interval(65), "1:05");
        assert_eq!(format_interval(659), "10:59");
    }

    #[test]
    fn test_password_is_masked() {
        let settings = configured();
        assert_eq!(settings.redacted().ofeed.event_password, "********");
        assert!(!format!("{:?}", settings.ofeed).contains("secret"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str("[ofeed]\nevent_id = \"7\"\n").unwrap();
        assert_eq!(settings.ofeed.event_id, "7");
        assert_eq!(settings.ofeed.server, DEFAULT_OFEED_SERVER);
        assert_eq!(settings.sidroid.port, 8080);
    }
}
