//! Results service
//!
//! Pulls the IOF XML results report from SI-Droid Event, stamps person ids and
//! uploads the document to OFeed. The first cycle runs after a short start-up
//! delay, later cycles at the configured upload interval.
//!
//! Every cycle ends with an [`UpdateStatus`]; progress and outcomes are also
//! written to a bounded server log, and HTTP exchanges to an HTTP log.

use anyhow::Result;
use chrono::Local;
use ofeed_api_client::{ApiError, ClientConfig, ConnectorClient, OFeedTarget, ServerUrl};
use ofeed_core::circular_log::{CircularLog, LogItem};
use ofeed_core::config::Settings;
use ofeed_core::iof;
use ofeed_telemetry::Timer;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delay before the first cycle
pub const STARTUP_DELAY: Duration = Duration::from_secs(3);

const MSG_GET_RESULTS: &str = "Getting results from SI-Droid";
const MSG_RESULTS_RETRIEVED: &str = "Results retrieved from SI-Droid";
const MSG_NO_RESULTS: &str = "No results available in SI-Droid";
const MSG_UPLOADING: &str = "Uploading results to OFeed";
const MSG_UPLOADED: &str = "Results uploaded to OFeed";

/// Outcome of one update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// Status of the most recent update cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    pub outcome: Outcome,
    /// Local time `HH:MM:SS` when the cycle finished
    pub time: String,
    pub message: String,
}

impl UpdateStatus {
    fn now(outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            outcome,
            time: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Single-string form, `S` or `F` followed by time and message
    pub fn prefixed(&self) -> String {
        let prefix = match self.outcome {
            Outcome::Success => 'S',
            Outcome::Failure => 'F',
        };
        format!("{prefix}{self}")
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.message)
    }
}

/// Cycle counters since the service was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleCounts {
    pub cycles: u64,
    pub uploads: u64,
    pub failures: u64,
}

struct ServiceState {
    running: AtomicBool,
    latest: watch::Sender<Option<UpdateStatus>>,
    counts: Mutex<CycleCounts>,
    server_log: Arc<CircularLog>,
    http_log: Arc<CircularLog>,
    shutdown: watch::Sender<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable view of a running service
#[derive(Clone)]
pub struct ServiceHandle {
    state: Arc<ServiceState>,
}

impl ServiceHandle {
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    pub fn latest_status(&self) -> Option<UpdateStatus> {
        self.state.latest.borrow().clone()
    }

    /// Receiver notified whenever a cycle finishes
    pub fn subscribe(&self) -> watch::Receiver<Option<UpdateStatus>> {
        self.state.latest.subscribe()
    }

    pub fn counts(&self) -> CycleCounts {
        *lock(&self.state.counts)
    }

    /// Server log, newest first
    pub fn server_log(&self) -> Vec<LogItem> {
        self.state.server_log.entries()
    }

    /// HTTP log, newest first
    pub fn http_log(&self) -> Vec<LogItem> {
        self.state.http_log.entries()
    }

    /// Ask [`ResultsService::run`] to stop; an in-flight cycle is abandoned
    pub fn shutdown(&self) {
        self.state.shutdown.send_replace(true);
    }
}

enum Transfer {
    NoResults,
    Uploaded { persons: u32 },
}

/// Periodic SI-Droid to OFeed uploader
pub struct ResultsService {
    client: ConnectorClient,
    results_url: String,
    ping_url: String,
    target: OFeedTarget,
    interval: Duration,
    startup_delay: Duration,
    state: Arc<ServiceState>,
}

impl ResultsService {
    /// Create a service for valid `settings`
    ///
    /// # Errors
    ///
    /// Fails when the settings are invalid, the server URL cannot be parsed,
    /// or the HTTP client cannot be built.
    pub fn new(settings: &Settings, client_config: ClientConfig) -> Result<Self> {
        settings.validate().to_result()?;
        let server = ServerUrl::parse(&settings.ofeed.server)?;

        let server_log = Arc::new(CircularLog::new(settings.log.capacity));
        let http_log = Arc::new(CircularLog::new(settings.log.capacity));
        let client =
            ConnectorClient::with_config(client_config)?.with_http_log(Arc::clone(&http_log));
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            client,
            results_url: settings.sidroid_results_url(),
            ping_url: settings.sidroid_ping_url(),
            target: OFeedTarget::new(
                server.full(),
                settings.ofeed.event_id.clone(),
                &settings.ofeed.event_password,
            ),
            interval: settings.upload_interval(),
            startup_delay: STARTUP_DELAY,
            state: Arc::new(ServiceState {
                running: AtomicBool::new(false),
                latest: watch::channel(None).0,
                counts: Mutex::new(CycleCounts::default()),
                server_log,
                http_log,
                shutdown,
            }),
        })
    }

    #[must_use]
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    #[cfg(test)]
    fn with_endpoints(mut self, results_url: String, target: OFeedTarget) -> Self {
        self.results_url = results_url;
        self.target = target;
        self
    }

    #[cfg(test)]
    fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Check that the SI-Droid Result Service answers
    pub async fn ping_sidroid(&self) -> bool {
        self.client.sidroid().ping(&self.ping_url).await
    }

    /// Run cycles until [`ServiceHandle::shutdown`] is called
    pub async fn run(&self) {
        let mut shutdown = self.state.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }

        self.state.running.store(true, Ordering::SeqCst);
        info!(
            results_url = %self.results_url,
            ofeed_url = %self.target.url,
            interval_secs = self.interval.as_secs(),
            "Results service started"
        );

        let started = tokio::select! {
            () = time::sleep(self.startup_delay) => true,
            () = wait_for_shutdown(&mut shutdown) => false,
        };
        if started {
            repeat_every(self.interval, &mut shutdown, move || async move {
                self.run_cycle().await;
            })
            .await;
        }

        self.state.running.store(false, Ordering::SeqCst);
        info!("Results service stopped");
    }

    /// Perform one pull, stamp and upload cycle
    pub async fn run_cycle(&self) -> UpdateStatus {
        let timer = Timer::start("update_cycle");
        self.log(MSG_GET_RESULTS);

        let status = match self.transfer().await {
            Ok(Transfer::NoResults) => self.record(Outcome::Success, MSG_NO_RESULTS, None),
            Ok(Transfer::Uploaded { persons }) => {
                info!(persons, "Results uploaded");
                lock(&self.state.counts).uploads += 1;
                self.record(Outcome::Success, MSG_UPLOADED, None)
            }
            Err(e) => {
                warn!(error = %e, "Update cycle failed");
                match &e {
                    ApiError::Request(_) => {
                        let message = e.detail().unwrap_or_else(|| e.to_string());
                        self.record(Outcome::Failure, &message, None)
                    }
                    ApiError::Transform(detail) => {
                        self.record(Outcome::Failure, &e.to_string(), Some(format!("{e} {detail}")))
                    }
                    _ => self.record(Outcome::Failure, &e.to_string(), None),
                }
            }
        };

        timer.stop();
        status
    }

    async fn transfer(&self) -> Result<Transfer, ApiError> {
        let xml = self.client.sidroid().fetch_results(&self.results_url).await?;
        if !iof::has_person_results(&xml) {
            return Ok(Transfer::NoResults);
        }
        self.log(MSG_RESULTS_RETRIEVED);

        self.log(MSG_UPLOADING);
        let stamped = iof::stamp_ids(&xml).map_err(|e| ApiError::Transform(e.message))?;

        let receipt = self
            .client
            .ofeed(self.target.clone())
            .upload_results(stamped.xml)
            .await?;
        debug!(status = receipt.status, body = %receipt.body, "OFeed response");

        Ok(Transfer::Uploaded {
            persons: stamped.persons,
        })
    }

    /// Store the cycle status; the server log gets `log_line` or the message
    fn record(&self, outcome: Outcome, message: &str, log_line: Option<String>) -> UpdateStatus {
        self.log(log_line.unwrap_or_else(|| message.to_string()));
        let status = UpdateStatus::now(outcome, message);

        {
            let mut counts = lock(&self.state.counts);
            counts.cycles += 1;
            if outcome == Outcome::Failure {
                counts.failures += 1;
            }
        }

        debug!(status = %status.prefixed(), "Cycle finished");
        self.state.latest.send_replace(Some(status.clone()));
        status
    }

    fn log(&self, text: impl Into<String>) {
        let text = text.into();
        debug!(message = %text, "Server log");
        self.state.server_log.add(text);
    }
}

/// Run `cycle` on every tick of `period`, the first one immediately, until shutdown
///
/// Ticks missed while a cycle runs are delayed, not bursted. A cycle still
/// running at shutdown is dropped.
async fn repeat_every<F, Fut>(
    period: Duration,
    shutdown: &mut watch::Receiver<bool>,
    mut cycle: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = wait_for_shutdown(shutdown) => return,
        }
        tokio::select! {
            () = cycle() => {}
            () = wait_for_shutdown(shutdown) => {
                debug!("Shutdown during cycle");
                return;
            }
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Stub;
    use ofeed_core::retry::RetryConfig;

    const RESULTS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ResultList><ClassResult><PersonResult><Person><Name><Given>Ann</Given></Name></Person></PersonResult><PersonResult><Person><Id>77</Id><Name><Given>Bo</Given></Name></Person></PersonResult></ClassResult></ResultList>";
    const EMPTY_LIST: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ResultList></ResultList>";
    const MALFORMED: &str = "<ResultList><PersonResult><Person></ResultList>";

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.ofeed.event_id = "1234".into();
        settings.ofeed.event_password = "secret".into();
        settings
    }

    fn service(sidroid: &Stub, ofeed: &Stub) -> ResultsService {
        ResultsService::new(&settings(), ClientConfig::default())
            .unwrap()
            .with_endpoints(
                sidroid.url.clone(),
                OFeedTarget::new(ofeed.url.clone(), "1234", "secret"),
            )
    }

    fn log_texts(handle: &ServiceHandle) -> Vec<String> {
        handle.server_log().into_iter().map(|e| e.text).collect()
    }

    #[test]
    fn test_prefixed_status() {
        let status = UpdateStatus {
            outcome: Outcome::Failure,
            time: "12:34:56".into(),
            message: "Empty response".into(),
        };
        assert_eq!(status.prefixed(), "F12:34:56 Empty response");
        assert_eq!(status.to_string(), "12:34:56 Empty response");
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let result = ResultsService::new(&Settings::default(), ClientConfig::default());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upload_cycle() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 200, RESULTS).await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;
        let service = service(&sidroid, &ofeed);
        let handle = service.handle();

        let status = service.run_cycle().await;

        assert!(status.is_success());
        assert_eq!(status.message, "Results uploaded to OFeed");
        assert_eq!(handle.latest_status(), Some(status));
        assert_eq!(
            log_texts(&handle),
            vec![
                MSG_UPLOADED,
                MSG_UPLOADING,
                MSG_RESULTS_RETRIEVED,
                MSG_GET_RESULTS,
            ]
        );

        let uploaded = ofeed.bodies();
        assert_eq!(uploaded.len(), 1);
        assert!(uploaded[0].contains("<Person><Id>1</Id><Name><Given>Ann"));
        assert!(uploaded[0].contains("<Person><Id>2</Id><Name><Given>Bo"));
        assert_eq!(
            handle.counts(),
            CycleCounts {
                cycles: 1,
                uploads: 1,
                failures: 0
            }
        );
        assert_eq!(handle.http_log().len(), 4);
    }

    #[tokio::test]
    async fn test_no_results_skips_upload() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 200, EMPTY_LIST).await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;
        let service = service(&sidroid, &ofeed);

        let status = service.run_cycle().await;

        assert!(status.is_success());
        assert_eq!(status.message, MSG_NO_RESULTS);
        assert!(ofeed.bodies().is_empty());
        assert_eq!(log_texts(&service.handle()), vec![MSG_NO_RESULTS, MSG_GET_RESULTS]);
    }

    #[tokio::test]
    async fn test_sidroid_error_status() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 500, "").await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;
        let service = service(&sidroid, &ofeed);

        let status = service.run_cycle().await;

        assert_eq!(status.outcome, Outcome::Failure);
        assert_eq!(status.message, "500 (Internal Server Error).");
        assert_eq!(service.handle().counts().failures, 1);
    }

    #[tokio::test]
    async fn test_empty_body_is_no_results() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 200, "").await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;

        let status = service(&sidroid, &ofeed).run_cycle().await;
        assert!(status.is_success());
        assert_eq!(status.message, MSG_NO_RESULTS);
        assert!(ofeed.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_stamp_failure_is_logged_with_detail() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 200, MALFORMED).await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;
        let service = service(&sidroid, &ofeed);

        let status = service.run_cycle().await;

        assert_eq!(status.message, "Failed to insert external ids");
        let latest_log = &log_texts(&service.handle())[0];
        assert!(latest_log.starts_with("Failed to insert external ids "));
        assert!(latest_log.len() > status.message.len() + 1);
        assert!(ofeed.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 200, RESULTS).await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 401, "").await;

        let status = service(&sidroid, &ofeed).run_cycle().await;
        assert_eq!(status.message, "401 (Unauthorized).");
    }

    #[tokio::test]
    async fn test_unreachable_sidroid() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;
        let config = ClientConfig::default().with_retry(RetryConfig::no_retry());
        let service = ResultsService::new(&settings(), config)
            .unwrap()
            .with_endpoints(
                format!("http://{addr}/reports/ResultsIof30Xml"),
                OFeedTarget::new(ofeed.url.clone(), "1234", "secret"),
            );

        let status = service.run_cycle().await;
        assert_eq!(status.outcome, Outcome::Failure);
        assert!(!status.message.is_empty());
    }

    #[tokio::test]
    async fn test_run_repeats_until_shutdown() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 200, EMPTY_LIST).await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;
        let service = Arc::new(
            service(&sidroid, &ofeed)
                .with_startup_delay(Duration::ZERO)
                .with_interval(Duration::from_millis(50)),
        );
        let handle = service.handle();

        let runner = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run().await })
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            while handle.counts().cycles < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(handle.is_running());

        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .unwrap()
            .unwrap();
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ticks_are_delayed() {
        let period = Duration::from_millis(100);
        let starts = Mutex::new(Vec::new());
        let (stop, mut shutdown) = watch::channel(false);
        let base = time::Instant::now();

        let starts_ref = &starts;
        let stop_ref = &stop;
        repeat_every(period, &mut shutdown, move || async move {
            let count = {
                let mut starts = lock(starts_ref);
                starts.push(base.elapsed());
                starts.len()
            };
            // The first cycle overruns two ticks
            let work = if count == 1 { 250 } else { 10 };
            time::sleep(Duration::from_millis(work)).await;
            if count == 4 {
                stop_ref.send_replace(true);
            }
        })
        .await;

        let starts: Vec<u128> = lock(&starts).iter().map(Duration::as_millis).collect();
        assert_eq!(starts.len(), 4);
        for (actual, expected) in starts.iter().zip([0u128, 250, 350, 450]) {
            assert!(
                actual.abs_diff(expected) <= 2,
                "cycle started at {actual}ms, expected {expected}ms"
            );
        }
    }

    #[tokio::test]
    async fn test_shutdown_during_startup_delay() {
        let sidroid = Stub::start("/reports/ResultsIof30Xml", 200, EMPTY_LIST).await;
        let ofeed = Stub::start("/rest/v1/upload/iof", 200, "{}").await;
        let service =
            Arc::new(service(&sidroid, &ofeed).with_startup_delay(Duration::from_secs(60)));
        let handle = service.handle();

        let runner = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown();

        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(handle.counts().cycles, 0);
        assert!(handle.latest_status().is_none());
    }
}
