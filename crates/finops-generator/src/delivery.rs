//! Webhook delivery with bounded retries
//!
//! Each generated event is POSTed as JSON to the configured endpoint:
//!
//! ```text
//! attempt 1 ──✗──▶ wait base ──▶ attempt 2 ──✗──▶ wait 2·base ──▶ attempt 3 ──✗──▶ give up
//!     │                              │                               │
//!     ✓ 200/201/202/204              ✓                               ✓
//!     └──────────────────────────────┴───────────────────────────────┴──▶ delivered
//! ```
//!
//! Attempts are strictly sequential. Any non-success status or transport
//! failure counts as a failed attempt. Nothing is raised past this module:
//! the caller only learns whether the event was acknowledged.
//!
//! No idempotency key is attached, so a slow-but-successful attempt followed
//! by a retry may deliver the same event twice.

use crate::error::Result;
use async_trait::async_trait;
use finops_core::{Delay, Payload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Status codes that acknowledge an event
pub const SUCCESS_STATUSES: [u16; 4] = [200, 201, 202, 204];

/// Production delay backed by `tokio::time::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry policy for one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts
    pub max_retries: u32,

    /// Delay after the first failed attempt; doubles every attempt
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let multiplier = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(multiplier)
    }
}

/// Transport-level failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    /// Request exceeded the timeout
    Timeout,
    /// Could not connect (refused, DNS, TLS handshake)
    Connect,
    /// Request could not be built or sent
    Request,
    /// Failed while streaming a body
    Body,
    /// Anything else reported by the client
    Other,
}

impl NetworkErrorKind {
    /// Classify a reqwest error
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_body() {
            Self::Body
        } else if err.is_request() {
            Self::Request
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkErrorKind::Timeout => write!(f, "timeout"),
            NetworkErrorKind::Connect => write!(f, "connect"),
            NetworkErrorKind::Request => write!(f, "request"),
            NetworkErrorKind::Body => write!(f, "body"),
            NetworkErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Result of a single POST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    /// Endpoint acknowledged with a success status
    Delivered(u16),
    /// Endpoint answered with any other status
    Rejected(u16),
    /// No usable response
    Network(NetworkErrorKind),
}

impl DeliveryOutcome {
    /// Whether this outcome ends the retry loop successfully
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }
}

/// One attempt within a delivery call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// 1-based attempt number
    pub attempt: u32,
    /// What happened
    pub outcome: DeliveryOutcome,
}

/// Every attempt made for one event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub attempts: Vec<DeliveryAttempt>,
}

impl DeliveryReport {
    /// Whether the last attempt was acknowledged
    pub fn delivered(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|attempt| attempt.outcome.is_success())
    }
}

/// HTTP client that ships payloads to a webhook
#[derive(Clone)]
pub struct WebhookClient {
    /// HTTP client with the per-request timeout baked in
    client: reqwest::Client,

    /// Backoff sleep
    delay: Arc<dyn Delay>,
}

impl std::fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookClient").finish_non_exhaustive()
    }
}

impl WebhookClient {
    /// Create a client whose requests time out after `request_timeout`
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            delay: Arc::new(TokioDelay),
        })
    }

    /// Replace the backoff sleep
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    /// POST the payload once
    async fn attempt(&self, endpoint: &str, payload: &Payload) -> DeliveryOutcome {
        let result = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                if SUCCESS_STATUSES.contains(&status) {
                    DeliveryOutcome::Delivered(status)
                } else {
                    DeliveryOutcome::Rejected(status)
                }
            }
            Err(e) => {
                debug!(error = %e, "Webhook request failed");
                DeliveryOutcome::Network(NetworkErrorKind::classify(&e))
            }
        }
    }

    /// Deliver with retries, returning every attempt made
    pub async fn deliver_with_report(
        &self,
        endpoint: &str,
        payload: &Payload,
        policy: RetryPolicy,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for attempt in 1..=policy.max_retries {
            let outcome = self.attempt(endpoint, payload).await;
            report.attempts.push(DeliveryAttempt { attempt, outcome });

            match outcome {
                DeliveryOutcome::Delivered(status) => {
                    info!(endpoint, attempt, status, "Successfully delivered payload");
                    return report;
                }
                DeliveryOutcome::Rejected(status) => {
                    warn!(attempt, status, "Attempt {} failed: server returned HTTP {}", attempt, status);
                }
                DeliveryOutcome::Network(kind) => {
                    warn!(attempt, kind = %kind, "Attempt {} failed: network error ({})", attempt, kind);
                }
            }

            if attempt < policy.max_retries {
                let backoff = policy.backoff_for(attempt);
                debug!(backoff_secs = backoff.as_secs_f64(), "Backing off before retry");
                self.delay.sleep(backoff).await;
            }
        }

        error!(
            endpoint,
            attempts = policy.max_retries,
            "Failed to deliver payload after {} attempts",
            policy.max_retries
        );
        report
    }

    /// Deliver with retries; `true` once an attempt is acknowledged
    pub async fn deliver(
        &self,
        endpoint: &str,
        payload: &Payload,
        max_retries: u32,
        backoff_base: Duration,
    ) -> bool {
        self.deliver_with_report(endpoint, payload, RetryPolicy::new(max_retries, backoff_base))
            .await
            .delivered()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records requested sleeps without waiting
    #[derive(Default)]
    pub(crate) struct RecordingDelay {
        pub(crate) sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn test_payload() -> Payload {
        Payload::from_value(json!({"test": "data"})).unwrap()
    }

    fn test_client(delay: Arc<RecordingDelay>) -> WebhookClient {
        WebhookClient::new(Duration::from_millis(200))
            .unwrap()
            .with_delay(delay)
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_for(40), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test]
    async fn test_send_payload_success_statuses() {
        for status in SUCCESS_STATUSES {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/webhook"))
                .and(header("content-type", "application/json"))
                .and(body_json(json!({"test": "data"})))
                .respond_with(ResponseTemplate::new(status))
                .expect(1)
                .mount(&server)
                .await;

            let delay = Arc::new(RecordingDelay::default());
            let client = test_client(delay.clone());
            let endpoint = format!("{}/webhook", server.uri());

            let delivered = client
                .deliver(&endpoint, &test_payload(), 3, Duration::from_secs(1))
                .await;

            assert!(delivered, "status {} should be accepted", status);
            assert!(delay.sleeps.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_send_payload_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let delay = Arc::new(RecordingDelay::default());
        let client = test_client(delay.clone());
        let endpoint = format!("{}/webhook", server.uri());

        let report = client
            .deliver_with_report(
                &endpoint,
                &test_payload(),
                RetryPolicy::new(2, Duration::from_secs(1)),
            )
            .await;

        assert!(!report.delivered());
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[1].outcome, DeliveryOutcome::Rejected(500));
        assert_eq!(*delay.sleeps.lock().unwrap(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn test_send_payload_retry_on_timeout() {
        let server = MockServer::start().await;

        // Two slow responses trip the 200ms client timeout
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let delay = Arc::new(RecordingDelay::default());
        let client = test_client(delay.clone());
        let endpoint = format!("{}/webhook", server.uri());

        let report = client
            .deliver_with_report(
                &endpoint,
                &test_payload(),
                RetryPolicy::new(3, Duration::from_secs(1)),
            )
            .await;

        assert!(report.delivered());
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(
            report.attempts[0].outcome,
            DeliveryOutcome::Network(NetworkErrorKind::Timeout)
        );
        assert_eq!(report.attempts[2].outcome, DeliveryOutcome::Delivered(200));
        assert_eq!(
            *delay.sleeps.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_stops_after_first_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(Arc::new(RecordingDelay::default()));
        let endpoint = format!("{}/webhook", server.uri());

        assert!(client
            .deliver(&endpoint, &test_payload(), 5, Duration::ZERO)
            .await);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let client = test_client(Arc::new(RecordingDelay::default()));

        let report = client
            .deliver_with_report(
                "http://127.0.0.1:9/webhook",
                &test_payload(),
                RetryPolicy::new(3, Duration::ZERO),
            )
            .await;

        assert!(!report.delivered());
        assert_eq!(report.attempts.len(), 3);
        assert!(report
            .attempts
            .iter()
            .all(|a| matches!(a.outcome, DeliveryOutcome::Network(_))));
    }

    #[tokio::test]
    async fn test_zero_retries_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(Arc::new(RecordingDelay::default()));
        let endpoint = format!("{}/webhook", server.uri());

        assert!(!client
            .deliver(&endpoint, &test_payload(), 0, Duration::ZERO)
            .await);
    }
}
