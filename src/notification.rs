// Forwarding of stored bookings to the manager-notification queue.
// Delivery is at-most-once; callers log failures and move on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::error::NotificationError;
use crate::models::Booking;

#[async_trait]
pub trait BookingQueue: Send + Sync + 'static {
    async fn send(&self, booking: &Booking) -> Result<(), NotificationError>;
}

// Message body: the booking exactly as persisted
pub fn encode_message(booking: &Booking) -> Result<String, NotificationError> {
    Ok(serde_json::to_string(booking)?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub url: Option<String>,
    pub timeout_ms: u64,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 2_000,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

// In-process queue; the receiving half plays the notification worker
pub struct ChannelQueue {
    tx: mpsc::Sender<String>,
    fail_next_sends: AtomicUsize,
}

impl ChannelQueue {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                tx,
                fail_next_sends: AtomicUsize::new(0),
            },
            rx,
        )
    }

    pub fn fail_next_sends(&self, count: usize) {
        self.fail_next_sends.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookingQueue for ChannelQueue {
    async fn send(&self, booking: &Booking) -> Result<(), NotificationError> {
        let should_fail = self
            .fail_next_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(NotificationError::Transport(
                "simulated queue outage".to_string(),
            ));
        }

        let body = encode_message(booking)?;
        self.tx
            .send(body)
            .await
            .map_err(|_| NotificationError::Closed)
    }
}

// Queue reached over HTTP (e.g. a queue service's send-message endpoint)
pub struct HttpQueue {
    client: reqwest::Client,
    url: String,
    timeout_ms: u64,
    breaker: Mutex<CircuitBreaker>,
}

impl HttpQueue {
    pub fn new(url: impl Into<String>, config: &QueueConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout_ms: config.timeout_ms,
            breaker: Mutex::new(CircuitBreaker::new(&config.circuit_breaker)),
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        self.breaker.lock().is_open()
    }

    async fn post(&self, body: String) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout(self.timeout_ms)
                } else {
                    NotificationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(NotificationError::Rejected {
            status_code: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BookingQueue for HttpQueue {
    async fn send(&self, booking: &Booking) -> Result<(), NotificationError> {
        if !self.breaker.lock().should_allow_call() {
            return Err(NotificationError::CircuitOpen {
                queue: self.url.clone(),
            });
        }

        let body = encode_message(booking)?;
        match self.post(body).await {
            Ok(()) => {
                self.breaker.lock().success();
                debug!(booking_id = %booking.booking_id, "booking forwarded to queue");
                Ok(())
            }
            Err(e) => {
                self.breaker.lock().fail();
                warn!(queue = %self.url, error = %e, "queue send failed");
                Err(e)
            }
        }
    }
}
