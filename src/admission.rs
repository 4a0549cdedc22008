// Booking admission: validate the room, price the stay, reserve seats with a
// conditional capacity write, persist the booking, then notify.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::email::{ConfirmationEmail, Mailer};
use crate::error::{AdmissionError, EmailError, NotificationError, StoreError};
use crate::models::{Booking, BookingRequest, PaymentStatus, Room};
use crate::notification::BookingQueue;
use crate::pricing::{compute_price, is_weekend, Quote};
use crate::store::{generate_id, BookingRepository, RoomRepository};

// Retry policy for capacity write conflicts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            initial_backoff_ms: 10,
            max_backoff_ms: 500,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

// Exponential backoff with jitter to keep competing bookings from retrying in lockstep
pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
    let base_backoff_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powf(retry_attempt as f64))
    .min(config.max_backoff_ms as f64);

    let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
    let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

    Duration::from_millis(backoff_ms as u64)
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

// Local wall clock, matching the timestamps shown to customers
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    // Festival applied to every booking; None disables the festival stage
    pub promo_event: Option<String>,
    pub retry: RetryConfig,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            promo_event: Some("Diwali".to_string()),
            retry: RetryConfig::default(),
        }
    }
}

// What happened on the best-effort channels of an admitted booking
#[derive(Debug)]
pub struct SideEffects {
    pub queued: Result<(), NotificationError>,
    pub emailed: Result<(), EmailError>,
}

#[derive(Debug)]
pub struct Admission {
    pub booking: Booking,
    pub quote: Quote,
    pub side_effects: SideEffects,
}

pub struct BookingService {
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
    queue: Arc<dyn BookingQueue>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    config: AdmissionConfig,
}

impl BookingService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        bookings: Arc<dyn BookingRepository>,
        queue: Arc<dyn BookingQueue>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: AdmissionConfig,
    ) -> Self {
        Self {
            rooms,
            bookings,
            queue,
            mailer,
            clock,
            config,
        }
    }

    pub async fn submit_booking(&self, request: BookingRequest) -> Result<Booking, AdmissionError> {
        self.admit(request).await.map(|admission| admission.booking)
    }

    pub async fn admit(&self, request: BookingRequest) -> Result<Admission, AdmissionError> {
        if request.party_size == 0 {
            return Err(AdmissionError::InvalidRequest(
                "party size must be at least 1".to_string(),
            ));
        }
        if request.stay_days == 0 {
            return Err(AdmissionError::InvalidRequest(
                "stay must be at least 1 day".to_string(),
            ));
        }

        let (room, quote, now) = self.reserve(&request).await?;
        let booking = self.build_booking(&request, &room, &quote, now);

        if let Err(e) = self.bookings.create(&booking).await {
            warn!(room_id = %room.room_id, error = %e, "booking write failed, releasing seats");
            if let Err(release) = self
                .rooms
                .increment_capacity(&room.room_id, request.party_size)
                .await
            {
                warn!(
                    room_id = %room.room_id,
                    error = %release,
                    "failed to release reserved seats"
                );
            }
            return Err(AdmissionError::PersistenceFailure(e));
        }

        info!(
            booking_id = %booking.booking_id,
            room_id = %booking.room_id,
            people = booking.people,
            final_price = %booking.final_price,
            "booking admitted"
        );

        let side_effects = SideEffects {
            queued: self.forward(&booking).await,
            emailed: self.confirm(&booking).await,
        };

        Ok(Admission {
            booking,
            quote,
            side_effects,
        })
    }

    // Steps 1-4 plus the seat reservation, retried while the capacity we read
    // is being changed by concurrent admissions.
    async fn reserve(
        &self,
        request: &BookingRequest,
    ) -> Result<(Room, Quote, NaiveDateTime), AdmissionError> {
        let mut attempt = 0;
        loop {
            let room = self
                .rooms
                .get(&request.room_id)
                .await?
                .ok_or_else(|| AdmissionError::RoomNotFound(request.room_id.clone()))?;

            if !room.is_available() {
                return Err(AdmissionError::RoomUnavailable(room.room_id));
            }
            if request.party_size > room.capacity {
                return Err(AdmissionError::CapacityExceeded {
                    capacity: room.capacity,
                    requested: request.party_size,
                    contended: false,
                });
            }

            // Weekend flag and booked_on share this instant
            let now = self.clock.now();
            let quote = self.quote(&room, request, now)?;

            match self
                .rooms
                .try_decrement_capacity(&room.room_id, room.capacity, request.party_size)
                .await
            {
                Ok(_) => return Ok((room, quote, now)),
                Err(StoreError::Conflict { found, .. }) => {
                    if attempt >= self.config.retry.max_retries {
                        warn!(room_id = %room.room_id, attempt, "capacity retries exhausted");
                        return Err(AdmissionError::CapacityExceeded {
                            capacity: found,
                            requested: request.party_size,
                            contended: true,
                        });
                    }
                    let backoff = calculate_backoff(attempt, &self.config.retry);
                    debug!(
                        room_id = %room.room_id,
                        attempt,
                        expected = room.capacity,
                        found,
                        "capacity changed concurrently, retrying in {:?}",
                        backoff
                    );
                    attempt += 1;
                    tokio::time::sleep(backoff).await;
                }
                // Room deleted between read and write
                Err(StoreError::NotFound(_)) => {
                    return Err(AdmissionError::RoomNotFound(request.room_id.clone()))
                }
                Err(e) => return Err(AdmissionError::PersistenceFailure(e)),
            }
        }
    }

    fn quote(
        &self,
        room: &Room,
        request: &BookingRequest,
        now: NaiveDateTime,
    ) -> Result<Quote, AdmissionError> {
        let base_price = room
            .price
            .checked_mul(Decimal::from(request.stay_days))
            .and_then(|p| p.checked_mul(Decimal::from(request.party_size)))
            .ok_or_else(|| {
                AdmissionError::InvalidRequest(format!(
                    "total price out of range for room {}",
                    room.room_id
                ))
            })?;
        Ok(compute_price(
            base_price,
            self.config.promo_event.as_deref(),
            is_weekend(now.date()),
            request.stay_days,
        ))
    }

    fn build_booking(
        &self,
        request: &BookingRequest,
        room: &Room,
        quote: &Quote,
        booked_on: NaiveDateTime,
    ) -> Booking {
        Booking {
            booking_id: generate_id(),
            room_id: room.room_id.clone(),
            room_name: room.name.clone(),
            name: request.customer_name.clone(),
            email: request.customer_email.clone(),
            days: request.stay_days,
            people: request.party_size,
            checkin_date: request.checkin,
            checkout_date: request.checkout,
            price_before_discount: quote.base_price,
            final_price: quote.final_price,
            discount_percent: quote.total_discount_percent,
            discount_amount: quote.total_discount_amount,
            discount_reason: quote.discount_reason(),
            payment_method: request.payment_method().to_string(),
            payment_status: PaymentStatus::Unpaid,
            booked_on,
            booked_by_email: request.requester.clone(),
        }
    }

    async fn forward(&self, booking: &Booking) -> Result<(), NotificationError> {
        let result = self.queue.send(booking).await;
        if let Err(e) = &result {
            warn!(booking_id = %booking.booking_id, error = %e, "booking notification not queued");
        }
        result
    }

    async fn confirm(&self, booking: &Booking) -> Result<(), EmailError> {
        let result = match ConfirmationEmail::for_booking(booking) {
            Ok(email) => self.mailer.send(&email).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(booking_id = %booking.booking_id, error = %e, "confirmation email not sent");
        }
        result
    }
}
