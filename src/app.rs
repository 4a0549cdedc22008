// Wiring of stores, side channels and services, done once at process start

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::admission::{BookingService, Clock, SystemClock};
use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::email::{Mailer, MemoryOutbox, SmtpMailer};
use crate::error::StartupError;
use crate::images::{MemoryObjectStore, RoomImages};
use crate::notification::{BookingQueue, ChannelQueue, HttpQueue};
use crate::store::{BookingRepository, MemoryBookingStore, MemoryRoomStore, RoomRepository};

const LOCAL_QUEUE_BUFFER: usize = 256;

pub struct App {
    pub rooms: Arc<dyn RoomRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub booking_service: BookingService,
    pub dashboard: Dashboard,
    pub images: RoomImages,
}

impl App {
    // Returns the local queue receiver when no remote queue is configured
    pub fn build(
        config: AppConfig,
    ) -> Result<(Self, Option<mpsc::Receiver<String>>), StartupError> {
        Self::build_with_clock(config, Arc::new(SystemClock))
    }

    pub fn build_with_clock(
        config: AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, Option<mpsc::Receiver<String>>), StartupError> {
        let rooms: Arc<dyn RoomRepository> = Arc::new(MemoryRoomStore::new());
        let bookings: Arc<dyn BookingRepository> = Arc::new(MemoryBookingStore::new());

        let (queue, local_rx) = match &config.queue.url {
            Some(url) => {
                info!(queue = %url, "forwarding bookings to remote queue");
                let queue: Arc<dyn BookingQueue> =
                    Arc::new(HttpQueue::new(url.clone(), &config.queue));
                (queue, None)
            }
            None => {
                let (queue, rx) = ChannelQueue::new(LOCAL_QUEUE_BUFFER);
                let queue: Arc<dyn BookingQueue> = Arc::new(queue);
                (queue, Some(rx))
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => Arc::new(MemoryOutbox::new()),
        };

        let booking_service = BookingService::new(
            rooms.clone(),
            bookings.clone(),
            queue,
            mailer,
            clock,
            config.admission,
        );
        let dashboard = Dashboard::new(rooms.clone(), bookings.clone());
        let images = RoomImages::new(
            Arc::new(MemoryObjectStore::new()),
            rooms.clone(),
            config.storage,
        );

        Ok((
            Self {
                rooms,
                bookings,
                booking_service,
                dashboard,
                images,
            },
            local_rx,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::FixedClock;
    use crate::models::{Booking, BookingRequest};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_wired_app_books_and_reports() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let (app, rx) =
            App::build_with_clock(AppConfig::default(), Arc::new(FixedClock(now))).unwrap();
        let mut rx = rx.unwrap();

        let room_id = app
            .rooms
            .create("Harbour", 2, dec!(75.00), vec![])
            .await
            .unwrap();
        let booking = app
            .booking_service
            .submit_booking(BookingRequest {
                room_id: room_id.clone(),
                customer_name: "Lena".into(),
                customer_email: "lena@example.com".into(),
                party_size: 2,
                stay_days: 3,
                checkin: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
                checkout: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
                payment_method: Some("Card".into()),
                requester: "lena@example.com".into(),
            })
            .await
            .unwrap();

        // 75 * 3 * 2 = 450 -> 405.00 -> 384.75
        assert_eq!(booking.final_price, dec!(384.75));
        assert_eq!(booking.discount_percent, dec!(14.5));

        let queued: Booking = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(queued.booking_id, booking.booking_id);

        let view = app.dashboard.manager_view().await.unwrap();
        assert_eq!(view.summary.total_bookings, 1);
        assert_eq!(view.summary.fully_booked_rooms, 1);
    }

    #[test]
    fn test_remote_queue_has_no_local_receiver() {
        let mut config = AppConfig::default();
        config.queue.url = Some("http://127.0.0.1:9/queue".to_string());
        let (_, rx) = App::build(config).unwrap();
        assert!(rx.is_none());
    }
}
