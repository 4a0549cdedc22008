// Manager dashboard and customer booking history

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::StoreError;
use crate::models::{Booking, Room};
use crate::store::{BookingRepository, RoomRepository};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_rooms: usize,
    pub fully_booked_rooms: usize,
    pub total_bookings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingRow {
    // Current room name, or a short id label when the room is gone
    pub room_label: String,
    pub booking: Booking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub summary: DashboardSummary,
    pub rooms: Vec<Room>,
    // Newest first
    pub bookings: Vec<BookingRow>,
}

fn fallback_label(room_id: &str) -> String {
    let short: String = room_id.chars().take(6).collect();
    format!("Room ({short})")
}

pub fn build_dashboard(rooms: Vec<Room>, bookings: Vec<Booking>) -> DashboardView {
    let names: HashMap<&str, &str> = rooms
        .iter()
        .map(|r| (r.room_id.as_str(), r.name.as_str()))
        .collect();

    let mut rows: Vec<BookingRow> = bookings
        .into_iter()
        .map(|booking| BookingRow {
            room_label: names
                .get(booking.room_id.as_str())
                .map(|name| name.to_string())
                .unwrap_or_else(|| fallback_label(&booking.room_id)),
            booking,
        })
        .collect();
    rows.sort_by(|a, b| b.booking.booked_on.cmp(&a.booking.booked_on));

    let summary = DashboardSummary {
        total_rooms: rooms.len(),
        fully_booked_rooms: rooms.iter().filter(|r| r.capacity == 0).count(),
        total_bookings: rows.len(),
    };

    DashboardView {
        summary,
        rooms,
        bookings: rows,
    }
}

pub struct Dashboard {
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl Dashboard {
    pub fn new(rooms: Arc<dyn RoomRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { rooms, bookings }
    }

    pub async fn manager_view(&self) -> Result<DashboardView, StoreError> {
        let rooms = self.rooms.list_all().await?;
        let bookings = self.bookings.list_all().await?;
        Ok(build_dashboard(rooms, bookings))
    }

    pub async fn my_bookings(&self, owner_email: &str) -> Result<Vec<Booking>, StoreError> {
        let mut bookings = self.bookings.list_by_owner(owner_email).await?;
        bookings.sort_by(|a, b| b.booked_on.cmp(&a.booked_on));
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, DEFAULT_PAYMENT_METHOD};
    use crate::store::{MemoryBookingStore, MemoryRoomStore};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn booking(id: &str, room_id: &str, day: u32, owner: &str) -> Booking {
        let date = NaiveDate::from_ymd_opt(2025, 5, day).unwrap();
        Booking {
            booking_id: id.into(),
            room_id: room_id.into(),
            room_name: "old name".into(),
            name: "Guest".into(),
            email: "guest@example.com".into(),
            days: 1,
            people: 1,
            checkin_date: date,
            checkout_date: date.succ_opt().unwrap(),
            price_before_discount: dec!(10),
            final_price: dec!(9.00),
            discount_percent: dec!(10.0),
            discount_amount: dec!(1.00),
            discount_reason: None,
            payment_method: DEFAULT_PAYMENT_METHOD.into(),
            payment_status: PaymentStatus::Unpaid,
            booked_on: date.and_hms_opt(12, 0, 0).unwrap(),
            booked_by_email: owner.into(),
        }
    }

    #[test]
    fn test_summary_and_ordering() {
        let rooms = vec![
            Room::new("room-aaaa".into(), "Attic", 0, dec!(30), vec![]),
            Room::new("room-bbbb".into(), "Cellar", 2, dec!(20), vec![]),
        ];
        let bookings = vec![
            booking("b1", "room-aaaa", 1, "x@example.com"),
            booking("b2", "deleted-room-id", 3, "x@example.com"),
            booking("b3", "room-bbbb", 2, "y@example.com"),
        ];

        let view = build_dashboard(rooms, bookings);
        assert_eq!(
            view.summary,
            DashboardSummary {
                total_rooms: 2,
                fully_booked_rooms: 1,
                total_bookings: 3,
            }
        );

        let order: Vec<_> = view
            .bookings
            .iter()
            .map(|row| row.booking.booking_id.as_str())
            .collect();
        assert_eq!(order, vec!["b2", "b3", "b1"]);
        assert_eq!(view.bookings[0].room_label, "Room (delete)");
        assert_eq!(view.bookings[1].room_label, "Cellar");
        assert_eq!(view.bookings[2].room_label, "Attic");
    }

    #[tokio::test]
    async fn test_views_over_repositories() {
        let rooms = Arc::new(MemoryRoomStore::new());
        let bookings = Arc::new(MemoryBookingStore::new());
        let room_id = rooms.create("Attic", 1, dec!(30), vec![]).await.unwrap();
        bookings
            .create(&booking("b1", &room_id, 1, "x@example.com"))
            .await
            .unwrap();
        bookings
            .create(&booking("b2", &room_id, 4, "x@example.com"))
            .await
            .unwrap();
        bookings
            .create(&booking("b3", &room_id, 2, "y@example.com"))
            .await
            .unwrap();

        let dashboard = Dashboard::new(rooms, bookings);
        let view = dashboard.manager_view().await.unwrap();
        assert_eq!(view.summary.total_bookings, 3);
        assert!(view.bookings.iter().all(|row| row.room_label == "Attic"));

        let mine = dashboard.my_bookings("x@example.com").await.unwrap();
        let ids: Vec<_> = mine.iter().map(|b| b.booking_id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b1"]);
    }
}
