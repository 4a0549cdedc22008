// Repositories over the document store: one table of rooms keyed by room_id,
// one table of bookings keyed by booking_id.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Booking, Room};

#[async_trait]
pub trait RoomRepository: Send + Sync + 'static {
    async fn get(&self, room_id: &str) -> Result<Option<Room>, StoreError>;

    async fn list_all(&self) -> Result<Vec<Room>, StoreError>;

    // Returns the generated room_id
    async fn create(
        &self,
        name: &str,
        capacity: u32,
        price: Decimal,
        images: Vec<String>,
    ) -> Result<String, StoreError>;

    // Manager edit; availability is recomputed from the new capacity
    async fn update(
        &self,
        room_id: &str,
        name: &str,
        capacity: u32,
        price: Decimal,
    ) -> Result<Room, StoreError>;

    async fn append_images(&self, room_id: &str, urls: &[String]) -> Result<(), StoreError>;

    // Removing URLs that are not present is a no-op
    async fn remove_images(&self, room_id: &str, urls: &[String]) -> Result<(), StoreError>;

    async fn delete(&self, room_id: &str) -> Result<(), StoreError>;

    // Conditional write: succeeds only while the stored capacity still equals
    // `expected` and `expected >= by`. Otherwise `StoreError::Conflict`.
    async fn try_decrement_capacity(
        &self,
        room_id: &str,
        expected: u32,
        by: u32,
    ) -> Result<Room, StoreError>;

    async fn increment_capacity(&self, room_id: &str, by: u32) -> Result<Room, StoreError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync + 'static {
    async fn create(&self, booking: &Booking) -> Result<String, StoreError>;

    async fn list_all(&self) -> Result<Vec<Booking>, StoreError>;

    // Full scan filtered by booking owner; fine at this scale
    async fn list_by_owner(&self, email: &str) -> Result<Vec<Booking>, StoreError>;
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: DashMap<String, Room>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify<F>(&self, room_id: &str, f: F) -> Result<Room, StoreError>
    where
        F: FnOnce(&mut Room) -> Result<(), StoreError>,
    {
        let mut entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::NotFound(room_id.to_string()))?;
        f(entry.value_mut())?;
        Ok(entry.value().clone())
    }
}

#[async_trait]
impl RoomRepository for MemoryRoomStore {
    async fn get(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.get(room_id).map(|r| r.value().clone()))
    }

    async fn list_all(&self) -> Result<Vec<Room>, StoreError> {
        Ok(self.rooms.iter().map(|r| r.value().clone()).collect())
    }

    async fn create(
        &self,
        name: &str,
        capacity: u32,
        price: Decimal,
        images: Vec<String>,
    ) -> Result<String, StoreError> {
        let room_id = generate_id();
        let room = Room::new(room_id.clone(), name, capacity, price, images);
        self.rooms.insert(room_id.clone(), room);
        debug!(room_id = %room_id, capacity, "room created");
        Ok(room_id)
    }

    async fn update(
        &self,
        room_id: &str,
        name: &str,
        capacity: u32,
        price: Decimal,
    ) -> Result<Room, StoreError> {
        self.modify(room_id, |room| {
            room.name = name.to_string();
            room.price = price;
            room.set_capacity(capacity);
            Ok(())
        })
    }

    async fn append_images(&self, room_id: &str, urls: &[String]) -> Result<(), StoreError> {
        if urls.is_empty() {
            return Ok(());
        }
        self.modify(room_id, |room| {
            room.images.extend(urls.iter().cloned());
            Ok(())
        })
        .map(|_| ())
    }

    async fn remove_images(&self, room_id: &str, urls: &[String]) -> Result<(), StoreError> {
        self.modify(room_id, |room| {
            room.images.retain(|url| !urls.contains(url));
            Ok(())
        })
        .map(|_| ())
    }

    async fn delete(&self, room_id: &str) -> Result<(), StoreError> {
        self.rooms.remove(room_id);
        Ok(())
    }

    async fn try_decrement_capacity(
        &self,
        room_id: &str,
        expected: u32,
        by: u32,
    ) -> Result<Room, StoreError> {
        // get_mut holds the shard write lock, so check and write are atomic
        self.modify(room_id, |room| {
            if room.capacity != expected || expected < by {
                return Err(StoreError::Conflict {
                    key: room_id.to_string(),
                    expected,
                    found: room.capacity,
                });
            }
            room.set_capacity(expected - by);
            Ok(())
        })
    }

    async fn increment_capacity(&self, room_id: &str, by: u32) -> Result<Room, StoreError> {
        self.modify(room_id, |room| {
            room.set_capacity(room.capacity.saturating_add(by));
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: DashMap<String, Booking>,
    fail_next_writes: AtomicUsize,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Makes the next `count` writes fail with a backend error
    pub fn fail_next_writes(&self, count: usize) {
        self.fail_next_writes.store(count, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingStore {
    async fn create(&self, booking: &Booking) -> Result<String, StoreError> {
        let should_fail = self
            .fail_next_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StoreError::Backend("simulated write failure".to_string()));
        }

        self.bookings
            .insert(booking.booking_id.clone(), booking.clone());
        Ok(booking.booking_id.clone())
    }

    async fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        Ok(self.bookings.iter().map(|b| b.value().clone()).collect())
    }

    async fn list_by_owner(&self, email: &str) -> Result<Vec<Booking>, StoreError> {
        Ok(self
            .bookings
            .iter()
            .filter(|b| b.booked_by_email == email)
            .map(|b| b.value().clone())
            .collect())
    }
}
