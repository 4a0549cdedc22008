// Persistent records for rooms and bookings, plus the inbound booking request

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROOM_NAME: &str = "Unnamed Room";
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash on Arrival";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    pub capacity: u32,
    pub price: Decimal,
    // Derived from capacity, see `Room::set_capacity`
    pub available: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Room {
    pub fn new(
        room_id: String,
        name: &str,
        capacity: u32,
        price: Decimal,
        images: Vec<String>,
    ) -> Self {
        let name = name.trim();
        Self {
            room_id,
            name: if name.is_empty() {
                DEFAULT_ROOM_NAME.to_string()
            } else {
                name.to_string()
            },
            capacity,
            price,
            available: capacity > 0,
            images,
        }
    }

    pub fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
        self.available = capacity > 0;
    }

    pub fn is_available(&self) -> bool {
        self.available && self.capacity > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => f.write_str("Unpaid"),
        }
    }
}

// A stored booking. Field names double as the queue message schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub room_id: String,
    pub room_name: String,
    pub name: String,
    pub email: String,
    pub days: u32,
    pub people: u32,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub price_before_discount: Decimal,
    pub final_price: Decimal,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub discount_reason: Option<String>,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub booked_on: NaiveDateTime,
    pub booked_by_email: String,
}

// Customer input for a new booking, as collected by the booking form
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub room_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub party_size: u32,
    pub stay_days: u32,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub payment_method: Option<String>,
    // Email of the authenticated session, not necessarily the contact email
    pub requester: String,
}

impl BookingRequest {
    pub fn payment_method(&self) -> &str {
        match self.payment_method.as_deref().map(str::trim) {
            Some(method) if !method.is_empty() => method,
            _ => DEFAULT_PAYMENT_METHOD,
        }
    }
}
