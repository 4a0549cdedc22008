// StayWise booking core: room inventory, stacked-discount pricing and booking admission

pub mod admission;
pub mod app;
pub mod circuit_breaker;
pub mod config;
pub mod dashboard;
pub mod email;
pub mod error;
pub mod images;
pub mod models;
pub mod notification;
pub mod pricing;
pub mod store;

// Re-export key types for convenience
pub use admission::{Admission, AdmissionConfig, BookingService, Clock, RetryConfig, SystemClock};
pub use app::App;
pub use config::AppConfig;
pub use error::{AdmissionError, EmailError, NotificationError, StoreError};
pub use models::{Booking, BookingRequest, PaymentStatus, Room};
pub use pricing::{compute_price, Quote};
pub use store::{BookingRepository, MemoryBookingStore, MemoryRoomStore, RoomRepository};
