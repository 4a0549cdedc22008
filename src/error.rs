// Error types shared across the booking core

use thiserror::Error;

// Failures of the document store backing rooms and bookings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    // Conditional write rejected because the stored value moved under us
    #[error("Conditional update failed for {key}: expected {expected}, found {found}")]
    Conflict {
        key: String,
        expected: u32,
        found: u32,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

// Outcomes of a rejected booking submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room {0} is fully booked")]
    RoomUnavailable(String),

    #[error("{}", capacity_message(.capacity, .requested, .contended))]
    CapacityExceeded {
        capacity: u32,
        requested: u32,
        // Seats kept changing under concurrent bookings until retries ran out
        contended: bool,
    },

    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),

    #[error("Booking could not be stored: {0}")]
    PersistenceFailure(#[from] StoreError),
}

fn capacity_message(capacity: &u32, requested: &u32, contended: &bool) -> String {
    if *contended {
        format!(
            "Room is being booked by other guests right now \
             ({capacity} places left, {requested} requested), please try again"
        )
    } else {
        format!("Only {capacity} people allowed for this room, requested {requested}")
    }
}

impl AdmissionError {
    // Validation failures are reported back to the customer, nothing was written
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AdmissionError::PersistenceFailure(_))
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Queue unreachable: {0}")]
    Transport(String),

    #[error("Queue rejected message: {status_code} - {message}")]
    Rejected { status_code: u16, message: String },

    #[error("Queue request timeout after {0}ms")]
    Timeout(u64),

    #[error("Circuit breaker open for {queue}")]
    CircuitOpen { queue: String },

    #[error("Message encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Queue closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("No recipient address on booking {0}")]
    MissingRecipient(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Message build error: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    #[error("Delete failed for {key}: {message}")]
    Delete { key: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(String),
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Mailer setup failed: {0}")]
    Mailer(#[from] EmailError),
}
