// Customer confirmation email

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::EmailError;
use crate::models::Booking;

const BOOKED_ON_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub struct ConfirmationEmail;

impl ConfirmationEmail {
    pub fn subject(booking: &Booking) -> String {
        format!("StayWise Booking Confirmed - {}", booking.room_name)
    }

    pub fn body(booking: &Booking) -> String {
        format!(
            "Hello {name},\n\
             \n\
             Your booking has been confirmed successfully!\n\
             \n\
             Room: {room}\n\
             Base Price: €{base}\n\
             Final Price: €{final_price}\n\
             Discount: {percent}% ({reason})\n\
             Payment Method: {method}\n\
             Payment Status: {status}\n\
             Booked On: {booked_on}\n\
             \n\
             Thank you for booking with StayWise!\n\
             We look forward to hosting you soon.\n",
            name = booking.name,
            room = booking.room_name,
            base = booking.price_before_discount,
            final_price = booking.final_price,
            percent = booking.discount_percent,
            reason = booking.discount_reason.as_deref().unwrap_or("-"),
            method = booking.payment_method,
            status = booking.payment_status,
            booked_on = booking.booked_on.format(BOOKED_ON_FORMAT),
        )
    }

    pub fn for_booking(booking: &Booking) -> Result<OutgoingEmail, EmailError> {
        let to = booking.email.trim();
        if to.is_empty() {
            return Err(EmailError::MissingRecipient(booking.booking_id.clone()));
        }

        Ok(OutgoingEmail {
            to: to.to_string(),
            subject: Self::subject(booking),
            body: Self::body(booking),
        })
    }
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let address: Address = config
            .from_email
            .parse()
            .map_err(|_| EmailError::InvalidAddress(config.from_email.clone()))?;
        let from = Mailbox::new(Some(config.from_name.clone()), address);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        Ok(())
    }
}

// Keeps sent mail in memory; used when no SMTP relay is configured
#[derive(Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_all: AtomicBool,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for MemoryOutbox {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(EmailError::Transport("simulated SMTP outage".to_string()));
        }
        self.sent.lock().push(email.clone());
        Ok(())
    }
}
