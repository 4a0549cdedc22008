// Local demo: wires the booking core from the environment, books a stay and
// prints the manager dashboard.

use anyhow::Context;
use chrono::{Duration, Local};
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::EnvFilter;

use staywise::models::Booking;
use staywise::{App, AppConfig, BookingRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let (app, local_queue) = App::build(config).context("building application")?;

    // Stand-in for the notification worker when no remote queue is configured
    if let Some(mut rx) = local_queue {
        tokio::spawn(async move {
            while let Some(body) = rx.recv().await {
                match serde_json::from_str::<Booking>(&body) {
                    Ok(booking) => info!(
                        booking_id = %booking.booking_id,
                        room = %booking.room_name,
                        final_price = %booking.final_price,
                        "new booking alert"
                    ),
                    Err(e) => info!(error = %e, "unreadable booking message"),
                }
            }
        });
    }

    let room_id = app
        .rooms
        .create("Garden Double", 2, dec!(85.00), vec![])
        .await?;

    let checkin = Local::now().date_naive() + Duration::days(14);
    let booking = app
        .booking_service
        .submit_booking(BookingRequest {
            room_id,
            customer_name: "Demo Guest".to_string(),
            customer_email: "guest@example.com".to_string(),
            party_size: 2,
            stay_days: 3,
            checkin,
            checkout: checkin + Duration::days(3),
            payment_method: None,
            requester: "guest@example.com".to_string(),
        })
        .await?;

    info!(
        booking_id = %booking.booking_id,
        base = %booking.price_before_discount,
        final_price = %booking.final_price,
        reason = booking.discount_reason.as_deref().unwrap_or("-"),
        "booking confirmed"
    );

    let view = app.dashboard.manager_view().await?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}
