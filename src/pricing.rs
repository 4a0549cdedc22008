// Pricing engine: stacked festival, weekend and long-stay discounts
//
// Every stage discounts the already-discounted running price and the result of
// each stage is rounded to cents (half-up) before the next stage sees it.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const FESTIVAL_RATES: &[(&str, Decimal)] = &[
    ("Christmas", dec!(0.15)),
    ("NewYear", dec!(0.20)),
    ("Diwali", dec!(0.10)),
];

const WEEKEND_RATE: Decimal = dec!(0.10);
const WEEKEND_REASON: &str = "Weekend Offer";

pub const REASON_SEPARATOR: &str = " + ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub reason: String,
    // Percent of the running price at this stage, e.g. 10 for 10%
    pub percent: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub base_price: Decimal,
    pub discounts: Vec<AppliedDiscount>,
    pub final_price: Decimal,
    pub total_discount_percent: Decimal,
    pub total_discount_amount: Decimal,
}

impl Quote {
    pub fn discount_reason(&self) -> Option<String> {
        if self.discounts.is_empty() {
            return None;
        }

        Some(
            self.discounts
                .iter()
                .map(|d| d.reason.as_str())
                .collect::<Vec<_>>()
                .join(REASON_SEPARATOR),
        )
    }
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

pub fn festival_rate(event: &str) -> Option<Decimal> {
    FESTIVAL_RATES
        .iter()
        .find(|(name, _)| *name == event)
        .map(|(_, rate)| *rate)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn long_stay_discount(stay_days: u32) -> Option<(Decimal, &'static str)> {
    if stay_days >= 7 {
        Some((dec!(0.10), "Long-Stay (7+ days)"))
    } else if stay_days >= 3 {
        Some((dec!(0.05), "Long-Stay (3+ days)"))
    } else {
        None
    }
}

// Running price threaded through the discount stages
struct PriceRun {
    price: Decimal,
    discounts: Vec<AppliedDiscount>,
}

impl PriceRun {
    fn apply(&mut self, rate: Decimal, reason: String) {
        let discounted = round_money(self.price * (Decimal::ONE - rate));
        self.discounts.push(AppliedDiscount {
            reason,
            percent: (rate * dec!(100)).normalize(),
            amount: self.price - discounted,
        });
        self.price = discounted;
    }
}

/// Prices a stay. Never fails: unknown events, weekdays and short stays
/// just contribute no discount.
pub fn compute_price(
    base_price: Decimal,
    event: Option<&str>,
    is_weekend: bool,
    stay_days: u32,
) -> Quote {
    let base_price = round_money(base_price.max(Decimal::ZERO));
    let mut run = PriceRun {
        price: base_price,
        discounts: Vec::with_capacity(3),
    };

    if let Some((event, rate)) = event.and_then(|e| festival_rate(e).map(|r| (e, r))) {
        run.apply(rate, format!("Festival: {event}"));
    }

    if is_weekend {
        run.apply(WEEKEND_RATE, WEEKEND_REASON.to_string());
    }

    if let Some((rate, reason)) = long_stay_discount(stay_days) {
        run.apply(rate, reason.to_string());
    }

    let final_price = run.price;
    let total_discount_amount = base_price - final_price;
    let total_discount_percent = if base_price > Decimal::ZERO {
        round_percent(total_discount_amount / base_price * dec!(100))
    } else {
        Decimal::ZERO
    };

    Quote {
        base_price,
        discounts: run.discounts,
        final_price,
        total_discount_percent,
        total_discount_amount,
    }
}
