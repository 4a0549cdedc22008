// Application configuration, read from the environment at startup

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::admission::{AdmissionConfig, RetryConfig};
use crate::email::SmtpConfig;
use crate::error::ConfigError;
use crate::images::StorageConfig;
use crate::notification::QueueConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub admission: AdmissionConfig,
    pub queue: QueueConfig,
    // No SMTP relay configured means confirmations stay in the in-memory outbox
    pub smtp: Option<SmtpConfig>,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    // Same as `from_env` with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let lookup = |name: &str| lookup(name).map(|v| v.trim().to_string());

        let promo_event = match lookup("STAYWISE_PROMO_EVENT") {
            Some(event) if event.is_empty() => None,
            Some(event) => Some(event),
            None => defaults.admission.promo_event.clone(),
        };

        let retry_defaults = &defaults.admission.retry;
        let retry = RetryConfig {
            max_retries: parse_or(&lookup, "STAYWISE_MAX_RETRIES", retry_defaults.max_retries)?,
            initial_backoff_ms: parse_or(
                &lookup,
                "STAYWISE_INITIAL_BACKOFF_MS",
                retry_defaults.initial_backoff_ms,
            )?,
            max_backoff_ms: parse_or(
                &lookup,
                "STAYWISE_MAX_BACKOFF_MS",
                retry_defaults.max_backoff_ms,
            )?,
            ..retry_defaults.clone()
        };

        let mut queue = defaults.queue.clone();
        queue.url = lookup("STAYWISE_QUEUE_URL").filter(|url| !url.is_empty());
        queue.timeout_ms = parse_or(&lookup, "STAYWISE_QUEUE_TIMEOUT_MS", queue.timeout_ms)?;
        queue.circuit_breaker.failure_threshold = parse_or(
            &lookup,
            "STAYWISE_QUEUE_FAILURE_THRESHOLD",
            queue.circuit_breaker.failure_threshold,
        )?;
        queue.circuit_breaker.reset_timeout_ms = parse_or(
            &lookup,
            "STAYWISE_QUEUE_RESET_TIMEOUT_MS",
            queue.circuit_breaker.reset_timeout_ms,
        )?;

        let smtp = match lookup("STAYWISE_SMTP_HOST").filter(|h| !h.is_empty()) {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_or(&lookup, "STAYWISE_SMTP_PORT", 587)?,
                username: required(&lookup, "STAYWISE_SMTP_USERNAME")?,
                password: required(&lookup, "STAYWISE_SMTP_PASSWORD")?,
                from_email: required(&lookup, "STAYWISE_SMTP_FROM")?,
                from_name: lookup("STAYWISE_SMTP_FROM_NAME")
                    .unwrap_or_else(|| "StayWise".to_string()),
            }),
            None => None,
        };

        let storage = StorageConfig {
            bucket: lookup("STAYWISE_IMAGE_BUCKET").unwrap_or(defaults.storage.bucket),
            domain: lookup("STAYWISE_IMAGE_DOMAIN").unwrap_or(defaults.storage.domain),
        };

        Ok(Self {
            admission: AdmissionConfig { promo_event, retry },
            queue,
            smtp,
            storage,
        })
    }
}

fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) if value.is_empty() => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing(name.to_string()))
}
