//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into core services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::{
    DEFAULT_CALLED_BOARD_SIZE, DEFAULT_OTP_TTL_SECS, DEFAULT_TOKEN_NUMBER_START,
    DEFAULT_UPDATE_RETRY_BUDGET,
};
use crate::error::{QueueError, QueueResult};
use chrono::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    token_number_start: u64,
    called_board_size: usize,
    update_retry_budget: u32,
    otp_ttl: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidInput` if the token number start is zero,
    /// the called board is empty, the retry budget is zero, or the one-time
    /// code TTL is not positive.
    pub fn new(
        token_number_start: u64,
        called_board_size: usize,
        update_retry_budget: u32,
        otp_ttl: Duration,
    ) -> QueueResult<Self> {
        if token_number_start == 0 {
            return Err(QueueError::InvalidInput(
                "token_number_start must be at least 1".into(),
            ));
        }
        if called_board_size == 0 {
            return Err(QueueError::InvalidInput(
                "called_board_size must be at least 1".into(),
            ));
        }
        if update_retry_budget == 0 {
            return Err(QueueError::InvalidInput(
                "update_retry_budget must be at least 1".into(),
            ));
        }
        if otp_ttl <= Duration::zero() {
            return Err(QueueError::InvalidInput(
                "otp_ttl must be positive".into(),
            ));
        }

        Ok(Self {
            token_number_start,
            called_board_size,
            update_retry_budget,
            otp_ttl,
        })
    }

    /// Configuration with all defaults, suitable for most deployments.
    pub fn standard() -> Self {
        Self {
            token_number_start: DEFAULT_TOKEN_NUMBER_START,
            called_board_size: DEFAULT_CALLED_BOARD_SIZE,
            update_retry_budget: DEFAULT_UPDATE_RETRY_BUDGET,
            otp_ttl: Duration::seconds(DEFAULT_OTP_TTL_SECS),
        }
    }

    pub fn token_number_start(&self) -> u64 {
        self.token_number_start
    }

    pub fn called_board_size(&self) -> usize {
        self.called_board_size
    }

    pub fn update_retry_budget(&self) -> u32 {
        self.update_retry_budget
    }

    pub fn otp_ttl(&self) -> Duration {
        self.otp_ttl
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parse a positive integer from an optional environment-variable value.
///
/// If `value` is `None` or empty/whitespace, returns `default`. Binaries use
/// this at startup so the parsing rules stay in one place.
pub fn u64_from_env_value(
    name: &'static str,
    value: Option<String>,
    default: u64,
) -> QueueResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        None => Ok(default),
        Some(v) => v.parse::<u64>().map_err(|e| {
            QueueError::InvalidInput(format!("{} must be a positive integer: {}", name, e))
        }),
    }
}

/// Parse a duration in whole seconds from an optional environment-variable
/// value, falling back to `default_secs`.
pub fn duration_from_env_value(
    name: &'static str,
    value: Option<String>,
    default_secs: i64,
) -> QueueResult<Duration> {
    let secs = u64_from_env_value(name, value, default_secs as u64)?;
    Ok(Duration::seconds(secs as i64))
}
