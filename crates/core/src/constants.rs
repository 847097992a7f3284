//! Constants used throughout the MedQ core crate.
//!
//! This module contains numbering, credential-format and queue-sizing
//! constants to ensure consistency across the codebase and make maintenance
//! easier.

/// First token number handed out by a fresh store.
pub const DEFAULT_TOKEN_NUMBER_START: u64 = 1;

/// How many recently-called tokens the public display board shows.
pub const DEFAULT_CALLED_BOARD_SIZE: usize = 3;

/// How many times an optimistic token update is retried before the store
/// reports contention.
pub const DEFAULT_UPDATE_RETRY_BUDGET: u32 = 8;

/// Length of a national identity number, in digits.
pub const NATIONAL_ID_LEN: usize = 12;

/// Length of a patient phone number, in digits.
pub const PHONE_LEN: usize = 10;

/// Length of a one-time verification code, in digits.
pub const OTP_CODE_LEN: usize = 6;

/// How long an issued one-time code stays valid, in seconds.
pub const DEFAULT_OTP_TTL_SECS: i64 = 300;

/// Capacity of the token-called broadcast channel. A slow announcement
/// subscriber lags rather than blocking status transitions.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Default doctor directory seed file when no explicit path is configured.
pub const DEFAULT_DOCTORS_FILE: &str = "seed/doctors.yaml";

/// Default patient directory seed file when no explicit path is configured.
pub const DEFAULT_PATIENTS_FILE: &str = "seed/patients.yaml";
