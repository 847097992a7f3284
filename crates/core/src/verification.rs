//! Identity verification service.
//!
//! Two interchangeable channels resolve a credential to a verified patient
//! record:
//!
//! - **Document-based**: a 12-digit national id plus the outcome of the
//!   kiosk's biometric confirmation. The device interaction itself is a
//!   kiosk concern; the core receives a single [`BiometricOutcome`] event.
//! - **Phone-based**: a 10-digit phone number; a one-time code is generated
//!   here and handed to the out-of-band delivery collaborator
//!   ([`CodeDispatcher`]), then checked by [`confirm_code`].
//!
//! Verification has no token side effects: it only reads the patient
//! directory and returns a [`PatientRecord`].
//!
//! [`confirm_code`]: IdentityVerificationService::confirm_code

use crate::directory::{PatientDirectory, PatientRecord};
use crate::error::{QueueError, QueueResult};
use crate::validation::{validate_code, validate_national_id, validate_phone, OneTimeCode, PhoneNumber};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Outcome of the kiosk's biometric confirmation step.
///
/// Modelled as a single succeed-or-fail event; no intermediate device states
/// are exposed to the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometricOutcome {
    Confirmed,
    Rejected,
}

/// Out-of-band delivery seam for one-time codes (SMS gateway, ward pager).
///
/// The core never returns a code to the requesting caller; delivery happens
/// through this collaborator only.
pub trait CodeDispatcher: Send + Sync {
    fn dispatch(&self, phone: &PhoneNumber, code: &OneTimeCode) -> QueueResult<()>;
}

/// Dispatcher that logs deliveries through `tracing`.
///
/// Stands in for a real SMS gateway in development deployments; the code is
/// visible in the server log only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCodeDispatcher;

impl CodeDispatcher for LogCodeDispatcher {
    fn dispatch(&self, phone: &PhoneNumber, code: &OneTimeCode) -> QueueResult<()> {
        tracing::info!("one-time code for {}: {}", phone, code);
        Ok(())
    }
}

/// Receipt returned by [`IdentityVerificationService::issue_code`].
///
/// Carries the expiry so the kiosk can show a countdown; the code itself went
/// out of band.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodeIssue {
    pub phone: PhoneNumber,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct PendingCode {
    code: OneTimeCode,
    expires_at: DateTime<Utc>,
}

/// Resolves identity credentials to patient records.
pub struct IdentityVerificationService {
    patients: Arc<dyn PatientDirectory>,
    dispatcher: Arc<dyn CodeDispatcher>,
    pending: Mutex<HashMap<String, PendingCode>>,
    otp_ttl: Duration,
}

impl IdentityVerificationService {
    pub fn new(
        patients: Arc<dyn PatientDirectory>,
        dispatcher: Arc<dyn CodeDispatcher>,
        otp_ttl: Duration,
    ) -> Self {
        Self {
            patients,
            dispatcher,
            pending: Mutex::new(HashMap::new()),
            otp_ttl,
        }
    }

    /// Verifies a patient by national id and biometric confirmation.
    ///
    /// The credential format is checked before any lookup.
    ///
    /// # Errors
    ///
    /// - `QueueError::InvalidFormat` for a malformed national id.
    /// - `QueueError::BiometricRejected` when the confirmation step failed.
    /// - `QueueError::NotFound` when no profile carries this id.
    pub fn verify_document(
        &self,
        national_id: &str,
        outcome: BiometricOutcome,
    ) -> QueueResult<PatientRecord> {
        let national_id = validate_national_id(national_id)?;

        if outcome == BiometricOutcome::Rejected {
            return Err(QueueError::BiometricRejected);
        }

        let profile = self
            .patients
            .find_by_national_id(national_id.as_str())
            .ok_or_else(|| QueueError::NotFound {
                entity: "patient",
                id: national_id.to_string(),
            })?;

        Ok(profile.into_record())
    }

    /// Issues a one-time code for phone-based verification.
    ///
    /// The code is generated here, stored with its expiry, and handed to the
    /// dispatcher for out-of-band delivery. Re-issuing for the same phone
    /// replaces any pending code.
    ///
    /// # Errors
    ///
    /// - `QueueError::InvalidFormat` for a malformed phone number.
    /// - `QueueError::NotFound` when no profile carries this phone number.
    pub fn issue_code(&self, phone: &str) -> QueueResult<CodeIssue> {
        let phone = validate_phone(phone)?;

        if self.patients.find_by_phone(phone.as_str()).is_none() {
            return Err(QueueError::NotFound {
                entity: "patient",
                id: phone.to_string(),
            });
        }

        let code = generate_code()?;
        let expires_at = Utc::now() + self.otp_ttl;

        self.dispatcher.dispatch(&phone, &code)?;

        let mut pending = self
            .pending
            .lock()
            .map_err(|_| QueueError::Internal("pending code lock poisoned".into()))?;
        pending.insert(
            phone.as_str().to_owned(),
            PendingCode { code, expires_at },
        );

        tracing::debug!("issued one-time code to {}", phone);
        Ok(CodeIssue { phone, expires_at })
    }

    /// Confirms a one-time code and resolves the phone number to a patient.
    ///
    /// A successful confirmation consumes the pending code; an expired code
    /// is removed; a mismatched code stays pending until it expires.
    ///
    /// # Errors
    ///
    /// - `QueueError::InvalidFormat` for a malformed phone number or code.
    /// - `QueueError::InvalidCode` when no code is pending for this phone or
    ///   the supplied code does not match.
    /// - `QueueError::ExpiredCode` past the configured TTL.
    /// - `QueueError::NotFound` when the profile disappeared from the
    ///   directory between issue and confirmation.
    pub fn confirm_code(&self, phone: &str, code: &str) -> QueueResult<PatientRecord> {
        let phone = validate_phone(phone)?;
        let code = validate_code(code)?;

        {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| QueueError::Internal("pending code lock poisoned".into()))?;

            let entry = pending
                .get(phone.as_str())
                .cloned()
                .ok_or(QueueError::InvalidCode)?;

            if Utc::now() > entry.expires_at {
                pending.remove(phone.as_str());
                return Err(QueueError::ExpiredCode);
            }
            if entry.code != code {
                return Err(QueueError::InvalidCode);
            }

            pending.remove(phone.as_str());
        }

        let profile = self
            .patients
            .find_by_phone(phone.as_str())
            .ok_or_else(|| QueueError::NotFound {
                entity: "patient",
                id: phone.to_string(),
            })?;

        Ok(profile.into_record())
    }
}

fn generate_code() -> QueueResult<OneTimeCode> {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    let rendered = format!("{:06}", value);
    OneTimeCode::parse(&rendered)
        .map_err(|e| QueueError::Internal(format!("generated code failed validation: {}", e)))
}
