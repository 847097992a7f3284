//! Token issuance engine.
//!
//! Turns a verified patient plus a doctor choice into a queued token. The
//! engine validates the doctor against the staffing directory and its
//! capacity limit, then delegates numbering to the store's atomic allocator.
//! Priority is carried on the token as a projection sort key only; it never
//! influences the allocation sequence.

use crate::directory::{DoctorDirectory, PatientRecord};
use crate::error::{QueueError, QueueResult};
use crate::store::{TokenFilter, TokenStore};
use crate::token::{Priority, Token, TokenDraft};
use medq_types::NonEmptyText;
use std::sync::Arc;
use uuid::Uuid;

/// Issues queue tokens for verified patients.
pub struct IssuanceEngine {
    store: Arc<dyn TokenStore>,
    doctors: Arc<dyn DoctorDirectory>,
}

impl IssuanceEngine {
    pub fn new(store: Arc<dyn TokenStore>, doctors: Arc<dyn DoctorDirectory>) -> Self {
        Self { store, doctors }
    }

    /// Issues a token: status `waiting`, number from the atomic allocator,
    /// patient snapshot denormalised onto the token.
    ///
    /// # Errors
    ///
    /// - `QueueError::NotFound` when the doctor id is unknown.
    /// - `QueueError::InvalidInput` when the doctor does not belong to the
    ///   requested specialization.
    /// - `QueueError::CapacityExceeded` when the doctor already has their
    ///   maximum number of open (waiting or called) tokens.
    pub fn issue(
        &self,
        patient: &PatientRecord,
        symptoms: NonEmptyText,
        specialization: &str,
        doctor_id: Uuid,
        priority: Priority,
    ) -> QueueResult<Token> {
        let doctor = self
            .doctors
            .find(doctor_id)
            .ok_or_else(|| QueueError::NotFound {
                entity: "doctor",
                id: doctor_id.to_string(),
            })?;

        if !doctor.specialization.eq_ignore_ascii_case(specialization) {
            return Err(QueueError::InvalidInput(format!(
                "doctor '{}' covers {}, not {}",
                doctor.name, doctor.specialization, specialization
            )));
        }

        if let Some(capacity) = doctor.capacity {
            let open = self
                .store
                .list(&TokenFilter {
                    doctor_id: Some(doctor.id),
                    ..TokenFilter::default()
                })?
                .iter()
                .filter(|t| t.status.is_open())
                .count();
            if open >= capacity as usize {
                return Err(QueueError::CapacityExceeded {
                    doctor_name: doctor.name,
                    capacity,
                });
            }
        }

        let token = self.store.allocate(TokenDraft {
            patient_id: patient.id,
            patient_name: patient.full_name.clone(),
            phone: patient.phone.clone(),
            symptoms: symptoms.as_str().to_owned(),
            // Canonical casing comes from the directory, not caller input.
            specialization: doctor.specialization.clone(),
            doctor_id: doctor.id,
            doctor_name: doctor.name.clone(),
            priority,
        })?;

        tracing::info!(
            "issued token {} for {} with {} ({})",
            token.token_number,
            token.patient_name,
            token.doctor_name,
            token.priority
        );
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::directory::{DoctorProfile, Gender, YamlDoctorDirectory};
    use crate::store::MemoryTokenStore;
    use crate::token::{TokenStatus, Transition};
    use chrono::NaiveDate;

    fn verified_patient() -> PatientRecord {
        PatientRecord {
            id: Uuid::new_v4(),
            full_name: "Nusrat Jahan".into(),
            gender: Gender::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 17).expect("valid date"),
            phone: "0171234567".into(),
            national_id_masked: "********3321".into(),
            address: "12 Green Road, Dhaka".into(),
        }
    }

    fn cardiologist(capacity: Option<u32>) -> DoctorProfile {
        DoctorProfile {
            id: Uuid::new_v4(),
            name: "Dr Ayesha Rahman".into(),
            specialization: "Cardiology".into(),
            capacity,
        }
    }

    fn engine_with(doctor: DoctorProfile) -> (IssuanceEngine, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new(&CoreConfig::standard()));
        let doctors = Arc::new(YamlDoctorDirectory::from_doctors(vec![doctor]));
        (IssuanceEngine::new(store.clone(), doctors), store)
    }

    #[test]
    fn test_issue_creates_waiting_token_with_patient_snapshot() {
        let doctor = cardiologist(None);
        let doctor_id = doctor.id;
        let (engine, _store) = engine_with(doctor);
        let patient = verified_patient();

        let token = engine
            .issue(
                &patient,
                NonEmptyText::new("chest pain").expect("non-empty"),
                "cardiology",
                doctor_id,
                Priority::Normal,
            )
            .expect("issue should succeed");

        assert_eq!(token.status, TokenStatus::Waiting);
        assert_eq!(token.token_number, 1);
        assert_eq!(token.patient_name, patient.full_name);
        assert_eq!(token.phone, patient.phone);
        // Casing is normalised from the directory.
        assert_eq!(token.specialization, "Cardiology");
    }

    #[test]
    fn test_issue_rejects_doctor_outside_specialization() {
        let doctor = cardiologist(None);
        let doctor_id = doctor.id;
        let (engine, _store) = engine_with(doctor);

        let err = engine
            .issue(
                &verified_patient(),
                NonEmptyText::new("rash").expect("non-empty"),
                "Dermatology",
                doctor_id,
                Priority::Normal,
            )
            .expect_err("mismatched specialization should fail");
        assert!(matches!(err, QueueError::InvalidInput(_)));
    }

    #[test]
    fn test_issue_rejects_unknown_doctor() {
        let (engine, _store) = engine_with(cardiologist(None));

        let err = engine
            .issue(
                &verified_patient(),
                NonEmptyText::new("chest pain").expect("non-empty"),
                "Cardiology",
                Uuid::new_v4(),
                Priority::Normal,
            )
            .expect_err("unknown doctor should fail");
        assert!(matches!(err, QueueError::NotFound { entity: "doctor", .. }));
    }

    #[test]
    fn test_issue_enforces_doctor_capacity_on_open_tokens() {
        let doctor = cardiologist(Some(2));
        let doctor_id = doctor.id;
        let (engine, store) = engine_with(doctor);
        let patient = verified_patient();
        let symptoms = NonEmptyText::new("chest pain").expect("non-empty");

        let first = engine
            .issue(&patient, symptoms.clone(), "Cardiology", doctor_id, Priority::Normal)
            .expect("first issue should succeed");
        engine
            .issue(&patient, symptoms.clone(), "Cardiology", doctor_id, Priority::Normal)
            .expect("second issue should succeed");

        let err = engine
            .issue(&patient, symptoms.clone(), "Cardiology", doctor_id, Priority::Normal)
            .expect_err("third issue should exceed capacity");
        assert!(matches!(err, QueueError::CapacityExceeded { capacity: 2, .. }));

        // A completed token frees a slot: call then complete the first.
        store
            .update(first.id, Transition::Call)
            .expect("call should succeed");
        store
            .update(first.id, Transition::Complete)
            .expect("complete should succeed");

        engine
            .issue(&patient, symptoms, "Cardiology", doctor_id, Priority::Normal)
            .expect("issue should succeed once a slot is free");
    }

    #[test]
    fn test_priority_does_not_affect_numbering() {
        let doctor = cardiologist(None);
        let doctor_id = doctor.id;
        let (engine, _store) = engine_with(doctor);
        let patient = verified_patient();

        let normal = engine
            .issue(
                &patient,
                NonEmptyText::new("chest pain").expect("non-empty"),
                "Cardiology",
                doctor_id,
                Priority::Normal,
            )
            .expect("issue should succeed");
        let emergency = engine
            .issue(
                &patient,
                NonEmptyText::new("severe chest pain").expect("non-empty"),
                "Cardiology",
                doctor_id,
                Priority::Emergency,
            )
            .expect("issue should succeed");

        assert_eq!(normal.token_number, 1);
        assert_eq!(emergency.token_number, 2, "numbering is allocation order");
    }
}
