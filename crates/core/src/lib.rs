//! # MedQ Core
//!
//! Core business logic for the MedQ hospital queue and token system.
//!
//! This crate contains the queue state and the services around it:
//! - Identity verification (document and phone channels)
//! - Symptom-to-specialization resolution
//! - Token issuance with atomic, gap-free numbering
//! - Status transitions with a token-called event stream
//! - Staff and display-board projections over the token store
//!
//! **No API concerns**: HTTP servers, serialised wire formats and request
//! handling belong in `api-rest`; this crate is callable from any surface
//! (registration kiosk, staff console, display board) concurrently.

pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod issuance;
pub mod projection;
pub mod resolver;
pub mod store;
pub mod token;
pub mod transitions;
pub mod validation;
pub mod verification;

pub use config::CoreConfig;
pub use directory::{
    DoctorDirectory, DoctorProfile, Gender, PatientDirectory, PatientProfile, PatientRecord,
    YamlDoctorDirectory, YamlPatientDirectory,
};
pub use error::{QueueError, QueueResult};
pub use issuance::IssuanceEngine;
pub use medq_types::{DigitString, NonEmptyText, TextError};
pub use projection::{OperationalFilter, OperationalSort, QueueProjection};
pub use resolver::{KeywordSymptomIndex, Specialization, SpecializationResolver, SymptomSource};
pub use store::{MemoryTokenStore, TokenFilter, TokenStore};
pub use token::{token_label, Priority, Token, TokenCalled, TokenDraft, TokenStatus, Transition};
pub use transitions::StatusTransitionManager;
pub use verification::{
    BiometricOutcome, CodeDispatcher, CodeIssue, IdentityVerificationService, LogCodeDispatcher,
};

use std::sync::Arc;

/// The assembled queue core: one store, every service wired to it.
///
/// Binaries construct this once at startup and share it across request
/// handlers; all services are safe to call concurrently.
pub struct QueueCore {
    verification: IdentityVerificationService,
    resolver: SpecializationResolver,
    issuance: IssuanceEngine,
    transitions: StatusTransitionManager,
    projection: QueueProjection,
}

impl QueueCore {
    /// Wires the services around a fresh in-memory token store.
    pub fn new(
        cfg: &CoreConfig,
        patients: Arc<dyn PatientDirectory>,
        doctors: Arc<dyn DoctorDirectory>,
        dispatcher: Arc<dyn CodeDispatcher>,
    ) -> Self {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new(cfg));
        Self::with_store(cfg, store, patients, doctors, dispatcher)
    }

    /// Wires the services around any store satisfying the [`TokenStore`]
    /// contract (e.g. a durable backend).
    pub fn with_store(
        cfg: &CoreConfig,
        store: Arc<dyn TokenStore>,
        patients: Arc<dyn PatientDirectory>,
        doctors: Arc<dyn DoctorDirectory>,
        dispatcher: Arc<dyn CodeDispatcher>,
    ) -> Self {
        Self {
            verification: IdentityVerificationService::new(patients, dispatcher, cfg.otp_ttl()),
            resolver: SpecializationResolver::with_builtin_index(),
            issuance: IssuanceEngine::new(store.clone(), doctors),
            transitions: StatusTransitionManager::new(store.clone()),
            projection: QueueProjection::new(store, cfg.called_board_size()),
        }
    }

    pub fn verification(&self) -> &IdentityVerificationService {
        &self.verification
    }

    pub fn resolver(&self) -> &SpecializationResolver {
        &self.resolver
    }

    pub fn issuance(&self) -> &IssuanceEngine {
        &self.issuance
    }

    pub fn transitions(&self) -> &StatusTransitionManager {
        &self.transitions
    }

    pub fn projection(&self) -> &QueueProjection {
        &self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn assembled_core() -> (QueueCore, Uuid) {
        let doctor_id = Uuid::new_v4();
        let doctors = YamlDoctorDirectory::from_doctors(vec![DoctorProfile {
            id: doctor_id,
            name: "Dr Ayesha Rahman".into(),
            specialization: "Cardiology".into(),
            capacity: None,
        }]);
        let patients = YamlPatientDirectory::from_profiles(vec![PatientProfile {
            id: Uuid::new_v4(),
            full_name: "Nusrat Jahan".into(),
            gender: Gender::Female,
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 17).expect("valid date"),
            phone: "0171234567".into(),
            national_id: "201187643321".into(),
            address: "12 Green Road, Dhaka".into(),
        }]);

        let core = QueueCore::new(
            &CoreConfig::standard(),
            Arc::new(patients),
            Arc::new(doctors),
            Arc::new(LogCodeDispatcher),
        );
        (core, doctor_id)
    }

    #[test]
    fn test_full_flow_from_verification_to_display_board() {
        let (core, doctor_id) = assembled_core();

        let patient = core
            .verification()
            .verify_document("201187643321", BiometricOutcome::Confirmed)
            .expect("verification should succeed");

        let ranked = core
            .resolver()
            .resolve("chest pain and palpitations")
            .expect("resolution should succeed");
        assert_eq!(ranked[0].name, "Cardiology");

        let token = core
            .issuance()
            .issue(
                &patient,
                NonEmptyText::new("chest pain and palpitations").expect("non-empty"),
                &ranked[0].name,
                doctor_id,
                Priority::Normal,
            )
            .expect("issue should succeed");
        assert_eq!(token.token_number, 1);

        let mut announcements = core.transitions().subscribe();
        core.transitions()
            .call(token.id)
            .expect("call should succeed");
        assert_eq!(
            announcements
                .try_recv()
                .expect("announcement should be pending")
                .token_number,
            1
        );

        let board = core.projection().public_view().expect("view should succeed");
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].status, TokenStatus::Called);

        core.transitions()
            .complete(token.id)
            .expect("complete should succeed");
        assert!(core
            .projection()
            .public_view()
            .expect("view should succeed")
            .is_empty());
    }
}
