//! Doctor and patient directory collaborators.
//!
//! The queue core does not own clinical staffing or patient registration;
//! both live in external systems. This module defines the seams the core
//! consumes them through ([`DoctorDirectory`], [`PatientDirectory`]) plus
//! YAML-file-backed implementations used by the binaries and the test suite.
//!
//! ## Seed file layout
//!
//! Both files are plain YAML lists:
//!
//! ```text
//! # doctors.yaml
//! - id: 7d7a05ef-0f3f-4b36-9fcd-4cb1a0d3b6f1
//!   name: Dr Ayesha Rahman
//!   specialization: Cardiology
//!   capacity: 20
//! ```
//!
//! A missing `capacity` means the doctor accepts an unbounded queue.

use crate::error::{QueueError, QueueResult};
use crate::validation::mask_national_id;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Patient gender as recorded in the profile directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
    Unknown,
}

/// A patient profile as held by the external registration system.
///
/// This is directory data, not queue state: the verification service reads
/// profiles to resolve credentials and snapshots the relevant fields onto a
/// [`PatientRecord`](crate::directory::PatientRecord).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    pub national_id: String,
    pub address: String,
}

impl PatientProfile {
    /// Produces the identity-verified record handed to the rest of the core.
    ///
    /// The national id is masked here; nothing downstream of verification
    /// ever sees the full credential.
    pub fn into_record(self) -> PatientRecord {
        PatientRecord {
            id: self.id,
            full_name: self.full_name,
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            phone: self.phone,
            national_id_masked: mask_national_id(&self.national_id),
            address: self.address,
        }
    }
}

/// An identity-verified patient.
///
/// Created only by the verification service on successful verification and
/// immutable for the lifetime of a token-issuance session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    pub national_id_masked: String,
    pub address: String,
}

/// A doctor as held by the external staffing directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    /// Hard limit on open (waiting or called) tokens; `None` means unbounded.
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// Read-only access to the patient registration directory.
pub trait PatientDirectory: Send + Sync {
    /// Resolves a full (unmasked) national id to a profile.
    fn find_by_national_id(&self, national_id: &str) -> Option<PatientProfile>;

    /// Resolves a phone number to a profile.
    fn find_by_phone(&self, phone: &str) -> Option<PatientProfile>;
}

/// Read-only access to the doctor/staffing directory.
pub trait DoctorDirectory: Send + Sync {
    /// Looks up a single doctor by id.
    fn find(&self, id: Uuid) -> Option<DoctorProfile>;

    /// Lists doctors, optionally restricted to one specialization
    /// (case-insensitive match).
    fn list(&self, specialization: Option<&str>) -> Vec<DoctorProfile>;
}

/// Patient directory loaded from a YAML seed file.
#[derive(Clone, Debug)]
pub struct YamlPatientDirectory {
    profiles: Vec<PatientProfile>,
}

impl YamlPatientDirectory {
    /// Loads the directory from a YAML list of patient profiles.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::FileRead` if the file cannot be read and
    /// `QueueError::YamlDeserialization` if it is not a valid profile list.
    pub fn load(path: &Path) -> QueueResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(QueueError::FileRead)?;
        let profiles: Vec<PatientProfile> =
            serde_yaml::from_str(&raw).map_err(QueueError::YamlDeserialization)?;
        tracing::info!(
            "loaded {} patient profiles from {}",
            profiles.len(),
            path.display()
        );
        Ok(Self { profiles })
    }

    /// Builds a directory from in-memory profiles. Used by tests and the demo
    /// CLI.
    pub fn from_profiles(profiles: Vec<PatientProfile>) -> Self {
        Self { profiles }
    }

    /// All loaded profiles, in file order.
    pub fn profiles(&self) -> &[PatientProfile] {
        &self.profiles
    }
}

impl PatientDirectory for YamlPatientDirectory {
    fn find_by_national_id(&self, national_id: &str) -> Option<PatientProfile> {
        self.profiles
            .iter()
            .find(|p| p.national_id == national_id)
            .cloned()
    }

    fn find_by_phone(&self, phone: &str) -> Option<PatientProfile> {
        self.profiles.iter().find(|p| p.phone == phone).cloned()
    }
}

/// Doctor directory loaded from a YAML seed file.
#[derive(Clone, Debug)]
pub struct YamlDoctorDirectory {
    doctors: Vec<DoctorProfile>,
}

impl YamlDoctorDirectory {
    /// Loads the directory from a YAML list of doctor profiles.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::FileRead` if the file cannot be read and
    /// `QueueError::YamlDeserialization` if it is not a valid doctor list.
    pub fn load(path: &Path) -> QueueResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(QueueError::FileRead)?;
        let doctors: Vec<DoctorProfile> =
            serde_yaml::from_str(&raw).map_err(QueueError::YamlDeserialization)?;
        tracing::info!(
            "loaded {} doctors from {}",
            doctors.len(),
            path.display()
        );
        Ok(Self { doctors })
    }

    /// Builds a directory from in-memory doctors. Used by tests and the demo
    /// CLI.
    pub fn from_doctors(doctors: Vec<DoctorProfile>) -> Self {
        Self { doctors }
    }
}

impl DoctorDirectory for YamlDoctorDirectory {
    fn find(&self, id: Uuid) -> Option<DoctorProfile> {
        self.doctors.iter().find(|d| d.id == id).cloned()
    }

    fn list(&self, specialization: Option<&str>) -> Vec<DoctorProfile> {
        match specialization {
            None => self.doctors.clone(),
            Some(wanted) => self
                .doctors
                .iter()
                .filter(|d| d.specialization.eq_ignore_ascii_case(wanted))
                .cloned()
                .collect(),
        }
    }
}
