//! Request and response bodies for the MedQ REST API.
//!
//! Wire types are deliberately stringly for ids, enums and timestamps so
//! every UI surface (kiosk, staff console, display board) can consume them
//! without sharing Rust types; conversion to and from core types happens
//! here, next to the schema definitions.

use medq_core::{
    token_label, BiometricOutcome, CodeIssue, DoctorProfile, Gender, PatientRecord, QueueError,
    QueueResult, Specialization, Token,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// A verified patient record on the wire.
///
/// Returned by the verification endpoints and passed back verbatim by the
/// kiosk when issuing a token, so the issuance request carries the snapshot
/// the token denormalises.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientRecordBody {
    pub id: String,
    pub full_name: String,
    pub gender: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub phone: String,
    pub national_id_masked: String,
    pub address: String,
}

impl From<PatientRecord> for PatientRecordBody {
    fn from(record: PatientRecord) -> Self {
        Self {
            id: record.id.to_string(),
            full_name: record.full_name,
            gender: gender_name(record.gender).to_owned(),
            date_of_birth: record.date_of_birth.to_string(),
            phone: record.phone,
            national_id_masked: record.national_id_masked,
            address: record.address,
        }
    }
}

impl PatientRecordBody {
    /// Converts the wire form back into a core record.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidInput` for an unparseable id, gender or
    /// date of birth.
    pub fn into_record(self) -> QueueResult<PatientRecord> {
        let id = self
            .id
            .parse()
            .map_err(|_| QueueError::InvalidInput(format!("invalid patient id '{}'", self.id)))?;
        let gender = parse_gender(&self.gender)?;
        let date_of_birth = self.date_of_birth.parse().map_err(|_| {
            QueueError::InvalidInput(format!("invalid date of birth '{}'", self.date_of_birth))
        })?;

        Ok(PatientRecord {
            id,
            full_name: self.full_name,
            gender,
            date_of_birth,
            phone: self.phone,
            national_id_masked: self.national_id_masked,
            address: self.address,
        })
    }
}

fn gender_name(gender: Gender) -> &'static str {
    match gender {
        Gender::Female => "female",
        Gender::Male => "male",
        Gender::Other => "other",
        Gender::Unknown => "unknown",
    }
}

fn parse_gender(input: &str) -> QueueResult<Gender> {
    match input.trim().to_ascii_lowercase().as_str() {
        "female" => Ok(Gender::Female),
        "male" => Ok(Gender::Male),
        "other" => Ok(Gender::Other),
        "unknown" => Ok(Gender::Unknown),
        other => Err(QueueError::InvalidInput(format!(
            "unknown gender '{}'",
            other
        ))),
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VerifyDocumentReq {
    /// 12-digit national id.
    pub national_id: String,
    /// Outcome of the kiosk's biometric confirmation step.
    pub biometric_confirmed: bool,
}

impl VerifyDocumentReq {
    pub fn outcome(&self) -> BiometricOutcome {
        if self.biometric_confirmed {
            BiometricOutcome::Confirmed
        } else {
            BiometricOutcome::Rejected
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct IssueCodeReq {
    /// 10-digit phone number.
    pub phone: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct IssueCodeRes {
    pub phone: String,
    /// RFC 3339 expiry of the dispatched code.
    pub expires_at: String,
}

impl From<CodeIssue> for IssueCodeRes {
    fn from(issue: CodeIssue) -> Self {
        Self {
            phone: issue.phone.to_string(),
            expires_at: issue.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConfirmCodeReq {
    pub phone: String,
    pub code: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ResolveReq {
    pub symptoms: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SpecializationBody {
    pub name: String,
    pub description: String,
}

impl From<Specialization> for SpecializationBody {
    fn from(specialization: Specialization) -> Self {
        Self {
            name: specialization.name,
            description: specialization.description,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ResolveRes {
    /// Best match first.
    pub specializations: Vec<SpecializationBody>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DoctorRes {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub capacity: Option<u32>,
}

impl From<DoctorProfile> for DoctorRes {
    fn from(doctor: DoctorProfile) -> Self {
        Self {
            id: doctor.id.to_string(),
            name: doctor.name,
            specialization: doctor.specialization,
            capacity: doctor.capacity,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ListDoctorsRes {
    pub doctors: Vec<DoctorRes>,
}

#[derive(Deserialize, IntoParams)]
pub struct DoctorsQuery {
    /// Restrict to one specialization (case-insensitive).
    pub specialization: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct IssueTokenReq {
    /// The verified patient, as returned by a verification endpoint.
    pub patient: PatientRecordBody,
    pub symptoms: String,
    pub specialization: String,
    pub doctor_id: String,
    /// `normal` or `emergency`.
    pub priority: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenRes {
    pub id: String,
    pub token_number: u64,
    /// Display label, e.g. `T007`.
    pub label: String,
    pub patient_id: String,
    pub patient_name: String,
    pub phone: String,
    pub symptoms: String,
    pub specialization: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub priority: String,
    pub status: String,
    /// RFC 3339 generation timestamp.
    pub generated_at: String,
}

impl From<Token> for TokenRes {
    fn from(token: Token) -> Self {
        Self {
            id: token.id.to_string(),
            token_number: token.token_number,
            label: token_label(token.token_number),
            patient_id: token.patient_id.to_string(),
            patient_name: token.patient_name,
            phone: token.phone,
            symptoms: token.symptoms,
            specialization: token.specialization,
            doctor_id: token.doctor_id.to_string(),
            doctor_name: token.doctor_name,
            priority: token.priority.to_string(),
            status: token.status.to_string(),
            generated_at: token.generated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ListTokensRes {
    pub tokens: Vec<TokenRes>,
}

#[derive(Deserialize, IntoParams)]
pub struct ListTokensQuery {
    pub specialization: Option<String>,
    /// `waiting`, `called`, `completed` or `cancelled`.
    pub status: Option<String>,
    /// `normal` or `emergency`.
    pub priority: Option<String>,
    pub doctor_id: Option<String>,
    /// `number`, `generated` or `priority`.
    pub sort: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PublicViewRes {
    /// Waiting tokens (emergencies first), then the most recently called.
    pub tokens: Vec<TokenRes>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn record() -> PatientRecord {
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

    #[test]
    fn test_patient_record_round_trips_through_wire_form() {
        let original = record();
        let body: PatientRecordBody = original.clone().into();
        let restored = body.into_record().expect("round trip should succeed");
        assert_eq!(restored, original);
    }

    #[test]
    fn test_patient_record_body_rejects_bad_gender() {
        let mut body: PatientRecordBody = record().into();
        body.gender = "x".into();
        let err = body.into_record().expect_err("bad gender should fail");
        assert!(matches!(err, QueueError::InvalidInput(_)));
    }

    #[test]
    fn test_token_res_carries_display_label() {
        let token = medq_core::Token {
            id: Uuid::new_v4(),
            token_number: 7,
            patient_id: Uuid::new_v4(),
            patient_name: "Nusrat Jahan".into(),
            phone: "0171234567".into(),
            symptoms: "chest pain".into(),
            specialization: "Cardiology".into(),
            doctor_id: Uuid::new_v4(),
            doctor_name: "Dr Ayesha Rahman".into(),
            priority: medq_core::Priority::Emergency,
            status: medq_core::TokenStatus::Waiting,
            generated_at: chrono::Utc::now(),
        };

        let res: TokenRes = token.into();
        assert_eq!(res.label, "T007");

        let json = serde_json::to_value(&res).expect("response should serialise");
        assert_eq!(json["priority"], "emergency");
        assert_eq!(json["status"], "waiting");
    }

    #[test]
    fn test_verify_document_req_maps_outcome() {
        let confirmed = VerifyDocumentReq {
            national_id: "201187643321".into(),
            biometric_confirmed: true,
        };
        assert_eq!(confirmed.outcome(), BiometricOutcome::Confirmed);

        let rejected = VerifyDocumentReq {
            national_id: "201187643321".into(),
            biometric_confirmed: false,
        };
        assert_eq!(rejected.outcome(), BiometricOutcome::Rejected);
    }
}
