//! Token entity and status state machine.
//!
//! A token is a queue ticket: one patient's place in line for a specific
//! doctor and specialization. Tokens are created by the issuance engine,
//! mutated only through the store's atomic `update`, and never deleted;
//! cancellation is a status, so the full history stays available for audit
//! and statistics.
//!
//! The status graph is validated centrally here rather than scattered across
//! callers:
//!
//! ```text
//! waiting  --call-->      called
//! waiting  --cancel-->    cancelled
//! called   --complete-->  completed
//! called   --cancel-->    cancelled
//! ```
//!
//! Any other request fails with [`QueueError::InvalidTransition`].

use crate::error::{QueueError, QueueResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue priority class.
///
/// Affects ordering in projections only, never token numbering. The derived
/// `Ord` ranks `Emergency` above `Normal`, which the public view relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    Emergency,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Normal => write!(f, "normal"),
            Priority::Emergency => write!(f, "emergency"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = QueueError;

    fn from_str(input: &str) -> QueueResult<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Priority::Normal),
            "emergency" => Ok(Priority::Emergency),
            other => Err(QueueError::InvalidInput(format!(
                "unknown priority '{}' (expected 'normal' or 'emergency')",
                other
            ))),
        }
    }
}

/// Lifecycle status of a token.
///
/// Initial status is `Waiting`; `Completed` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Waiting,
    Called,
    Completed,
    Cancelled,
}

impl TokenStatus {
    /// Applies a transition request to this status.
    ///
    /// This is the single authority for the status graph. Every mutation of a
    /// stored token goes through it, so an illegal edge can never be written.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidTransition`] when the requested edge does
    /// not exist from the current status.
    pub fn apply(self, transition: Transition) -> QueueResult<TokenStatus> {
        match (self, transition) {
            (TokenStatus::Waiting, Transition::Call) => Ok(TokenStatus::Called),
            (TokenStatus::Waiting, Transition::Cancel) => Ok(TokenStatus::Cancelled),
            (TokenStatus::Called, Transition::Complete) => Ok(TokenStatus::Completed),
            (TokenStatus::Called, Transition::Cancel) => Ok(TokenStatus::Cancelled),
            (from, requested) => Err(QueueError::InvalidTransition { from, requested }),
        }
    }

    /// Whether the token still occupies a place in the queue.
    pub fn is_open(self) -> bool {
        matches!(self, TokenStatus::Waiting | TokenStatus::Called)
    }

    /// Whether the status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TokenStatus::Completed | TokenStatus::Cancelled)
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenStatus::Waiting => "waiting",
            TokenStatus::Called => "called",
            TokenStatus::Completed => "completed",
            TokenStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for TokenStatus {
    type Err = QueueError;

    fn from_str(input: &str) -> QueueResult<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(TokenStatus::Waiting),
            "called" => Ok(TokenStatus::Called),
            "completed" => Ok(TokenStatus::Completed),
            "cancelled" => Ok(TokenStatus::Cancelled),
            other => Err(QueueError::InvalidInput(format!(
                "unknown token status '{}'",
                other
            ))),
        }
    }
}

/// A transition request against a stored token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Call,
    Complete,
    Cancel,
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Call => write!(f, "call"),
            Transition::Complete => write!(f, "complete"),
            Transition::Cancel => write!(f, "cancel"),
        }
    }
}

/// The central queue entity.
///
/// `patient_id`, `patient_name` and `phone` are a snapshot of the patient
/// record at issuance time. Later edits to a patient profile must not
/// retroactively change historical tokens, so the snapshot is stored on the
/// token itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Globally unique identifier, assigned at creation, never reused.
    pub id: Uuid,
    /// Human-facing sequential number, unique and strictly increasing in
    /// allocation order. Stored as a plain ordinal; the `T007`-style label is
    /// presentation, see [`token_label`].
    pub token_number: u64,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub phone: String,
    pub symptoms: String,
    pub specialization: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub priority: Priority,
    pub status: TokenStatus,
    /// Set once at creation, never mutated.
    pub generated_at: DateTime<Utc>,
}

/// Everything the issuance engine supplies to the store; the store itself
/// assigns `id`, `token_number`, `status` and `generated_at`.
#[derive(Clone, Debug)]
pub struct TokenDraft {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub phone: String,
    pub symptoms: String,
    pub specialization: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub priority: Priority,
}

/// Event published exactly once per successful `call` transition.
///
/// Consumed by the external announcement collaborator (audio, display
/// flash); the core only guarantees the publication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCalled {
    pub token_number: u64,
    pub patient_name: String,
}

/// Formats a token number as the display label used on printed slips and the
/// display board, e.g. `7` becomes `T007`.
///
/// Purely presentational: the stored, canonical value is the ordinal.
pub fn token_label(token_number: u64) -> String {
    format!("T{:03}", token_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiting_token_can_be_called() {
        let next = TokenStatus::Waiting
            .apply(Transition::Call)
            .expect("waiting -> called should be legal");
        assert_eq!(next, TokenStatus::Called);
    }

    #[test]
    fn test_waiting_token_can_be_cancelled() {
        let next = TokenStatus::Waiting
            .apply(Transition::Cancel)
            .expect("waiting -> cancelled should be legal");
        assert_eq!(next, TokenStatus::Cancelled);
    }

    #[test]
    fn test_called_token_can_complete_or_cancel() {
        assert_eq!(
            TokenStatus::Called
                .apply(Transition::Complete)
                .expect("called -> completed should be legal"),
            TokenStatus::Completed
        );
        assert_eq!(
            TokenStatus::Called
                .apply(Transition::Cancel)
                .expect("called -> cancelled should be legal"),
            TokenStatus::Cancelled
        );
    }

    #[test]
    fn test_waiting_token_cannot_complete() {
        let err = TokenStatus::Waiting
            .apply(Transition::Complete)
            .expect_err("waiting -> completed should be rejected");
        assert!(matches!(
            err,
            QueueError::InvalidTransition {
                from: TokenStatus::Waiting,
                requested: Transition::Complete,
            }
        ));
    }

    #[test]
    fn test_terminal_statuses_reject_every_transition() {
        for terminal in [TokenStatus::Completed, TokenStatus::Cancelled] {
            for transition in [Transition::Call, Transition::Complete, Transition::Cancel] {
                assert!(
                    terminal.apply(transition).is_err(),
                    "{} should reject {}",
                    terminal,
                    transition
                );
            }
        }
    }

    #[test]
    fn test_no_transition_revisits_waiting() {
        for from in [
            TokenStatus::Waiting,
            TokenStatus::Called,
            TokenStatus::Completed,
            TokenStatus::Cancelled,
        ] {
            for transition in [Transition::Call, Transition::Complete, Transition::Cancel] {
                if let Ok(next) = from.apply(transition) {
                    assert_ne!(next, TokenStatus::Waiting);
                }
            }
        }
    }

    #[test]
    fn test_emergency_ranks_above_normal() {
        assert!(Priority::Emergency > Priority::Normal);
    }

    #[test]
    fn test_priority_parses_case_insensitively() {
        let priority: Priority = "Emergency".parse().expect("should parse");
        assert_eq!(priority, Priority::Emergency);
    }

    #[test]
    fn test_status_round_trips_through_display_and_parse() {
        for status in [
            TokenStatus::Waiting,
            TokenStatus::Called,
            TokenStatus::Completed,
            TokenStatus::Cancelled,
        ] {
            let parsed: TokenStatus = status.to_string().parse().expect("should parse");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_token_label_zero_pads_to_three_digits() {
        assert_eq!(token_label(7), "T007");
        assert_eq!(token_label(42), "T042");
        assert_eq!(token_label(1234), "T1234");
    }

    #[test]
    fn test_token_serialises_enums_in_lowercase() {
        // Any storage backend persists exactly these fields; the enum wire
        // form is the lowercase name.
        let token = Token {
            id: Uuid::new_v4(),
            token_number: 7,
            patient_id: Uuid::new_v4(),
            patient_name: "Nusrat Jahan".into(),
            phone: "0171234567".into(),
            symptoms: "chest pain".into(),
            specialization: "Cardiology".into(),
            doctor_id: Uuid::new_v4(),
            doctor_name: "Dr Ayesha Rahman".into(),
            priority: Priority::Emergency,
            status: TokenStatus::Waiting,
            generated_at: Utc::now(),
        };

        let json = serde_json::to_value(&token).expect("token should serialise");
        assert_eq!(json["priority"], "emergency");
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["token_number"], 7);

        let restored: Token =
            serde_json::from_value(json).expect("token should deserialise");
        assert_eq!(restored, token);
    }
}
