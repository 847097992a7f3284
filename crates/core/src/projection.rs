//! Queue projections.
//!
//! Read-only views over the token store for two audiences:
//!
//! - [`operational_view`](QueueProjection::operational_view) for staff
//!   tooling: every token, filterable by specialization, status, priority
//!   and doctor, in stable allocation order unless a sort is requested.
//! - [`public_view`](QueueProjection::public_view) for the display board:
//!   waiting tokens with emergencies first, then the most recently called
//!   tokens. Polled every refresh tick, so it does one store pass and a
//!   bounded sort.

use crate::error::QueueResult;
use crate::store::{TokenFilter, TokenStore};
use crate::token::{Priority, Token, TokenStatus};
use std::cmp::Reverse;
use std::sync::Arc;
use uuid::Uuid;

/// Explicit ordering for the operational view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationalSort {
    /// Ascending token number (equals allocation order).
    TokenNumber,
    /// Ascending generation time.
    GeneratedAt,
    /// Emergency first, then arrival order within each class.
    PriorityThenArrival,
}

impl std::str::FromStr for OperationalSort {
    type Err = crate::error::QueueError;

    fn from_str(input: &str) -> QueueResult<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(OperationalSort::TokenNumber),
            "generated" => Ok(OperationalSort::GeneratedAt),
            "priority" => Ok(OperationalSort::PriorityThenArrival),
            other => Err(crate::error::QueueError::InvalidInput(format!(
                "unknown sort '{}' (expected 'number', 'generated' or 'priority')",
                other
            ))),
        }
    }
}

/// Staff-view filter: record filter plus an optional sort.
#[derive(Clone, Debug, Default)]
pub struct OperationalFilter {
    pub specialization: Option<String>,
    pub status: Option<TokenStatus>,
    pub priority: Option<Priority>,
    pub doctor_id: Option<Uuid>,
    pub sort: Option<OperationalSort>,
}

impl OperationalFilter {
    fn record_filter(&self) -> TokenFilter {
        TokenFilter {
            specialization: self.specialization.clone(),
            status: self.status,
            priority: self.priority,
            doctor_id: self.doctor_id,
        }
    }
}

/// Read-only views over the token store.
pub struct QueueProjection {
    store: Arc<dyn TokenStore>,
    called_board_size: usize,
}

impl QueueProjection {
    pub fn new(store: Arc<dyn TokenStore>, called_board_size: usize) -> Self {
        Self {
            store,
            called_board_size,
        }
    }

    /// Fetches a single token snapshot by id.
    pub fn token(&self, token_id: Uuid) -> QueueResult<Token> {
        self.store.get(token_id)
    }

    /// Staff view: all tokens matching the filter.
    ///
    /// Without an explicit sort the store's stable insertion order is
    /// returned as-is.
    pub fn operational_view(&self, filter: &OperationalFilter) -> QueueResult<Vec<Token>> {
        let mut tokens = self.store.list(&filter.record_filter())?;

        match filter.sort {
            None => {}
            Some(OperationalSort::TokenNumber) => {
                tokens.sort_by_key(|t| t.token_number);
            }
            Some(OperationalSort::GeneratedAt) => {
                tokens.sort_by_key(|t| (t.generated_at, t.token_number));
            }
            Some(OperationalSort::PriorityThenArrival) => {
                tokens.sort_by_key(|t| (Reverse(t.priority), t.generated_at, t.token_number));
            }
        }

        Ok(tokens)
    }

    /// Display-board view: every waiting token ordered by priority class
    /// (emergency first) then arrival, followed by the most recently called
    /// tokens, most recent first, bounded by the configured board size.
    ///
    /// Completed and cancelled tokens never appear.
    pub fn public_view(&self) -> QueueResult<Vec<Token>> {
        let mut waiting = self.store.list(&TokenFilter {
            status: Some(TokenStatus::Waiting),
            ..TokenFilter::default()
        })?;
        waiting.sort_by_key(|t| (Reverse(t.priority), t.generated_at, t.token_number));

        let called = self.store.recently_called(self.called_board_size)?;

        waiting.extend(called);
        Ok(waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::store::MemoryTokenStore;
    use crate::token::{TokenDraft, Transition};

    fn seeded() -> (QueueProjection, Arc<MemoryTokenStore>, Vec<Token>) {
        let store = Arc::new(MemoryTokenStore::new(&CoreConfig::standard()));
        let projection = QueueProjection::new(store.clone(), 3);

        let mut tokens = Vec::new();
        for (name, specialization, priority) in [
            ("Alice", "Cardiology", Priority::Normal),
            ("Bob", "Cardiology", Priority::Normal),
            ("Carol", "Dermatology", Priority::Normal),
            ("Dina", "Cardiology", Priority::Emergency),
        ] {
            let token = store
                .allocate(TokenDraft {
                    patient_id: Uuid::new_v4(),
                    patient_name: name.into(),
                    phone: "0171234567".into(),
                    symptoms: "symptoms".into(),
                    specialization: specialization.into(),
                    doctor_id: Uuid::new_v4(),
                    doctor_name: "Dr Rahman".into(),
                    priority,
                })
                .expect("allocate should succeed");
            tokens.push(token);
        }

        (projection, store, tokens)
    }

    fn numbers(tokens: &[Token]) -> Vec<u64> {
        tokens.iter().map(|t| t.token_number).collect()
    }

    #[test]
    fn test_public_view_puts_emergency_before_earlier_normals() {
        // End-to-end scenario A: three normal tokens then one emergency;
        // the emergency surfaces first, ties broken by arrival order.
        let (projection, _store, _tokens) = seeded();

        let board = projection.public_view().expect("view should succeed");
        assert_eq!(numbers(&board), vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_public_view_appends_recently_called_most_recent_first() {
        let (projection, store, tokens) = seeded();

        store
            .update(tokens[0].id, Transition::Call)
            .expect("call should succeed");
        store
            .update(tokens[1].id, Transition::Call)
            .expect("call should succeed");

        let board = projection.public_view().expect("view should succeed");
        // Waiting: emergency (4) then normal arrival (3); called: 2 then 1.
        assert_eq!(numbers(&board), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_public_view_never_shows_terminal_tokens() {
        // End-to-end scenario B: call then complete the first token; it
        // disappears from the board and shows up in the staff view.
        let (projection, store, tokens) = seeded();

        store
            .update(tokens[0].id, Transition::Call)
            .expect("call should succeed");
        store
            .update(tokens[0].id, Transition::Complete)
            .expect("complete should succeed");
        store
            .update(tokens[2].id, Transition::Cancel)
            .expect("cancel should succeed");

        let board = projection.public_view().expect("view should succeed");
        assert!(board.iter().all(|t| t.status.is_open()));
        assert!(board.iter().all(|t| t.id != tokens[0].id && t.id != tokens[2].id));

        let completed = projection
            .operational_view(&OperationalFilter {
                status: Some(TokenStatus::Completed),
                ..OperationalFilter::default()
            })
            .expect("view should succeed");
        assert_eq!(numbers(&completed), vec![tokens[0].token_number]);
    }

    #[test]
    fn test_public_view_bounds_called_section_to_board_size() {
        let store = Arc::new(MemoryTokenStore::new(&CoreConfig::standard()));
        let projection = QueueProjection::new(store.clone(), 2);

        let mut ids = Vec::new();
        for i in 0..4 {
            let token = store
                .allocate(TokenDraft {
                    patient_id: Uuid::new_v4(),
                    patient_name: format!("patient-{}", i),
                    phone: "0171234567".into(),
                    symptoms: "symptoms".into(),
                    specialization: "Cardiology".into(),
                    doctor_id: Uuid::new_v4(),
                    doctor_name: "Dr Rahman".into(),
                    priority: Priority::Normal,
                })
                .expect("allocate should succeed");
            ids.push(token.id);
        }
        for id in &ids {
            store.update(*id, Transition::Call).expect("call should succeed");
        }

        let board = projection.public_view().expect("view should succeed");
        assert_eq!(numbers(&board), vec![4, 3], "last two called, newest first");
    }

    #[test]
    fn test_operational_view_filters_by_specialization_and_status() {
        let (projection, store, tokens) = seeded();
        store
            .update(tokens[0].id, Transition::Call)
            .expect("call should succeed");

        let cardiology_waiting = projection
            .operational_view(&OperationalFilter {
                specialization: Some("cardiology".into()),
                status: Some(TokenStatus::Waiting),
                ..OperationalFilter::default()
            })
            .expect("view should succeed");
        assert_eq!(numbers(&cardiology_waiting), vec![2, 4]);
    }

    #[test]
    fn test_operational_view_keeps_insertion_order_without_sort() {
        let (projection, _store, _tokens) = seeded();

        let all = projection
            .operational_view(&OperationalFilter::default())
            .expect("view should succeed");
        assert_eq!(numbers(&all), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_operational_view_sorts_by_priority_then_arrival_on_request() {
        let (projection, _store, _tokens) = seeded();

        let sorted = projection
            .operational_view(&OperationalFilter {
                sort: Some(OperationalSort::PriorityThenArrival),
                ..OperationalFilter::default()
            })
            .expect("view should succeed");
        assert_eq!(numbers(&sorted), vec![4, 1, 2, 3]);
    }
}
