//! Token store contract.
//!
//! The store is the single source of truth for queue state. Callers never
//! touch the underlying collection; every mutation goes through `allocate`
//! and `update`, which any conforming backend must implement atomically:
//!
//! - `allocate` draws the token number from a single atomic counter, so
//!   numbers are pairwise distinct and contiguous in allocation order under
//!   arbitrary concurrent issuance.
//! - `update` validates the requested transition against the *stored* status
//!   and applies it with per-token optimistic concurrency. A transition
//!   attempted against a stale or already-transitioned token fails instead of
//!   silently overwriting, and an update that keeps losing the version race
//!   is abandoned after a bounded retry budget with
//!   [`QueueError::Contention`](crate::error::QueueError::Contention).
//!
//! Reads return consistent per-token snapshots and may run concurrently with
//! writes; the polling display board tolerates one refresh interval of
//! staleness, so reads are not required to be linearizable with writes.
//!
//! The in-memory reference implementation lives in [`memory`]; any durable
//! key-value or relational backend satisfying this contract can replace it.

pub mod memory;

pub use memory::MemoryTokenStore;

use crate::error::QueueResult;
use crate::token::{Priority, Token, TokenDraft, TokenStatus, Transition};
use uuid::Uuid;

/// Record-level filter for store reads.
///
/// All populated fields must match. Specialization matching is
/// case-insensitive; everything else is exact.
#[derive(Clone, Debug, Default)]
pub struct TokenFilter {
    pub specialization: Option<String>,
    pub status: Option<TokenStatus>,
    pub priority: Option<Priority>,
    pub doctor_id: Option<Uuid>,
}

impl TokenFilter {
    /// Whether a token passes every populated field of this filter.
    pub fn matches(&self, token: &Token) -> bool {
        if let Some(ref wanted) = self.specialization {
            if !token.specialization.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if token.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if token.priority != priority {
                return false;
            }
        }
        if let Some(doctor_id) = self.doctor_id {
            if token.doctor_id != doctor_id {
                return false;
            }
        }
        true
    }
}

/// The persisted, concurrently-accessible collection of token records.
pub trait TokenStore: Send + Sync {
    /// Creates a token from a draft, assigning id, token number, `waiting`
    /// status and the generation timestamp atomically.
    fn allocate(&self, draft: TokenDraft) -> QueueResult<Token>;

    /// Applies one status transition to an existing token.
    ///
    /// # Errors
    ///
    /// - [`QueueError::NotFound`](crate::error::QueueError::NotFound) for an
    ///   unknown token id.
    /// - [`QueueError::InvalidTransition`](crate::error::QueueError::InvalidTransition)
    ///   when the edge does not exist from the stored status; the token is
    ///   left unchanged.
    /// - [`QueueError::Contention`](crate::error::QueueError::Contention)
    ///   when the retry budget is exhausted by concurrent writers.
    fn update(&self, token_id: Uuid, transition: Transition) -> QueueResult<Token>;

    /// Fetches a single token snapshot.
    fn get(&self, token_id: Uuid) -> QueueResult<Token>;

    /// Lists token snapshots in insertion (allocation) order.
    fn list(&self, filter: &TokenFilter) -> QueueResult<Vec<Token>>;

    /// The most recently called tokens, most recent first, bounded by
    /// `limit`. Only tokens still in `called` status appear.
    fn recently_called(&self, limit: usize) -> QueueResult<Vec<Token>>;
}
