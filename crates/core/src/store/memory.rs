//! In-memory token store.
//!
//! Reference implementation of the [`TokenStore`] contract. Numbering uses a
//! single atomic counter; each token record carries its own lock and version,
//! so issuance for one patient and a status change for another never contend.
//! The outer map lock is held only to insert or to clone an entry handle,
//! never across a token mutation.

use crate::config::CoreConfig;
use crate::error::{QueueError, QueueResult};
use crate::store::{TokenFilter, TokenStore};
use crate::token::{Token, TokenDraft, TokenStatus, Transition};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// A stored token plus the store-private metadata the contract needs:
/// a version for optimistic updates and the call sequence used to order the
/// recently-called board. Neither is part of the persisted `Token` fields.
#[derive(Debug)]
struct VersionedToken {
    token: Token,
    version: u64,
    called_seq: Option<u64>,
}

type Entry = Arc<RwLock<VersionedToken>>;

#[derive(Default)]
struct StoreIndex {
    /// Allocation order, never reordered; tokens are never removed.
    order: Vec<Entry>,
    by_id: HashMap<Uuid, Entry>,
}

/// In-memory [`TokenStore`] implementation.
pub struct MemoryTokenStore {
    next_number: AtomicU64,
    call_seq: AtomicU64,
    retry_budget: u32,
    index: RwLock<StoreIndex>,
}

impl MemoryTokenStore {
    /// Creates an empty store numbering from the configured start value.
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            next_number: AtomicU64::new(cfg.token_number_start()),
            call_seq: AtomicU64::new(0),
            retry_budget: cfg.update_retry_budget(),
            index: RwLock::new(StoreIndex::default()),
        }
    }

    fn entry(&self, token_id: Uuid) -> QueueResult<Entry> {
        let index = self
            .index
            .read()
            .map_err(|_| QueueError::Internal("token index lock poisoned".into()))?;
        index
            .by_id
            .get(&token_id)
            .cloned()
            .ok_or_else(|| QueueError::NotFound {
                entity: "token",
                id: token_id.to_string(),
            })
    }

    fn read_entry(entry: &Entry) -> QueueResult<std::sync::RwLockReadGuard<'_, VersionedToken>> {
        entry
            .read()
            .map_err(|_| QueueError::Internal("token record lock poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn allocate(&self, draft: TokenDraft) -> QueueResult<Token> {
        // fetch_add gives each caller a distinct number; insertion cannot
        // fail afterwards, so the sequence stays gap-free.
        let token_number = self.next_number.fetch_add(1, Ordering::SeqCst);

        let token = Token {
            id: Uuid::new_v4(),
            token_number,
            patient_id: draft.patient_id,
            patient_name: draft.patient_name,
            phone: draft.phone,
            symptoms: draft.symptoms,
            specialization: draft.specialization,
            doctor_id: draft.doctor_id,
            doctor_name: draft.doctor_name,
            priority: draft.priority,
            status: TokenStatus::Waiting,
            generated_at: Utc::now(),
        };

        let entry = Arc::new(RwLock::new(VersionedToken {
            token: token.clone(),
            version: 0,
            called_seq: None,
        }));

        let mut index = self
            .index
            .write()
            .map_err(|_| QueueError::Internal("token index lock poisoned".into()))?;
        index.by_id.insert(token.id, entry.clone());
        index.order.push(entry);

        tracing::debug!("allocated token {} ({})", token.token_number, token.id);
        Ok(token)
    }

    fn update(&self, token_id: Uuid, transition: Transition) -> QueueResult<Token> {
        let entry = self.entry(token_id)?;

        for _attempt in 0..self.retry_budget {
            let (observed_version, observed_status) = {
                let record = Self::read_entry(&entry)?;
                (record.version, record.token.status)
            };

            // Validate against the observed status first; an illegal edge is a
            // caller mistake and is never retried.
            let next_status = observed_status.apply(transition)?;

            let mut record = entry
                .write()
                .map_err(|_| QueueError::Internal("token record lock poisoned".into()))?;
            if record.version != observed_version {
                // A concurrent writer won the race; re-read and re-validate.
                continue;
            }

            record.token.status = next_status;
            record.version += 1;
            if transition == Transition::Call {
                record.called_seq = Some(self.call_seq.fetch_add(1, Ordering::SeqCst));
            }

            tracing::debug!(
                "token {} transitioned {} -> {}",
                record.token.token_number,
                observed_status,
                next_status
            );
            return Ok(record.token.clone());
        }

        Err(QueueError::Contention {
            retries: self.retry_budget,
        })
    }

    fn get(&self, token_id: Uuid) -> QueueResult<Token> {
        let entry = self.entry(token_id)?;
        let record = Self::read_entry(&entry)?;
        Ok(record.token.clone())
    }

    fn list(&self, filter: &TokenFilter) -> QueueResult<Vec<Token>> {
        let entries: Vec<Entry> = {
            let index = self
                .index
                .read()
                .map_err(|_| QueueError::Internal("token index lock poisoned".into()))?;
            index.order.iter().cloned().collect()
        };

        let mut tokens = Vec::new();
        for entry in entries {
            let record = Self::read_entry(&entry)?;
            if filter.matches(&record.token) {
                tokens.push(record.token.clone());
            }
        }
        Ok(tokens)
    }

    fn recently_called(&self, limit: usize) -> QueueResult<Vec<Token>> {
        let entries: Vec<Entry> = {
            let index = self
                .index
                .read()
                .map_err(|_| QueueError::Internal("token index lock poisoned".into()))?;
            index.order.iter().cloned().collect()
        };

        let mut called: Vec<(u64, Token)> = Vec::new();
        for entry in entries {
            let record = Self::read_entry(&entry)?;
            if record.token.status == TokenStatus::Called {
                if let Some(seq) = record.called_seq {
                    called.push((seq, record.token.clone()));
                }
            }
        }

        called.sort_by(|a, b| b.0.cmp(&a.0));
        called.truncate(limit);
        Ok(called.into_iter().map(|(_, token)| token).collect())
    }
}
