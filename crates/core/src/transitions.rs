//! Status transition manager.
//!
//! Drives tokens through the status graph via the store's atomic `update`
//! and publishes a [`TokenCalled`] event exactly once per successful `call`
//! transition. The announcement mechanism (audio, display flash) is an
//! external subscriber on the broadcast channel, not a core responsibility;
//! a failed transition has no side effect.

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::error::QueueResult;
use crate::store::TokenStore;
use crate::token::{Token, TokenCalled, Transition};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Applies state-machine edges to stored tokens.
pub struct StatusTransitionManager {
    store: Arc<dyn TokenStore>,
    events: broadcast::Sender<TokenCalled>,
}

impl StatusTransitionManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// Subscribes to `TokenCalled` events.
    ///
    /// Each successful `call` is delivered once to every live subscriber; a
    /// subscriber that falls behind the channel capacity observes a lag, not
    /// a blocked queue.
    pub fn subscribe(&self) -> broadcast::Receiver<TokenCalled> {
        self.events.subscribe()
    }

    /// Calls a waiting token to the consultation room.
    ///
    /// # Errors
    ///
    /// `QueueError::InvalidTransition` unless the token is `waiting`; the
    /// event is only published on success.
    pub fn call(&self, token_id: Uuid) -> QueueResult<Token> {
        let token = self.store.update(token_id, Transition::Call)?;

        // send only fails when no subscriber is attached, which is fine: the
        // announcement layer is optional.
        let _ = self.events.send(TokenCalled {
            token_number: token.token_number,
            patient_name: token.patient_name.clone(),
        });

        Ok(token)
    }

    /// Marks a called token as completed.
    pub fn complete(&self, token_id: Uuid) -> QueueResult<Token> {
        self.store.update(token_id, Transition::Complete)
    }

    /// Cancels a waiting or called token.
    pub fn cancel(&self, token_id: Uuid) -> QueueResult<Token> {
        self.store.update(token_id, Transition::Cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::error::QueueError;
    use crate::store::MemoryTokenStore;
    use crate::token::{Priority, TokenDraft, TokenStatus};

    fn manager_with_token() -> (StatusTransitionManager, Token) {
        let store = Arc::new(MemoryTokenStore::new(&CoreConfig::standard()));
        let token = store
            .allocate(TokenDraft {
                patient_id: Uuid::new_v4(),
                patient_name: "Nusrat Jahan".into(),
                phone: "0171234567".into(),
                symptoms: "fever".into(),
                specialization: "General Medicine".into(),
                doctor_id: Uuid::new_v4(),
                doctor_name: "Dr Rahman".into(),
                priority: Priority::Normal,
            })
            .expect("allocate should succeed");
        (StatusTransitionManager::new(store), token)
    }

    #[test]
    fn test_call_transitions_token_and_publishes_event_once() {
        let (manager, token) = manager_with_token();
        let mut events = manager.subscribe();

        let called = manager.call(token.id).expect("call should succeed");
        assert_eq!(called.status, TokenStatus::Called);

        let event = events.try_recv().expect("one event should be pending");
        assert_eq!(
            event,
            TokenCalled {
                token_number: token.token_number,
                patient_name: "Nusrat Jahan".into(),
            }
        );
        assert!(events.try_recv().is_err(), "exactly one event per call");
    }

    #[test]
    fn test_failed_call_publishes_no_event() {
        let (manager, token) = manager_with_token();
        manager.call(token.id).expect("first call should succeed");

        let mut events = manager.subscribe();
        let err = manager
            .call(token.id)
            .expect_err("calling a called token should fail");
        assert!(matches!(err, QueueError::InvalidTransition { .. }));
        assert!(events.try_recv().is_err(), "failed call must not announce");
    }

    #[test]
    fn test_complete_requires_called_status() {
        let (manager, token) = manager_with_token();

        let err = manager
            .complete(token.id)
            .expect_err("completing a waiting token should fail");
        assert!(matches!(err, QueueError::InvalidTransition { .. }));

        manager.call(token.id).expect("call should succeed");
        let completed = manager.complete(token.id).expect("complete should succeed");
        assert_eq!(completed.status, TokenStatus::Completed);
    }

    #[test]
    fn test_cancel_is_effective_once() {
        let (manager, token) = manager_with_token();

        let cancelled = manager.cancel(token.id).expect("first cancel should succeed");
        assert_eq!(cancelled.status, TokenStatus::Cancelled);

        let err = manager
            .cancel(token.id)
            .expect_err("second cancel should fail");
        assert!(matches!(err, QueueError::InvalidTransition { .. }));
    }

    #[test]
    fn test_events_reach_multiple_subscribers() {
        let (manager, token) = manager_with_token();
        let mut first = manager.subscribe();
        let mut second = manager.subscribe();

        manager.call(token.id).expect("call should succeed");

        assert!(first.try_recv().is_ok());
        assert!(second.try_recv().is_ok());
    }
}
