//! Observable request state.
//!
//! A [`StateHolder`] owns the latest [`PlayState`] of one operation and hands
//! out `watch` receivers to observers. Publishing a value equal to the current
//! one is dropped, so observers are only woken by real changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// Outcome of the latest request of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum PlayState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> PlayState<T> {
    pub fn error(cause: impl std::fmt::Display) -> Self {
        Self::Error(cause.to_string())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for PlayState<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::error(e),
        }
    }
}

#[derive(Debug)]
pub struct StateHolder<T> {
    name: &'static str,
    tx: watch::Sender<PlayState<T>>,
}

impl<T: Clone + PartialEq> StateHolder<T> {
    pub fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(PlayState::Loading);
        Self { name, tx }
    }

    /// Replaces the current state. Returns `false` when `state` equals the
    /// current one and observers were not notified.
    pub fn publish(&self, state: PlayState<T>) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if !changed {
            debug!(state = self.name, "State unchanged, not publishing");
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayState<T>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> PlayState<T> {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_loading() {
        let holder: StateHolder<u32> = StateHolder::new("test");
        assert!(holder.current().is_loading());
    }

    #[test]
    fn test_identical_state_does_not_notify_twice() {
        let holder = StateHolder::new("test");
        let mut rx = holder.subscribe();

        assert!(holder.publish(PlayState::Success(7)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), PlayState::Success(7));

        assert!(!holder.publish(PlayState::Success(7)));
        assert!(!rx.has_changed().unwrap());

        assert!(holder.publish(PlayState::Error("boom".to_string())));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_value(PlayState::Success(3)).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "success", "data": 3 }));

        let json = serde_json::to_value(PlayState::<u8>::Loading).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "loading" }));
    }

    #[test]
    fn test_from_result() {
        let state: PlayState<u8> = Err::<u8, _>("offline").into();
        assert_eq!(state, PlayState::Error("offline".to_string()));
    }
}
