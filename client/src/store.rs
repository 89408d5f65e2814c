use crate::round::RoundGames;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("round store read before the initial snapshot settled")]
    NotInitialized,
}

/// Sole owner of the round's current snapshot.
///
/// Producers hand in a complete replacement snapshot; observers receive a
/// clone of every published one. There are no partial updates: a transition
/// is store-wide or it does not happen.
#[derive(Debug, Default)]
pub struct RoundStore {
    inner: Mutex<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    games: Option<RoundGames>,
    observers: Vec<mpsc::UnboundedSender<RoundGames>>,
    closed: bool,
}

impl RoundStore {
    pub fn new() -> Self {
        RoundStore::default()
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Result<RoundGames, StoreError> {
        self.inner
            .lock()
            .games
            .clone()
            .ok_or(StoreError::NotInitialized)
    }

    /// Atomically publish `next` and notify every live observer.
    ///
    /// Ignored once the store is closed, so an event that raced past the
    /// controller's shutdown cannot resurface.
    pub fn replace(&self, next: RoundGames) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        inner.observers.retain(|tx| tx.send(next.clone()).is_ok());
        inner.games = Some(next);
    }

    /// Register an observer channel; it receives every snapshot published
    /// from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RoundGames> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        if !inner.closed {
            inner.observers.push(tx);
        }
        rx
    }

    /// Stop publishing. Idempotent. The last snapshot stays readable.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.observers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_first_replace_fails() {
        let store = RoundStore::new();
        assert_eq!(store.current(), Err(StoreError::NotInitialized));
    }

    #[test]
    fn replace_publishes_to_observers() {
        let store = RoundStore::new();
        let mut rx = store.subscribe();

        store.replace(RoundGames::new());
        assert_eq!(store.current(), Ok(RoundGames::new()));
        assert_eq!(rx.try_recv(), Ok(RoundGames::new()));
    }

    #[test]
    fn close_is_idempotent_and_freezes_snapshot() {
        let store = RoundStore::new();
        let mut rx = store.subscribe();
        store.replace(RoundGames::new());
        let _ = rx.try_recv();

        store.close();
        store.close();
        store.replace(RoundGames::new());

        // Last snapshot intact, no further publishes.
        assert!(store.current().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn subscribe_after_close_yields_closed_channel() {
        let store = RoundStore::new();
        store.close();
        let mut rx = store.subscribe();
        assert_eq!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );
    }
}
