use crate::reconcile;
use crate::round::RoundGames;
use crate::store::{RoundStore, StoreError};
use crate::ticker::{advance_think_time, THINK_TIME_TICK};
use liveboard_protocol::RoundMessage;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Owns one round's live state: a store fed by exactly one task that folds
/// in feed messages (in delivery order) and the 1 Hz think-time ticker.
///
/// Both producers run on the same task, so a read-modify-replace cycle can
/// never interleave with another one.
pub struct RoundController {
    store: Arc<RoundStore>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl RoundController {
    /// Spawn the reconciliation task over a settled initial snapshot and a
    /// feed subscription. The first snapshot is published before any event
    /// is processed.
    pub fn start(initial: RoundGames, events: mpsc::UnboundedReceiver<RoundMessage>) -> Self {
        let store = Arc::new(RoundStore::new());
        store.replace(initial);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(run(Arc::clone(&store), events, shutdown_rx));

        RoundController {
            store,
            shutdown: Mutex::new(Some(shutdown_tx)),
        }
    }

    /// Latest snapshot of the round.
    pub fn games(&self) -> Result<RoundGames, StoreError> {
        self.store.current()
    }

    /// Observer channel receiving every published snapshot.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RoundGames> {
        self.store.subscribe()
    }

    /// End the round: stops the ticker and the feed subscription together.
    /// Idempotent; events already in flight are dropped by the closed store.
    pub fn close(&self) {
        self.store.close();
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.store.is_closed()
    }
}

impl Drop for RoundController {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run(
    store: Arc<RoundStore>,
    mut events: mpsc::UnboundedReceiver<RoundMessage>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval_at(Instant::now() + THINK_TIME_TICK, THINK_TIME_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Some(message) => apply_message(&store, &message),
                None => {
                    // Feed ended. Keep the last snapshot, stop updating.
                    debug!("round feed terminated");
                    break;
                }
            },
            _ = ticker.tick() => {
                if let Ok(current) = store.current() {
                    store.replace(advance_think_time(&current, THINK_TIME_TICK));
                }
            }
        }
    }
    store.close();
}

fn apply_message(store: &RoundStore, message: &RoundMessage) {
    let current = match store.current() {
        Ok(games) => games,
        Err(StoreError::NotInitialized) => return,
    };
    match reconcile::apply(&current, message) {
        Ok(next) => store.replace(next),
        // One bad frame must not take the stream down.
        Err(err) => warn!("dropping event: {err}"),
    }
}
