pub mod controller;
pub mod countdown;
pub mod reconcile;
pub mod round;
pub mod store;
pub mod ticker;
pub mod ws;


pub use controller::RoundController;
pub use countdown::{Countdown, CountdownEvent, CountdownSignal};
pub use reconcile::ReconcileError;
pub use round::{GameState, PlayerState, RoundGames};
pub use store::{RoundStore, StoreError};
