use crate::round::RoundGames;
use std::time::Duration;

/// Cadence of the local think-time ticker.
pub const THINK_TIME_TICK: Duration = Duration::from_secs(1);

/// One ticker firing: every game still running accrues `elapsed` of think
/// time, finished games pass through unchanged.
pub fn advance_think_time(current: &RoundGames, elapsed: Duration) -> RoundGames {
    let mut next = current.clone();
    for (_, game) in next.iter_mut() {
        if game.playing {
            game.think_time += elapsed;
        }
    }
    next
}
