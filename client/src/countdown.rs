use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Nominal tick period of a driven countdown. Each tick subtracts the time
/// that actually passed, so a late tick never loses ground.
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Minimum spacing between two emergency signals.
pub const EMERGENCY_COOLDOWN: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownSignal {
    /// The budget ran out. Fired exactly once per supplied duration.
    Flag,
    /// The budget dropped to the emergency threshold.
    Emergency,
}

/// Event stream of a driven countdown, see [`drive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    TimeLeft(Duration),
    Flag,
    Emergency,
}

/// A single decrementing time budget.
///
/// Inactive until [`start`](Countdown::start); while active,
/// [`tick`](Countdown::tick) subtracts elapsed wall time and reports the
/// flag fall or the emergency threshold. Hitting zero stops the countdown;
/// the flag is terminal for the supplied duration, a fresh budget arrives
/// via [`set_time`](Countdown::set_time).
#[derive(Debug)]
pub struct Countdown {
    time_left: Duration,
    emergency_threshold: Option<Duration>,
    active: bool,
    flagged: bool,
    /// Measurement base of the last tick or (re)start.
    measured_at: Option<Instant>,
    emergency_armed: bool,
    next_emergency: Option<Instant>,
}

impl Countdown {
    pub fn new(time: Duration) -> Self {
        Countdown {
            time_left: time,
            emergency_threshold: None,
            active: false,
            flagged: false,
            measured_at: None,
            emergency_armed: true,
            next_emergency: None,
        }
    }

    pub fn with_emergency_threshold(mut self, threshold: Duration) -> Self {
        self.emergency_threshold = Some(threshold);
        self
    }

    pub fn time_left(&self) -> Duration {
        self.time_left
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Supply a fresh budget. Clears the flag latch; the emergency re-arms
    /// through the usual recovery rule on the next tick.
    pub fn set_time(&mut self, time: Duration) {
        self.time_left = time;
        self.flagged = false;
        if self.active {
            self.measured_at = Some(Instant::now());
        }
    }

    /// Begin (or keep) decrementing. Re-entrant: restarting while active
    /// resets the measurement base, not the remaining time.
    pub fn start(&mut self) {
        self.active = true;
        self.measured_at = Some(Instant::now());
    }

    /// Halt, clamp at zero, and return what is left.
    pub fn stop(&mut self) -> Duration {
        if self.active {
            let now = Instant::now();
            let base = self.measured_at.unwrap_or(now);
            self.time_left = self.time_left.saturating_sub(now - base);
        }
        self.active = false;
        self.measured_at = None;
        self.time_left
    }

    /// Subtract the actually elapsed time since the last measurement.
    ///
    /// Returns the signal this tick produced, if any. Once the budget hits
    /// zero the countdown clamps, deactivates, and the flag fires on that
    /// tick only.
    pub fn tick(&mut self) -> Option<CountdownSignal> {
        if !self.active {
            return None;
        }
        let now = Instant::now();
        let base = self.measured_at.unwrap_or(now);
        self.measured_at = Some(now);
        self.time_left = self.time_left.saturating_sub(now - base);

        if self.time_left.is_zero() {
            self.active = false;
            if !self.flagged {
                self.flagged = true;
                return Some(CountdownSignal::Flag);
            }
            return None;
        }

        if let Some(threshold) = self.emergency_threshold {
            if self.time_left <= threshold {
                let cooled_down = self.next_emergency.map_or(true, |at| now >= at);
                if self.emergency_armed && cooled_down {
                    self.emergency_armed = false;
                    self.next_emergency = Some(now + EMERGENCY_COOLDOWN);
                    return Some(CountdownSignal::Emergency);
                }
            } else if self.time_left > threshold * 3 / 2 {
                // Recovered well clear of the threshold (increment, undo).
                self.emergency_armed = true;
            }
        }
        None
    }
}

/// Run a countdown to its flag (or until the observer goes away), posting
/// time and signals through `events`. Returns the countdown so the caller
/// can refill and reuse it.
pub async fn drive(
    mut countdown: Countdown,
    events: mpsc::UnboundedSender<CountdownEvent>,
) -> Countdown {
    let mut ticks = time::interval(TICK_PERIOD);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    countdown.start();
    // interval's first tick completes immediately; consume it so the first
    // real measurement spans a full period.
    ticks.tick().await;

    while countdown.is_active() {
        ticks.tick().await;
        let signal = countdown.tick();
        if events
            .send(CountdownEvent::TimeLeft(countdown.time_left()))
            .is_err()
        {
            break;
        }
        match signal {
            Some(CountdownSignal::Flag) => {
                let _ = events.send(CountdownEvent::Flag);
                break;
            }
            Some(CountdownSignal::Emergency) => {
                let _ = events.send(CountdownEvent::Emergency);
            }
            None => {}
        }
    }
    countdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn clamps_to_zero_and_flags_once() {
        let mut cd = Countdown::new(Duration::from_millis(500));
        cd.start();

        advance(Duration::from_millis(600)).await;
        assert_eq!(cd.tick(), Some(CountdownSignal::Flag));
        assert_eq!(cd.time_left(), Duration::ZERO);
        assert!(!cd.is_active());

        // Further ticks while inactive stay silent.
        advance(Duration::from_millis(200)).await;
        assert_eq!(cd.tick(), None);
        assert_eq!(cd.tick(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_flag_does_not_reflag_at_zero() {
        let mut cd = Countdown::new(Duration::from_millis(100));
        cd.start();
        advance(Duration::from_millis(150)).await;
        assert_eq!(cd.tick(), Some(CountdownSignal::Flag));

        // Resumes from whatever is left (zero) without a second flag.
        cd.start();
        advance(Duration::from_millis(100)).await;
        assert_eq!(cd.tick(), None);

        // A fresh budget arms the flag again.
        cd.set_time(Duration::from_millis(100));
        cd.start();
        advance(Duration::from_millis(150)).await;
        assert_eq!(cd.tick(), Some(CountdownSignal::Flag));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_subtracts_elapsed_and_clamps() {
        let mut cd = Countdown::new(Duration::from_secs(10));
        cd.start();
        advance(Duration::from_secs(4)).await;
        assert_eq!(cd.stop(), Duration::from_secs(6));
        assert!(!cd.is_active());

        // Stopped time does not run.
        advance(Duration::from_secs(60)).await;
        assert_eq!(cd.time_left(), Duration::from_secs(6));

        cd.start();
        advance(Duration::from_secs(60)).await;
        assert_eq!(cd.stop(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_measurement_base_not_time() {
        let mut cd = Countdown::new(Duration::from_secs(10));
        cd.start();
        advance(Duration::from_secs(3)).await;
        // Re-entrant start: the 3s that passed are forgotten, the budget is not.
        cd.start();
        advance(Duration::from_secs(2)).await;
        assert_eq!(cd.stop(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn emergency_fires_once_below_threshold() {
        let mut cd = Countdown::new(Duration::from_secs(60))
            .with_emergency_threshold(Duration::from_secs(20));
        cd.start();

        advance(Duration::from_secs(41)).await;
        assert_eq!(cd.tick(), Some(CountdownSignal::Emergency));
        assert_eq!(cd.time_left(), Duration::from_secs(19));

        // Hovering below the threshold for the next 25 seconds stays quiet,
        // cooldown or not: the signal never re-armed.
        for _ in 0..25 {
            advance(Duration::from_millis(500)).await;
            assert_eq!(cd.tick(), None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emergency_rearms_after_recovery_and_cooldown() {
        let mut cd = Countdown::new(Duration::from_secs(60))
            .with_emergency_threshold(Duration::from_secs(20));
        cd.start();

        advance(Duration::from_secs(41)).await;
        assert_eq!(cd.tick(), Some(CountdownSignal::Emergency));

        // An increment lifts the budget over 1.5x the threshold...
        cd.set_time(Duration::from_secs(40));
        advance(Duration::from_secs(1)).await;
        assert_eq!(cd.tick(), None); // 39s left, re-armed

        // ...but a fresh drop below the threshold still waits out the
        // 20-second cooldown from the first signal.
        advance(Duration::from_secs(10)).await;
        assert_eq!(cd.tick(), None); // 29s left, above threshold
        advance(Duration::from_secs(10)).await;
        // 19s left, armed, 22s since the first signal.
        assert_eq!(cd.tick(), Some(CountdownSignal::Emergency));
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_below_one_and_a_half_threshold_stays_disarmed() {
        let mut cd = Countdown::new(Duration::from_secs(60))
            .with_emergency_threshold(Duration::from_secs(20));
        cd.start();

        advance(Duration::from_secs(41)).await;
        assert_eq!(cd.tick(), Some(CountdownSignal::Emergency));

        // 25s is above the threshold but not above 30s, so no re-arm.
        cd.set_time(Duration::from_secs(25));
        advance(Duration::from_secs(1)).await;
        assert_eq!(cd.tick(), None);
        advance(Duration::from_secs(5)).await;
        assert_eq!(cd.tick(), None); // back below threshold, still disarmed
    }

    #[tokio::test(start_paused = true)]
    async fn drive_posts_time_and_terminal_flag() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cd = Countdown::new(Duration::from_millis(350));
        let handle = tokio::spawn(drive(cd, tx));

        let mut time_updates = 0;
        let mut flagged = 0;
        while let Some(event) = rx.recv().await {
            match event {
                CountdownEvent::TimeLeft(left) => {
                    time_updates += 1;
                    assert!(left <= Duration::from_millis(350));
                }
                CountdownEvent::Flag => flagged += 1,
                CountdownEvent::Emergency => panic!("no threshold configured"),
            }
        }

        let cd = handle.await.unwrap();
        assert_eq!(flagged, 1);
        assert_eq!(time_updates, 4); // 100ms ticks over a 350ms budget
        assert_eq!(cd.time_left(), Duration::ZERO);
        assert!(!cd.is_active());
    }
}
