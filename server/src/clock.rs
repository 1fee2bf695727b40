use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Tick(u32),
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockState {
    Running {
        started_at: Instant,
        duration_secs: u32,
        // Remaining-seconds value of the next tick to announce.
        next_tick: u32,
    },
    Expired,
    Cancelled,
}

/// Countdown for a single round, driven by polling from the session's thread.
///
/// The full duration is announced on the first poll, then one tick per
/// elapsed second down to zero, then `Expired` exactly once. A late poll
/// catches up on every second it missed, in order.
#[derive(Debug)]
pub struct RoundClock {
    state: ClockState,
}

impl RoundClock {
    pub fn start(duration_secs: u32, now: Instant) -> Self {
        Self {
            state: ClockState::Running {
                started_at: now,
                duration_secs,
                next_tick: duration_secs,
            },
        }
    }

    pub fn poll(&mut self, now: Instant) -> Vec<ClockEvent> {
        let ClockState::Running {
            started_at,
            duration_secs,
            mut next_tick,
        } = self.state
        else {
            return Vec::new();
        };

        let elapsed = now.saturating_duration_since(started_at).as_secs();
        let remaining = u64::from(duration_secs).saturating_sub(elapsed) as u32;

        let mut events = Vec::new();
        while next_tick >= remaining {
            events.push(ClockEvent::Tick(next_tick));
            if next_tick == 0 {
                events.push(ClockEvent::Expired);
                self.state = ClockState::Expired;
                return events;
            }
            next_tick -= 1;
        }

        self.state = ClockState::Running {
            started_at,
            duration_secs,
            next_tick,
        };
        events
    }

    /// Idempotent. Nothing is delivered by `poll` afterwards.
    pub fn cancel(&mut self) {
        if matches!(self.state, ClockState::Running { .. }) {
            self.state = ClockState::Cancelled;
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running { .. })
    }

    #[cfg(test)]
    pub fn has_expired(&self) -> bool {
        matches!(self.state, ClockState::Expired)
    }

    /// Seconds left as of the last announced tick.
    pub fn remaining_secs(&self) -> u32 {
        match self.state {
            ClockState::Running {
                duration_secs,
                next_tick,
                ..
            } => (next_tick + 1).min(duration_secs),
            ClockState::Expired | ClockState::Cancelled => 0,
        }
    }
}
