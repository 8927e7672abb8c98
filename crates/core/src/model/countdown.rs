use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time::elapsed_ms;

/// Percentage of the total duration below which the timer reports low time.
pub const DEFAULT_LOW_TIME_PERCENT: u8 = 20;

/// How each tick derives the remaining time.
///
/// `Decrement` subtracts one second per tick, so it drifts when ticks are
/// delayed (throttled background windows). `Deadline` recomputes
/// `deadline - now` on every tick and stays aligned with the wall clock.
/// Both keep the remaining value monotonic and fire expiry once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerStrategy {
    #[default]
    Decrement,
    Deadline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Expired,
}

/// What a single tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Not running: idle, paused or already expired.
    Inert,
    Tick {
        remaining_secs: u64,
        /// True only on the tick that first crossed the low-time threshold.
        entered_low_time: bool,
    },
    /// Remaining time reached zero. Emitted exactly once per timer.
    Expired,
}

/// Whole-second countdown with a one-shot expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTimer {
    strategy: TimerStrategy,
    status: TimerStatus,
    total_secs: u64,
    remaining_secs: u64,
    deadline: Option<DateTime<Utc>>,
    low_time_percent: u8,
    low_time_seen: bool,
}

impl CountdownTimer {
    #[must_use]
    pub fn new(duration_minutes: u32, strategy: TimerStrategy) -> Self {
        Self::from_secs(u64::from(duration_minutes) * 60, strategy)
    }

    #[must_use]
    pub fn from_secs(total_secs: u64, strategy: TimerStrategy) -> Self {
        Self {
            strategy,
            status: TimerStatus::Idle,
            total_secs,
            remaining_secs: total_secs,
            deadline: None,
            low_time_percent: DEFAULT_LOW_TIME_PERCENT,
            low_time_seen: false,
        }
    }

    #[must_use]
    pub fn with_low_time_percent(mut self, percent: u8) -> Self {
        self.low_time_percent = percent.min(100);
        self
    }

    #[must_use]
    pub fn strategy(&self) -> TimerStrategy {
        self.strategy
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    #[must_use]
    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.status == TimerStatus::Expired
    }

    /// Whether the remaining time is at or below the low-time threshold.
    /// Presentation data only; nothing is enforced by it.
    #[must_use]
    pub fn is_low_time(&self) -> bool {
        self.remaining_secs.saturating_mul(100)
            <= self.total_secs.saturating_mul(u64::from(self.low_time_percent))
    }

    /// Starts an idle timer with its full duration.
    pub fn start(&mut self, now: DateTime<Utc>) {
        let remaining = self.remaining_secs;
        self.start_with_remaining(remaining, now);
    }

    /// Starts an idle timer from a resumed remaining value, capped at the total.
    pub fn start_with_remaining(&mut self, remaining_secs: u64, now: DateTime<Utc>) {
        if self.status != TimerStatus::Idle {
            return;
        }
        self.remaining_secs = remaining_secs.min(self.total_secs);
        self.low_time_seen = self.is_low_time();
        self.status = TimerStatus::Running;
        self.deadline = Some(now + secs_duration(self.remaining_secs));
    }

    /// Applies a duration change coming from the outside.
    ///
    /// An unchanged value is a no-op, so repeated configuration with the same
    /// duration never resets the countdown. A different value only takes
    /// effect before the timer has started. Returns whether anything changed.
    pub fn reconfigure(&mut self, duration_minutes: u32) -> bool {
        let total_secs = u64::from(duration_minutes) * 60;
        if total_secs == self.total_secs || self.status != TimerStatus::Idle {
            return false;
        }
        self.total_secs = total_secs;
        self.remaining_secs = total_secs;
        true
    }

    /// Advances the countdown by one tick.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerEvent {
        if self.status != TimerStatus::Running {
            return TimerEvent::Inert;
        }

        let next = match self.strategy {
            TimerStrategy::Decrement => self.remaining_secs.saturating_sub(1),
            TimerStrategy::Deadline => self.remaining_from_deadline(now),
        };
        self.remaining_secs = next.min(self.remaining_secs);

        if self.remaining_secs == 0 {
            self.status = TimerStatus::Expired;
            self.deadline = None;
            return TimerEvent::Expired;
        }

        let entered_low_time = !self.low_time_seen && self.is_low_time();
        if entered_low_time {
            self.low_time_seen = true;
        }
        TimerEvent::Tick {
            remaining_secs: self.remaining_secs,
            entered_low_time,
        }
    }

    /// Freezes the countdown. A paused timer neither decrements nor expires.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.status != TimerStatus::Running {
            return;
        }
        if self.strategy == TimerStrategy::Deadline {
            self.remaining_secs = self.remaining_from_deadline(now).min(self.remaining_secs);
        }
        self.deadline = None;
        self.status = TimerStatus::Paused;
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.status != TimerStatus::Paused {
            return;
        }
        self.deadline = Some(now + secs_duration(self.remaining_secs));
        self.status = TimerStatus::Running;
    }

    fn remaining_from_deadline(&self, now: DateTime<Utc>) -> u64 {
        let Some(deadline) = self.deadline else {
            return self.remaining_secs;
        };
        // Round up so the display does not show 0 while time is left.
        elapsed_ms(now, deadline).div_ceil(1000)
    }
}

fn secs_duration(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
}
