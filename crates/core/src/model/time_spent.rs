use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::ids::QuestionId;
use crate::time::elapsed_ms;

/// Whole seconds spent viewing each question. Values never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSpentLedger {
    secs: HashMap<QuestionId, u64>,
}

impl TimeSpentLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (QuestionId, u64)>) -> Self {
        Self {
            secs: entries.into_iter().collect(),
        }
    }

    /// Seconds recorded for `question`, zero when never viewed.
    #[must_use]
    pub fn seconds(&self, question: QuestionId) -> u64 {
        self.secs.get(&question).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.secs.values().sum()
    }

    fn add(&mut self, question: QuestionId, secs: u64) {
        let slot = self.secs.entry(question).or_insert(0);
        *slot = slot.saturating_add(secs);
    }
}

/// Accumulates viewing time per question across navigation.
///
/// Each `record_elapsed` call charges the time since the last checkpoint to the
/// given question in whole seconds. The sub-second remainder is carried per
/// question instead of discarded, so many short visits still add up: ten
/// half-second visits to one question record five seconds. Because every
/// charge is floored, the ledger total never exceeds the wall-clock time
/// measured by the checkpoints.
#[derive(Debug, Clone)]
pub struct TimeAccountant {
    checkpoint: DateTime<Utc>,
    ledger: TimeSpentLedger,
    carry_ms: HashMap<QuestionId, u64>,
}

impl TimeAccountant {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self::with_ledger(TimeSpentLedger::new(), started_at)
    }

    /// Resumes accounting on top of time already persisted for the attempt.
    #[must_use]
    pub fn with_ledger(ledger: TimeSpentLedger, started_at: DateTime<Utc>) -> Self {
        Self {
            checkpoint: started_at,
            ledger,
            carry_ms: HashMap::new(),
        }
    }

    #[must_use]
    pub fn checkpoint(&self) -> DateTime<Utc> {
        self.checkpoint
    }

    #[must_use]
    pub fn ledger(&self) -> &TimeSpentLedger {
        &self.ledger
    }

    /// Charges `now - checkpoint` to `question` and moves the checkpoint to `now`.
    ///
    /// Returns the whole seconds added by this call. A `now` earlier than the
    /// checkpoint charges nothing and leaves the checkpoint in place.
    pub fn record_elapsed(&mut self, question: QuestionId, now: DateTime<Utc>) -> u64 {
        if now <= self.checkpoint {
            return 0;
        }
        let delta_ms = elapsed_ms(self.checkpoint, now);
        self.checkpoint = now;

        let carry = self.carry_ms.entry(question).or_insert(0);
        let total_ms = carry.saturating_add(delta_ms);
        let secs = total_ms / 1000;
        *carry = total_ms % 1000;

        self.ledger.add(question, secs);
        secs
    }

    /// Seconds `question` would hold if it were charged up to `now`, leaving
    /// the checkpoint and carry untouched. Only meaningful for the question
    /// currently on screen.
    #[must_use]
    pub fn seconds_with_pending(&self, question: QuestionId, now: DateTime<Utc>) -> u64 {
        let recorded = self.ledger.seconds(question);
        if now <= self.checkpoint {
            return recorded;
        }
        let carry = self.carry_ms.get(&question).copied().unwrap_or(0);
        let pending = carry.saturating_add(elapsed_ms(self.checkpoint, now)) / 1000;
        recorded.saturating_add(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn q(id: u64) -> QuestionId {
        QuestionId::new(id)
    }

    #[test]
    fn records_whole_seconds_and_moves_checkpoint() {
        let start = fixed_now();
        let mut accountant = TimeAccountant::new(start);

        let added = accountant.record_elapsed(q(1), start + Duration::milliseconds(12_400));
        assert_eq!(added, 12);
        assert_eq!(accountant.ledger().seconds(q(1)), 12);
        assert_eq!(accountant.checkpoint(), start + Duration::milliseconds(12_400));
    }

    #[test]
    fn accumulates_across_visits() {
        let start = fixed_now();
        let mut accountant = TimeAccountant::new(start);
        accountant.record_elapsed(q(1), start + Duration::seconds(5));
        accountant.record_elapsed(q(2), start + Duration::seconds(8));
        accountant.record_elapsed(q(1), start + Duration::seconds(10));

        assert_eq!(accountant.ledger().seconds(q(1)), 7);
        assert_eq!(accountant.ledger().seconds(q(2)), 3);
        assert_eq!(accountant.ledger().total_seconds(), 10);
    }

    #[test]
    fn sub_second_visits_are_carried_not_dropped() {
        let start = fixed_now();
        let mut accountant = TimeAccountant::new(start);
        let mut now = start;
        for _ in 0..10 {
            now += Duration::milliseconds(500);
            accountant.record_elapsed(q(1), now);
        }
        assert_eq!(accountant.ledger().seconds(q(1)), 5);
    }

    #[test]
    fn total_never_exceeds_wall_clock() {
        let start = fixed_now();
        let mut accountant = TimeAccountant::new(start);
        let mut now = start;
        let steps = [1_300, 700, 999, 2_001, 450, 3_333, 10];
        for (idx, step) in steps.iter().enumerate() {
            now += Duration::milliseconds(*step);
            accountant.record_elapsed(q(idx as u64 % 3), now);
        }
        let wall_secs = (now - start).num_seconds() as u64;
        assert!(accountant.ledger().total_seconds() <= wall_secs);
    }

    #[test]
    fn clock_going_backwards_charges_nothing() {
        let start = fixed_now();
        let mut accountant = TimeAccountant::new(start + Duration::seconds(10));
        assert_eq!(accountant.record_elapsed(q(1), start), 0);
        assert_eq!(accountant.checkpoint(), start + Duration::seconds(10));
    }

    #[test]
    fn pending_read_matches_a_later_charge_without_moving_the_checkpoint() {
        let start = fixed_now();
        let prior = TimeSpentLedger::from_entries([(q(1), 10)]);
        let mut accountant = TimeAccountant::with_ledger(prior, start);
        accountant.record_elapsed(q(1), start + Duration::milliseconds(1_600));

        let later = start + Duration::milliseconds(41_900);
        assert_eq!(accountant.seconds_with_pending(q(1), later), 51);
        assert_eq!(accountant.ledger().seconds(q(1)), 11);
        assert_eq!(accountant.checkpoint(), start + Duration::milliseconds(1_600));

        accountant.record_elapsed(q(1), later);
        assert_eq!(accountant.ledger().seconds(q(1)), 51);
        assert_eq!(accountant.seconds_with_pending(q(1), start), 51);
    }

    #[test]
    fn resumed_ledger_keeps_prior_time() {
        let start = fixed_now();
        let prior = TimeSpentLedger::from_entries([(q(1), 40)]);
        let mut accountant = TimeAccountant::with_ledger(prior, start);
        accountant.record_elapsed(q(1), start + Duration::seconds(2));
        assert_eq!(accountant.ledger().seconds(q(1)), 42);
    }
}
