use std::collections::HashMap;

use crate::model::ids::{OptionKey, QuestionId};

/// Selection and flag state for a single question.
///
/// An absent ledger entry and `AnswerEntry::default()` mean the same thing:
/// unanswered and unflagged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerEntry {
    pub selected: Option<OptionKey>,
    pub flagged: bool,
}

impl AnswerEntry {
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }
}

/// Authoritative in-memory record of answers and flags for one attempt.
///
/// Mutations always succeed locally; persisting them is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    entries: HashMap<QuestionId, AnswerEntry>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a ledger from previously persisted entries (resumed attempt).
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (QuestionId, AnswerEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Replaces any prior selection for `question`.
    pub fn select(&mut self, question: QuestionId, key: OptionKey) -> &AnswerEntry {
        let entry = self.entries.entry(question).or_default();
        entry.selected = Some(key);
        entry
    }

    /// Clears the selection for `question`; the flag is untouched.
    pub fn clear(&mut self, question: QuestionId) -> &AnswerEntry {
        let entry = self.entries.entry(question).or_default();
        entry.selected = None;
        entry
    }

    /// Flips the flag for `question`; the selection is untouched.
    pub fn toggle_flag(&mut self, question: QuestionId) -> &AnswerEntry {
        let entry = self.entries.entry(question).or_default();
        entry.flagged = !entry.flagged;
        entry
    }

    /// Current state for `question`, defaulting to unanswered and unflagged.
    #[must_use]
    pub fn entry(&self, question: QuestionId) -> AnswerEntry {
        self.entries.get(&question).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn selected(&self, question: QuestionId) -> Option<&OptionKey> {
        self.entries
            .get(&question)
            .and_then(|entry| entry.selected.as_ref())
    }

    #[must_use]
    pub fn is_flagged(&self, question: QuestionId) -> bool {
        self.entries.get(&question).is_some_and(|entry| entry.flagged)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_answered()).count()
    }

    /// Immutable copy for rendering and payload construction.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            entries: self.entries.clone(),
        }
    }
}

/// Read-only copy of an `AnswerLedger`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    entries: HashMap<QuestionId, AnswerEntry>,
}

impl LedgerSnapshot {
    #[must_use]
    pub fn entry(&self, question: QuestionId) -> AnswerEntry {
        self.entries.get(&question).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn selected(&self, question: QuestionId) -> Option<&OptionKey> {
        self.entries
            .get(&question)
            .and_then(|entry| entry.selected.as_ref())
    }

    #[must_use]
    pub fn is_answered(&self, question: QuestionId) -> bool {
        self.selected(question).is_some()
    }

    #[must_use]
    pub fn is_flagged(&self, question: QuestionId) -> bool {
        self.entries.get(&question).is_some_and(|entry| entry.flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: u64) -> QuestionId {
        QuestionId::new(id)
    }

    #[test]
    fn select_replaces_previous_choice() {
        let mut ledger = AnswerLedger::new();
        ledger.select(q(1), OptionKey::from("A"));
        ledger.select(q(1), OptionKey::from("C"));
        assert_eq!(ledger.selected(q(1)), Some(&OptionKey::from("C")));
        assert_eq!(ledger.answered_count(), 1);
    }

    #[test]
    fn flag_and_selection_are_independent() {
        let mut ledger = AnswerLedger::new();
        ledger.select(q(1), OptionKey::from("B"));
        ledger.toggle_flag(q(1));
        assert_eq!(ledger.selected(q(1)), Some(&OptionKey::from("B")));
        assert!(ledger.is_flagged(q(1)));

        ledger.select(q(1), OptionKey::from("D"));
        assert!(ledger.is_flagged(q(1)));

        ledger.toggle_flag(q(1));
        assert!(!ledger.is_flagged(q(1)));
        assert_eq!(ledger.selected(q(1)), Some(&OptionKey::from("D")));
    }

    #[test]
    fn clear_keeps_flag() {
        let mut ledger = AnswerLedger::new();
        ledger.select(q(2), OptionKey::from("A"));
        ledger.toggle_flag(q(2));
        let entry = ledger.clear(q(2)).clone();
        assert_eq!(entry, AnswerEntry { selected: None, flagged: true });
    }

    #[test]
    fn absent_entry_reads_as_unanswered() {
        let ledger = AnswerLedger::new();
        assert_eq!(ledger.entry(q(9)), AnswerEntry::default());
        let explicit = AnswerLedger::from_entries([(q(9), AnswerEntry::default())]);
        assert_eq!(explicit.entry(q(9)), ledger.entry(q(9)));
        assert_eq!(explicit.answered_count(), 0);
    }

    #[test]
    fn unknown_option_key_is_accepted() {
        let mut ledger = AnswerLedger::new();
        ledger.select(q(1), OptionKey::from("Z"));
        assert_eq!(ledger.selected(q(1)), Some(&OptionKey::from("Z")));
    }

    #[test]
    fn snapshot_does_not_follow_later_mutations() {
        let mut ledger = AnswerLedger::new();
        ledger.select(q(1), OptionKey::from("A"));
        let snapshot = ledger.snapshot();
        ledger.select(q(1), OptionKey::from("B"));
        ledger.toggle_flag(q(3));
        assert_eq!(snapshot.selected(q(1)), Some(&OptionKey::from("A")));
        assert!(!snapshot.is_flagged(q(3)));
    }
}
