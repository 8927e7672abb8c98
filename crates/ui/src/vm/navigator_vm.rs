use exam_core::model::{LedgerSnapshot, QuestionEntry, QuestionId};

/// Overview status of one question, in precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionStatus {
    Current,
    Answered,
    Flagged,
    Unanswered,
}

impl QuestionStatus {
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            QuestionStatus::Current => "nav-item nav-item--current",
            QuestionStatus::Answered => "nav-item nav-item--answered",
            QuestionStatus::Flagged => "nav-item nav-item--flagged",
            QuestionStatus::Unanswered => "nav-item",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            QuestionStatus::Current => "current",
            QuestionStatus::Answered => "answered",
            QuestionStatus::Flagged => "flagged",
            QuestionStatus::Unanswered => "unanswered",
        }
    }
}

#[must_use]
pub fn question_status(
    index: usize,
    current_index: usize,
    question: QuestionId,
    ledger: &LedgerSnapshot,
) -> QuestionStatus {
    if index == current_index {
        QuestionStatus::Current
    } else if ledger.is_answered(question) {
        QuestionStatus::Answered
    } else if ledger.is_flagged(question) {
        QuestionStatus::Flagged
    } else {
        QuestionStatus::Unanswered
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigatorItemVm {
    pub index: usize,
    pub number: usize,
    pub question_id: QuestionId,
    pub status: QuestionStatus,
    /// Shown as a marker even when another status wins.
    pub flagged: bool,
}

/// Question overview grid. Holds nothing beyond what it was derived from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigatorVm {
    pub items: Vec<NavigatorItemVm>,
}

impl NavigatorVm {
    #[must_use]
    pub fn derive(
        questions: &[QuestionEntry],
        ledger: &LedgerSnapshot,
        current_index: usize,
    ) -> Self {
        let items = questions
            .iter()
            .enumerate()
            .map(|(index, question)| NavigatorItemVm {
                index,
                number: index + 1,
                question_id: question.id,
                status: question_status(index, current_index, question.id, ledger),
                flagged: ledger.is_flagged(question.id),
            })
            .collect();
        Self { items }
    }

    #[must_use]
    pub fn count(&self, status: QuestionStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AnswerLedger, AnswerOption, OptionId, OptionKey};

    fn questions(count: u64) -> Vec<QuestionEntry> {
        (1..=count)
            .map(|id| QuestionEntry {
                id: QuestionId::new(id),
                text: format!("Q{id}"),
                options: vec![AnswerOption {
                    id: OptionId::new(id),
                    key: OptionKey::from("A"),
                    text: "a".into(),
                }],
                correct_key: None,
                explanation: None,
            })
            .collect()
    }

    #[test]
    fn status_follows_precedence() {
        let questions = questions(4);
        let mut ledger = AnswerLedger::new();
        ledger.select(QuestionId::new(1), OptionKey::from("A"));
        ledger.select(QuestionId::new(2), OptionKey::from("A"));
        ledger.toggle_flag(QuestionId::new(2));
        ledger.toggle_flag(QuestionId::new(3));

        let vm = NavigatorVm::derive(&questions, &ledger.snapshot(), 0);
        let statuses: Vec<_> = vm.items.iter().map(|item| item.status).collect();

        assert_eq!(
            statuses,
            vec![
                QuestionStatus::Current,
                QuestionStatus::Answered,
                QuestionStatus::Flagged,
                QuestionStatus::Unanswered,
            ]
        );
        assert!(vm.items[1].flagged);
        assert_eq!(vm.count(QuestionStatus::Answered), 1);
    }

    #[test]
    fn derivation_is_pure() {
        let questions = questions(3);
        let mut ledger = AnswerLedger::new();
        ledger.toggle_flag(QuestionId::new(3));
        let snapshot = ledger.snapshot();

        let first = NavigatorVm::derive(&questions, &snapshot, 1);
        let second = NavigatorVm::derive(&questions, &snapshot, 1);
        assert_eq!(first, second);

        let moved = NavigatorVm::derive(&questions, &snapshot, 2);
        assert_eq!(moved.items[1].status, QuestionStatus::Unanswered);
        assert_eq!(moved.items[2].status, QuestionStatus::Current);
    }
}
