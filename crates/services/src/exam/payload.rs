use backend::SubmittedAnswer;
use exam_core::model::{LedgerSnapshot, QuestionEntry, TimeSpentLedger};

/// Builds the final submission payload.
///
/// Walks the questions in exam order and fills each entry from the ledger,
/// defaulting to no selection, zero seconds and not flagged. The result always
/// has exactly one entry per question, whatever order the ledger was filled in
/// and whatever it is missing. Ledger entries for unknown questions are ignored.
#[must_use]
pub fn reconcile(
    questions: &[QuestionEntry],
    ledger: &LedgerSnapshot,
    time_spent: &TimeSpentLedger,
) -> Vec<SubmittedAnswer> {
    questions
        .iter()
        .map(|question| {
            let entry = ledger.entry(question.id);
            SubmittedAnswer {
                question_id: question.id,
                selected_option_key: entry.selected,
                time_spent_seconds: time_spent.seconds(question.id),
                is_flagged: entry.flagged,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AnswerLedger, AnswerOption, OptionId, OptionKey, QuestionId};

    fn questions(ids: &[u64]) -> Vec<QuestionEntry> {
        ids.iter()
            .map(|id| QuestionEntry {
                id: QuestionId::new(*id),
                text: format!("Q{id}"),
                options: vec![AnswerOption {
                    id: OptionId::new(*id),
                    key: OptionKey::from("A"),
                    text: "a".into(),
                }],
                correct_key: None,
                explanation: None,
            })
            .collect()
    }

    #[test]
    fn payload_covers_every_question_in_order() {
        let questions = questions(&[3, 1, 2]);
        let mut ledger = AnswerLedger::new();
        ledger.toggle_flag(QuestionId::new(2));
        ledger.select(QuestionId::new(1), OptionKey::from("B"));
        let time = TimeSpentLedger::from_entries([(QuestionId::new(1), 14)]);

        let payload = reconcile(&questions, &ledger.snapshot(), &time);

        let ids: Vec<u64> = payload.iter().map(|a| a.question_id.value()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(payload[0].selected_option_key, None);
        assert_eq!(payload[0].time_spent_seconds, 0);
        assert_eq!(payload[1].selected_option_key, Some(OptionKey::from("B")));
        assert_eq!(payload[1].time_spent_seconds, 14);
        assert!(payload[2].is_flagged);
        assert_eq!(payload[2].selected_option_key, None);
    }

    #[test]
    fn partially_answered_exam_has_null_entries() {
        let questions = questions(&[1, 2, 3, 4, 5]);
        let mut ledger = AnswerLedger::new();
        ledger.select(QuestionId::new(4), OptionKey::from("C"));
        ledger.select(QuestionId::new(2), OptionKey::from("A"));

        let payload = reconcile(&questions, &ledger.snapshot(), &TimeSpentLedger::new());

        assert_eq!(payload.len(), 5);
        let nulls = payload
            .iter()
            .filter(|a| a.selected_option_key.is_none())
            .count();
        assert_eq!(nulls, 3);
    }

    #[test]
    fn stray_ledger_entries_are_dropped() {
        let questions = questions(&[1]);
        let mut ledger = AnswerLedger::new();
        ledger.select(QuestionId::new(99), OptionKey::from("A"));
        let payload = reconcile(&questions, &ledger.snapshot(), &TimeSpentLedger::new());
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].question_id, QuestionId::new(1));
    }
}
