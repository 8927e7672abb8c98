/// Aggregated view of answer progress, useful for UI headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamProgress {
    pub total: usize,
    pub answered: usize,
    pub flagged: usize,
    pub unanswered: usize,
    pub current_index: usize,
}
