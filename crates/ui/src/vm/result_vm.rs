use backend::ExamResult;

/// Completed-attempt summary.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultVm {
    pub passed: bool,
    pub verdict: &'static str,
    pub score_label: String,
    pub correct_label: String,
    pub threshold_label: String,
}

impl ResultVm {
    #[must_use]
    pub fn new(result: &ExamResult, passing_threshold: u32) -> Self {
        Self {
            passed: result.passed,
            verdict: if result.passed { "Passed" } else { "Not passed" },
            score_label: format!("{:.0}%", result.percentage()),
            correct_label: format!("{} of {} correct", result.correct_count, result.total),
            threshold_label: format!("Passing score: {passing_threshold}%"),
        }
    }

    #[must_use]
    pub fn css_class(&self) -> &'static str {
        if self.passed {
            "exam-result exam-result--passed"
        } else {
            "exam-result exam-result--failed"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_reflect_the_backend_verdict() {
        let result = ExamResult {
            score: 66.7,
            correct_count: 2,
            total: 3,
            passed: true,
        };
        let vm = ResultVm::new(&result, 60);
        assert_eq!(vm.verdict, "Passed");
        assert_eq!(vm.score_label, "67%");
        assert_eq!(vm.correct_label, "2 of 3 correct");
        assert_eq!(vm.threshold_label, "Passing score: 60%");
        assert_eq!(vm.css_class(), "exam-result exam-result--passed");
    }
}
