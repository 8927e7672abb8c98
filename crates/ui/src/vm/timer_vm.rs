use super::time_fmt::format_countdown;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerVm {
    pub remaining_secs: u64,
    pub label: String,
    pub low_time: bool,
}

impl TimerVm {
    #[must_use]
    pub fn new(remaining_secs: u64, low_time: bool) -> Self {
        Self {
            remaining_secs,
            label: format_countdown(remaining_secs),
            low_time,
        }
    }

    #[must_use]
    pub fn css_class(&self) -> &'static str {
        if self.low_time {
            "exam-timer exam-timer--low"
        } else {
            "exam-timer"
        }
    }
}
