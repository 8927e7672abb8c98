mod countdown;
mod exam;
mod ids;
mod ledger;
mod session;
mod time_spent;

pub use countdown::{
    CountdownTimer, DEFAULT_LOW_TIME_PERCENT, TimerEvent, TimerStatus, TimerStrategy,
};
pub use exam::{
    AnswerOption, ExamDefinition, ExamDefinitionError, ExamMode, ExamPaper, QuestionEntry,
};
pub use ids::{ExamId, OptionId, OptionKey, ParseIdError, QuestionId, SessionId};
pub use ledger::{AnswerEntry, AnswerLedger, LedgerSnapshot};
pub use session::SessionState;
pub use time_spent::{TimeAccountant, TimeSpentLedger};
