mod exam_vm;
mod markdown_vm;
mod navigator_vm;
mod result_vm;
mod time_fmt;
mod timer_vm;

pub use exam_vm::{AnswerIntent, ExamIntent, ExamPhase, ExamVm, OptionVm, QuestionCardVm};
pub use markdown_vm::{inline_markdown_to_html, markdown_to_html, sanitize_html};
pub use navigator_vm::{NavigatorItemVm, NavigatorVm, QuestionStatus, question_status};
pub use result_vm::ResultVm;
pub use time_fmt::{format_countdown, format_time_spent};
pub use timer_vm::TimerVm;
