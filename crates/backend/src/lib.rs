#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod config;
pub mod http;
pub mod memory;

pub use api::{
    AnswerSync, BackendError, ExamBackend, ExamResult, PriorAnswer, StartedExam, SubmittedAnswer,
};
pub use auth::SessionContext;
pub use config::{BackendConfig, ConfigError};
pub use http::HttpBackend;
pub use memory::{InMemoryBackend, ScriptedFailure, sample_exam};
