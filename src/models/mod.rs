pub mod annotation;
pub mod error_log;
pub mod outcome;
pub mod progress;
pub mod question;

pub use annotation::{AnnotatedRow, Judgement};
pub use error_log::ErrorLogEntry;
pub use outcome::{AnswerOutcome, BatchResult, FailureKind};
pub use progress::ProgressSnapshot;
pub use question::{validate_question_set, Question};
