pub mod error_log_writer;
pub mod error_sink;
pub mod llm_judge;
pub mod progress_tracker;
pub mod retry_policy;

pub use error_log_writer::ErrorLogWriter;
pub use error_sink::ErrorSink;
pub use llm_judge::{AnswerJudge, LlmJudge};
pub use progress_tracker::ProgressTracker;
pub use retry_policy::RetryPolicy;
