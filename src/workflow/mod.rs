pub mod question_flow;

pub use question_flow::QuestionFlow;
