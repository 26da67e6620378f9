//! 交给展示层的带标注行

use serde::{Deserialize, Serialize};

use super::outcome::{AnswerOutcome, FailureKind};
use super::question::Question;

/// LLM 对"答案是否回答了题目"的判断
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub is_answered: bool,
    pub explanation: String,
}

/// 一行标注结果
///
/// 失败的行只带失败类型，永远不会带占位答案。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    pub index: usize,
    pub question: String,
    pub answer: Option<String>,
    pub failure: Option<FailureKind>,
    pub attempts: Option<u32>,
    pub is_answered: Option<bool>,
    pub explanation: Option<String>,
}

impl AnnotatedRow {
    /// 由题目和它的结果构建（结果缺失表示未尝试）
    pub fn from_outcome(question: &Question, outcome: Option<&AnswerOutcome>) -> Self {
        Self {
            index: question.index,
            question: question.text.clone(),
            answer: outcome.and_then(|o| o.answer()).map(str::to_string),
            failure: outcome.and_then(|o| o.failure_kind()),
            attempts: outcome.map(|o| o.attempts()),
            is_answered: None,
            explanation: None,
        }
    }

    /// 附加判断结果
    pub fn with_judgement(mut self, judgement: Judgement) -> Self {
        self.is_answered = Some(judgement.is_answered);
        self.explanation = Some(judgement.explanation);
        self
    }

    /// 未尝试（取消导致）
    pub fn is_not_attempted(&self) -> bool {
        self.attempts.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_row_has_no_answer() {
        let question = Question::new(3, "Capital of France?");
        let outcome = AnswerOutcome::Failure {
            reason: FailureKind::RetriesExhausted,
            attempts: 3,
        };
        let row = AnnotatedRow::from_outcome(&question, Some(&outcome));
        assert_eq!(row.answer, None);
        assert_eq!(row.failure, Some(FailureKind::RetriesExhausted));
        assert_eq!(row.attempts, Some(3));
    }

    #[test]
    fn test_missing_outcome_is_not_attempted() {
        let question = Question::new(0, "What is 2+2?");
        let row = AnnotatedRow::from_outcome(&question, None);
        assert!(row.is_not_attempted());
        assert_eq!(row.failure, None);
    }

    #[test]
    fn test_with_judgement() {
        let question = Question::new(0, "What is 2+2?");
        let outcome = AnswerOutcome::Success {
            answer: "4".to_string(),
            attempts: 1,
        };
        let row = AnnotatedRow::from_outcome(&question, Some(&outcome)).with_judgement(
            Judgement {
                is_answered: true,
                explanation: "直接给出了结果".to_string(),
            },
        );
        assert_eq!(row.answer.as_deref(), Some("4"));
        assert_eq!(row.is_answered, Some(true));
    }
}
