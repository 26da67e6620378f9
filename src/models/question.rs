use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::InvalidInput;

/// 待回答的题目
///
/// `index` 是题目在原始表格中的行号。并发完成的顺序不确定，
/// 最终结果依靠它重新排回输入顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 原始行号（从 0 开始）
    pub index: usize,
    /// 题目文本
    pub text: String,
}

impl Question {
    /// 创建新的题目
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// 按顺序为一组题目文本分配行号 `0..n`
    pub fn from_texts<I, S>(texts: I) -> Vec<Question>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Question::new(index, text))
            .collect()
    }
}

/// 校验题目集合
///
/// 要求：非空、行号唯一、行号位于 `[0, total)`。
pub fn validate_question_set(questions: &[Question]) -> Result<(), InvalidInput> {
    if questions.is_empty() {
        return Err(InvalidInput::EmptyQuestionSet);
    }

    let total = questions.len();
    let mut seen = HashSet::with_capacity(total);
    for question in questions {
        if question.index >= total {
            return Err(InvalidInput::IndexOutOfRange {
                index: question.index,
                total,
            });
        }
        if !seen.insert(question.index) {
            return Err(InvalidInput::DuplicateIndex {
                index: question.index,
            });
        }
    }

    Ok(())
}
