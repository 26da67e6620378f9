//! 单题结果与整批结果

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 单次请求超时
    Timeout,
    /// 连接层面的失败
    NetworkError,
    /// 非 2xx 响应，或 2xx 但响应体无法解析
    HttpError,
    /// 所有尝试都失败
    RetriesExhausted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureKind::Timeout => "请求超时",
            FailureKind::NetworkError => "网络错误",
            FailureKind::HttpError => "HTTP错误",
            FailureKind::RetriesExhausted => "重试次数已用尽",
        };
        write!(f, "{}", text)
    }
}

/// 单个题目的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// 成功拿到答案
    Success { answer: String, attempts: u32 },
    /// 最终失败
    Failure { reason: FailureKind, attempts: u32 },
}

impl AnswerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnswerOutcome::Success { .. })
    }

    /// 成功时返回答案
    pub fn answer(&self) -> Option<&str> {
        match self {
            AnswerOutcome::Success { answer, .. } => Some(answer),
            AnswerOutcome::Failure { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            AnswerOutcome::Success { attempts, .. } | AnswerOutcome::Failure { attempts, .. } => {
                *attempts
            }
        }
    }

    /// 失败时返回失败类型
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AnswerOutcome::Success { .. } => None,
            AnswerOutcome::Failure { reason, .. } => Some(*reason),
        }
    }
}

/// 一次批量执行的结果
///
/// `outcomes` 按行号排序。只有被取消时才会缺少行号，
/// 缺少的行号表示"未尝试"，与 `Failure` 不同。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub outcomes: BTreeMap<usize, AnswerOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub total_elapsed_seconds: f64,
    /// 提交的题目总数
    pub total: usize,
    /// 执行期间是否观察到取消
    pub cancelled: bool,
}

impl BatchResult {
    /// 创建空结果
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 写入一个结果，同时更新计数
    ///
    /// 每个行号只写一次，重复写入会被忽略并返回 `false`。
    pub fn insert(&mut self, index: usize, outcome: AnswerOutcome) -> bool {
        if self.outcomes.contains_key(&index) {
            return false;
        }
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.insert(index, outcome);
        true
    }

    pub fn get(&self, index: usize) -> Option<&AnswerOutcome> {
        self.outcomes.get(&index)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 每个提交的题目都有结果
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.total
    }

    /// 未尝试的行号（仅在取消时非空）
    pub fn missing_indices(&self) -> Vec<usize> {
        (0..self.total)
            .filter(|index| !self.outcomes.contains_key(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_updates_counters_once_per_index() {
        let mut result = BatchResult::new(3);
        assert!(result.insert(
            1,
            AnswerOutcome::Success {
                answer: "Paris".to_string(),
                attempts: 1,
            }
        ));
        assert!(result.insert(
            0,
            AnswerOutcome::Failure {
                reason: FailureKind::RetriesExhausted,
                attempts: 3,
            }
        ));
        assert!(!result.insert(
            1,
            AnswerOutcome::Success {
                answer: "Lyon".to_string(),
                attempts: 1,
            }
        ));

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.get(1).and_then(|o| o.answer()), Some("Paris"));
        assert_eq!(result.missing_indices(), vec![2]);
        assert!(!result.is_complete());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = AnswerOutcome::Failure {
            reason: FailureKind::Timeout,
            attempts: 2,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "failure", "reason": "timeout", "attempts": 2})
        );
    }
}
