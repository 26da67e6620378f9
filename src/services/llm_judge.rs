//! LLM 判断服务 - 业务能力层
//!
//! 只负责"判断答案是否回答了题目"能力，不关心批量和流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::models::Judgement;

/// 答案判断能力
///
/// 执行器不依赖它，只有 `App` 在批量完成后用它标注成功的行。
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    /// 判断 `answer` 是否回答了 `question`
    async fn judge(&self, question: &str, answer: &str) -> Result<Judgement>;
}

/// LLM 判断服务
///
/// 职责：
/// - 调用 LLM API 判断答案是否回答了题目
/// - 只处理单个题目
/// - 不出现 BatchResult
/// - 不关心重试和并发
pub struct LlmJudge {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmJudge {
    /// 创建新的 LLM 判断服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(512u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl AnswerJudge for LlmJudge {
    async fn judge(&self, question: &str, answer: &str) -> Result<Judgement> {
        let (user_message, system_message) = build_judge_messages(question, answer);
        let response = self
            .send_to_llm(&user_message, Some(&system_message))
            .await?;
        parse_judgement(&response)
    }
}

/// 构建判断用的消息
///
/// 返回 (user_message, system_message)
fn build_judge_messages(question: &str, answer: &str) -> (String, String) {
    let system_message = "你是一个严格的答案评审助手。你需要判断给出的答案是否真正回答了题目，\
                          而不是回避、拒答或答非所问。只输出 JSON。"
        .to_string();

    let user_message = format!(
        r#"请判断下面的答案是否回答了题目。

题目：
{}

答案：
{}

只返回如下格式的 JSON，不要返回任何其他内容：
{{"is_answered": true 或 false, "explanation": "一句话说明理由"}}"#,
        question, answer
    );

    (user_message, system_message)
}

#[derive(Debug, Deserialize)]
struct RawJudgement {
    is_answered: JsonValue,
    #[serde(default)]
    explanation: String,
}

/// 解析 LLM 返回的判断结果
///
/// 优先解析响应中的 JSON 对象；没有 JSON 时接受以 yes/no、是/否 开头的文本。
pub fn parse_judgement(response: &str) -> Result<Judgement> {
    let response = response.trim();

    let re = Regex::new(r"(?s)\{.*\}")?;
    if let Some(m) = re.find(response) {
        if let Ok(raw) = serde_json::from_str::<RawJudgement>(m.as_str()) {
            if let Some(is_answered) = parse_flag(&raw.is_answered) {
                return Ok(Judgement {
                    is_answered,
                    explanation: raw.explanation.trim().to_string(),
                });
            }
        }
    }

    let first_word: String = response
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    let verdict = if first_word == "yes" || response.starts_with('是') {
        Some(true)
    } else if first_word == "no" || response.starts_with('否') {
        Some(false)
    } else {
        None
    };

    match verdict {
        Some(is_answered) => {
            let explanation = response
                .trim_start_matches(|c: char| c.is_alphabetic() && !c.is_whitespace())
                .trim_start_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace() || "，。：".contains(c))
                .to_string();
            debug!("从文本响应中提取到判断: {}", is_answered);
            Ok(Judgement {
                is_answered,
                explanation,
            })
        }
        None => {
            warn!("无法解析 LLM 判断: '{}'", response);
            Err(LlmError::JudgementParseFailed {
                response: response.to_string(),
            }
            .into())
        }
    }
}

fn parse_flag(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(flag) => Some(*flag),
        JsonValue::String(text) => match text.trim().to_lowercase().as_str() {
            "yes" | "true" | "是" => Some(true),
            "no" | "false" | "否" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let judgement =
            parse_judgement(r#"{"is_answered": true, "explanation": "给出了具体数值"}"#).unwrap();
        assert!(judgement.is_answered);
        assert_eq!(judgement.explanation, "给出了具体数值");
    }

    #[test]
    fn test_parse_json_wrapped_in_code_fence() {
        let response = "```json\n{\"is_answered\": \"No\", \"explanation\": \"答非所问\"}\n```";
        let judgement = parse_judgement(response).unwrap();
        assert!(!judgement.is_answered);
        assert_eq!(judgement.explanation, "答非所问");
    }

    #[test]
    fn test_parse_yes_no_text() {
        let yes = parse_judgement("Yes. The answer states the capital.").unwrap();
        assert!(yes.is_answered);
        assert_eq!(yes.explanation, "The answer states the capital.");

        let no = parse_judgement("否，答案没有回答题目").unwrap();
        assert!(!no.is_answered);
    }

    #[test]
    fn test_parse_failure() {
        let err = parse_judgement("无法判断").unwrap_err();
        assert!(err.downcast_ref::<LlmError>().is_some());
        assert!(parse_judgement("not sure").is_err());
    }

    #[test]
    fn test_judge_messages_contain_question_and_answer() {
        let (user, system) = build_judge_messages("Capital of France?", "Paris");
        assert!(user.contains("Capital of France?"));
        assert!(user.contains("Paris"));
        assert!(system.contains("JSON"));
    }

    /// 测试 LLM API 连接性
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_llm_judge_connectivity -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_llm_judge_connectivity() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::load().unwrap();
        let judge = LlmJudge::new(&config);

        let judgement = judge.judge("What is 2+2?", "4").await.unwrap();
        println!("判断结果: {:?}", judgement);
        assert!(judgement.is_answered);
    }
}
