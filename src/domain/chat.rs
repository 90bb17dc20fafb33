//! 聊天领域实体
//!
//! 与外部聊天服务交换的请求/响应结构，字段名即线上字段名

use serde::{Deserialize, Serialize};

/// 对话历史中的一条消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// 用户消息
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// 助手消息
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// 发往聊天服务的一轮对话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub student_id: String,
    pub message: String,
    /// 按时间顺序排列，最早的在前
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

impl ChatExchange {
    pub fn new(student_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            message: message.into(),
            conversation_history: Vec::new(),
        }
    }

    /// 附带历史消息
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.conversation_history = history;
        self
    }
}

/// 聊天服务的回复
///
/// 未知字段被忽略；`performance_category` 缺失为 None，列表缺失为空。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_category: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}
