//! 标准化错误处理
//!
//! 定义数据访问层专用的错误类型

use thiserror::Error;

/// 项目主要错误类型
#[derive(Error, Debug)]
pub enum ILearnError {
    /// 输入验证错误（不会发起任何网络请求）
    #[error("Validation error: {0}")]
    Validation(String),

    /// 学生档案后端返回非成功状态
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// 聊天服务返回非成功状态
    #[error("Gateway error: HTTP {status}: {body}")]
    Gateway { status: u16, body: String },

    /// 响应体与预期结构不符
    #[error("Decode error: {0}")]
    Decode(String),

    /// 网络请求错误（连接失败、超时等）
    #[error("Network error: {0}")]
    Network(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ILearnError {
    /// 构造解码错误
    pub fn decode(msg: impl Into<String>) -> Self {
        ILearnError::Decode(msg.into())
    }

    /// 构造验证错误
    pub fn validation(msg: impl Into<String>) -> Self {
        ILearnError::Validation(msg.into())
    }

    /// 上游返回的 HTTP 状态码（如有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ILearnError::Upstream { status, .. } | ILearnError::Gateway { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ILearnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ILearnError::Decode(err.to_string())
        } else {
            ILearnError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ILearnError {
    fn from(err: serde_json::Error) -> Self {
        ILearnError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ILearnError {
    fn from(err: url::ParseError) -> Self {
        ILearnError::Config(err.to_string())
    }
}

/// 项目结果类型别名
pub type Result<T> = std::result::Result<T, ILearnError>;
