//! 配置管理
//!
//! 从环境变量（及 `.env` 文件）加载运行配置

use std::time::Duration;

use tracing::info;

use crate::errors::{ILearnError, Result};

/// 聊天服务默认地址
pub const DEFAULT_CHATBOT_BASE_URL: &str = "http://localhost:8000";

/// Web 服务默认监听地址
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// 健康检查默认超时（秒）
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// 应用配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Supabase 项目地址
    pub supabase_url: String,
    /// Supabase API Key，同时作为 Bearer 凭证
    pub supabase_key: String,
    /// 聊天服务地址
    pub chatbot_base_url: String,
    /// Web 服务监听地址
    pub bind_addr: String,
    /// 聊天服务健康检查超时
    pub health_timeout: Duration,
}

impl AppConfig {
    /// 从进程环境加载配置
    ///
    /// `.env` 文件由调用方在此之前加载。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值查找函数加载配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .find(|v| !v.trim().is_empty())
        };

        let supabase_url = first(&["Supabase__Url", "SUPABASE_URL"])
            .ok_or_else(|| ILearnError::Config("Supabase__Url not found".to_string()))?;
        let supabase_key = first(&["Supabase__Key", "SUPABASE_KEY"])
            .ok_or_else(|| ILearnError::Config("Supabase__Key not found".to_string()))?;
        let chatbot_base_url = first(&["ChatbotApi__BaseUrl", "CHATBOT_API_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_CHATBOT_BASE_URL.to_string());
        let bind_addr = first(&["BIND_ADDR"]).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let health_timeout_secs = match first(&["CHAT_HEALTH_TIMEOUT_SECS"]) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ILearnError::Config(format!("invalid CHAT_HEALTH_TIMEOUT_SECS: {}", raw))
            })?,
            None => DEFAULT_HEALTH_TIMEOUT_SECS,
        };

        let config = Self {
            supabase_url: normalize_base_url(&supabase_url)?,
            supabase_key: supabase_key.trim().to_string(),
            chatbot_base_url: normalize_base_url(&chatbot_base_url)?,
            bind_addr,
            health_timeout: Duration::from_secs(health_timeout_secs),
        };
        config.validate()?;

        info!("Supabase URL loaded: {}...", config.masked_supabase_url());
        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.supabase_key.trim().is_empty() {
            return Err(ILearnError::Config("Supabase__Key is required".to_string()));
        }
        normalize_base_url(&self.supabase_url)?;
        normalize_base_url(&self.chatbot_base_url)?;
        Ok(())
    }

    /// 日志中展示的截断地址
    pub fn masked_supabase_url(&self) -> String {
        self.supabase_url.chars().take(30).collect()
    }
}

/// 校验 URL 并去掉末尾的 `/`
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ILearnError::Config(format!(
            "unsupported URL scheme '{}' in {}",
            other, trimmed
        ))),
    }
}
