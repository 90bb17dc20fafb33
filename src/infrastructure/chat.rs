//! 聊天网关客户端
//!
//! 把聊天请求转发给外部推理服务，并提供健康检查

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::core::config::{normalize_base_url, AppConfig, DEFAULT_HEALTH_TIMEOUT_SECS};
use crate::domain::{ChatExchange, ChatReply};
use crate::errors::{ILearnError, Result};

/// 聊天网关
#[derive(Clone)]
pub struct ChatGateway {
    http: Client,
    base_url: String,
    health_timeout: Duration,
}

impl ChatGateway {
    /// 创建新的网关客户端
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url)?,
            health_timeout: Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECS),
        })
    }

    /// 从应用配置创建
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(&config.chatbot_base_url)?.with_health_timeout(config.health_timeout))
    }

    /// 设置健康检查超时
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 发送一轮对话
    ///
    /// 对话历史原样转发，不做重排或去重
    pub async fn send_message(&self, exchange: &ChatExchange) -> Result<ChatReply> {
        let url = format!("{}/chat", self.base_url);
        debug!(
            "POST {} (student {}, {} history messages)",
            url,
            exchange.student_id,
            exchange.conversation_history.len()
        );

        let response = self.http.post(&url).json(exchange).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ILearnError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str::<ChatReply>(&text)
            .map_err(|e| ILearnError::decode(format!("failed to deserialize chat reply: {}", e)))
    }

    /// 健康检查
    ///
    /// 从不返回错误：网络失败、超时和非成功状态都视为不健康
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        match self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(resp) => {
                let healthy = resp.status().is_success();
                if !healthy {
                    warn!("Chat API health check returned {}", resp.status());
                }
                healthy
            }
            Err(e) => {
                warn!("Chat API health check failed for {}: {}", self.base_url, e);
                false
            }
        }
    }
}
