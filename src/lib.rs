//! 学生学业档案与聊天网关
//!
//! 提供数据访问与集成能力：
//! - 学生档案的增删改查（Supabase / PostgREST 风格 REST 后端）
//! - 线上 JSON 与领域模型之间的逐字段转换（含结构灵活的科目成绩映射）
//! - 聊天消息转发和聊天服务健康检查
//! - 组合上述能力的 JSON HTTP API
//!
//! # 架构分层
//!
//! - `domain`: 领域模型
//! - `core`: 核心层，包含配置和存储抽象
//! - `infrastructure`: 基础设施层，外部系统交互

// 领域层
pub mod domain;

// 核心层
pub mod core;

// 基础设施层
pub mod infrastructure;

// 错误类型
pub mod errors;

// 重新导出常用类型
pub use crate::core::config::AppConfig;
pub use crate::core::store::{MemoryStudentStore, StudentStore};
pub use domain::{ChatExchange, ChatMessage, ChatReply, StudentRecord, SubjectMap, SubjectMarks};
pub use errors::{ILearnError, Result};
pub use infrastructure::chat::ChatGateway;
pub use infrastructure::logger;
pub use infrastructure::records::SupabaseRecordStore;
pub use infrastructure::web::{create_router, start_web_server, AppState};

/// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
