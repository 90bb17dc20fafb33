//! 基础设施层：外部系统交互
//!
//! 提供与外部系统（Supabase 档案后端、聊天服务、日志、Web）的交互能力

pub mod chat;
pub mod logger;
pub mod records;
pub mod web;
