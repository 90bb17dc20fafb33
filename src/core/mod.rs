//! 核心层：配置和存储抽象
//!
//! 包含运行配置和学生档案存储接口等核心概念

pub mod config;
pub mod store;
