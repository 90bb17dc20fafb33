//! 存储接口定义
//!
//! 学生档案的访问抽象，支持远程 REST 后端和内存实现

use async_trait::async_trait;

use crate::domain::StudentRecord;
use crate::errors::Result;

pub mod memory;

pub use memory::MemoryStudentStore;

/// 学生档案存储接口
///
/// 所有查询与修改都以 `student_id` 为键
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// 读取全部档案，后端无记录时返回空列表
    async fn list_all(&self) -> Result<Vec<StudentRecord>>;

    /// 按 `student_id` 精确查找，不存在时返回 None
    async fn get_by_id(&self, student_id: &str) -> Result<Option<StudentRecord>>;

    /// 新建档案
    ///
    /// 成功时返回提交的档案本身，而不是后端回显的行
    async fn create(&self, record: &StudentRecord) -> Result<StudentRecord>;

    /// 整体替换可变字段，`student_id` 本身不可修改
    async fn update(&self, record: &StudentRecord) -> Result<StudentRecord>;

    /// 删除档案，删除不存在的记录不算错误
    async fn delete(&self, student_id: &str) -> Result<()>;
}
