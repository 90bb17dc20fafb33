//! 内存存储实现
//!
//! 数据仅在内存中，重启后丢失。行为与远程后端保持一致，适合测试和本地开发

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::StudentRecord;
use crate::errors::{ILearnError, Result};

use super::StudentStore;

/// 内存存储
pub struct MemoryStudentStore {
    records: RwLock<BTreeMap<String, StudentRecord>>,
    next_id: AtomicI64,
}

impl MemoryStudentStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// 当前记录数
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoryStudentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn get_by_id(&self, student_id: &str) -> Result<Option<StudentRecord>> {
        let records = self.records.read().await;
        Ok(records.get(student_id).cloned())
    }

    async fn create(&self, record: &StudentRecord) -> Result<StudentRecord> {
        record.validate()?;

        let mut records = self.records.write().await;
        if records.contains_key(&record.student_id) {
            // 与后端唯一约束冲突时的状态码一致
            return Err(ILearnError::Upstream {
                status: 409,
                body: format!("duplicate student_id: {}", record.student_id),
            });
        }

        let now = Utc::now();
        let mut stored = record.clone();
        stored.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst));
        stored.created_at = Some(now);
        stored.updated_at = Some(now);
        records.insert(stored.student_id.clone(), stored);

        Ok(record.clone())
    }

    async fn update(&self, record: &StudentRecord) -> Result<StudentRecord> {
        if record.student_id.trim().is_empty() {
            return Err(ILearnError::validation("student_id is required"));
        }

        let mut records = self.records.write().await;
        if let Some(stored) = records.get_mut(&record.student_id) {
            stored.name = record.name.clone();
            stored.semester = record.semester;
            stored.subjects = record.subjects.clone();
            stored.attendance = record.attendance;
            stored.assignments_submitted = record.assignments_submitted;
            stored.total_assignments = record.total_assignments;
            stored.performance_notes = record.performance_notes.clone();
            stored.updated_at = Some(Utc::now());
        }

        Ok(record.clone())
    }

    async fn delete(&self, student_id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(student_id);
        Ok(())
    }
}
