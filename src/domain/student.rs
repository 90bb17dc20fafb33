//! 学生档案领域实体

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ILearnError, Result};

/// 单科成绩
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMarks {
    pub marks: i32,
    pub total: i32,
}

impl SubjectMarks {
    pub fn new(marks: i32, total: i32) -> Self {
        Self { marks, total }
    }

    /// 得分百分比，总分为 0 时返回 None
    pub fn percentage(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(f64::from(self.marks) * 100.0 / f64::from(self.total))
    }
}

/// 科目名称到成绩的映射
pub type SubjectMap = BTreeMap<String, SubjectMarks>;

/// 学生档案
///
/// `student_id` 是所有查询和修改使用的外部主键；`id` 与时间戳由后端分配，
/// 客户端从不写入。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_id: String,
    pub name: String,
    pub semester: i32,
    /// `None` 表示“没有数据”，与空映射不同
    pub subjects: Option<SubjectMap>,
    pub attendance: f64,
    pub assignments_submitted: i32,
    pub total_assignments: i32,
    pub performance_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StudentRecord {
    /// 创建只包含标识和姓名的档案
    pub fn new(student_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// 设置学期
    pub fn with_semester(mut self, semester: i32) -> Self {
        self.semester = semester;
        self
    }

    /// 添加一门科目成绩
    pub fn with_subject(mut self, subject: impl Into<String>, marks: SubjectMarks) -> Self {
        self.subjects
            .get_or_insert_with(SubjectMap::new)
            .insert(subject.into(), marks);
        self
    }

    /// 设置出勤率（百分比）
    pub fn with_attendance(mut self, attendance: f64) -> Self {
        self.attendance = attendance;
        self
    }

    /// 设置作业提交情况
    pub fn with_assignments(mut self, submitted: i32, total: i32) -> Self {
        self.assignments_submitted = submitted;
        self.total_assignments = total;
        self
    }

    /// 设置表现备注
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.performance_notes = notes.into();
        self
    }

    /// 作业完成率（百分比），总作业数为 0 时返回 None
    pub fn assignment_completion(&self) -> Option<f64> {
        if self.total_assignments == 0 {
            return None;
        }
        Some(f64::from(self.assignments_submitted) * 100.0 / f64::from(self.total_assignments))
    }

    /// 创建前的前置校验：`student_id` 与 `name` 不能为空
    pub fn validate(&self) -> Result<()> {
        if self.student_id.trim().is_empty() {
            return Err(ILearnError::validation("student_id is required"));
        }
        if self.name.trim().is_empty() {
            return Err(ILearnError::validation("name is required"));
        }
        Ok(())
    }
}
