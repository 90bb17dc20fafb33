//! 线上 JSON 与领域模型之间的转换
//!
//! 后端行按字段逐个解析，而不是整体反序列化：`subjects` 是结构灵活的
//! JSONB 列，每个条目都要单独拆解并校验 `{marks, total}`。

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Map, Value};

use crate::domain::{StudentRecord, SubjectMap, SubjectMarks};
use crate::errors::{ILearnError, Result};

/// 解析后端返回的行数组
pub fn decode_rows(body: &Value) -> Result<Vec<StudentRecord>> {
    let rows = body
        .as_array()
        .ok_or_else(|| ILearnError::decode(format!("expected JSON array, got {}", kind(body))))?;

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            decode_record(row).map_err(|e| match e {
                ILearnError::Decode(msg) => ILearnError::decode(format!("row {}: {}", index, msg)),
                other => other,
            })
        })
        .collect()
}

/// 解析单行档案
pub fn decode_record(value: &Value) -> Result<StudentRecord> {
    let obj = value
        .as_object()
        .ok_or_else(|| ILearnError::decode(format!("expected JSON object, got {}", kind(value))))?;

    Ok(StudentRecord {
        id: optional_i64(obj, "id")?,
        student_id: string_field(obj, "student_id")?,
        name: string_field(obj, "name")?,
        semester: i32_field(obj, "semester")?.unwrap_or_default(),
        subjects: decode_subjects(obj.get("subjects"))?,
        attendance: f64_field(obj, "attendance")?,
        assignments_submitted: i32_field(obj, "assignments_submitted")?.unwrap_or_default(),
        total_assignments: i32_field(obj, "total_assignments")?.unwrap_or_default(),
        performance_notes: string_field(obj, "performance_notes")?,
        created_at: timestamp_field(obj, "created_at")?,
        updated_at: timestamp_field(obj, "updated_at")?,
    })
}

/// 逐个解析科目成绩
///
/// 缺失或 `null` 表示没有数据；任何一个条目缺少 `marks` 或 `total`
/// 都会导致整个解析失败。
pub fn decode_subjects(value: Option<&Value>) -> Result<Option<SubjectMap>> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(ILearnError::decode(format!(
                "subjects: expected object, got {}",
                kind(other)
            )))
        }
    };

    let mut subjects = SubjectMap::new();
    for (name, entry) in entries {
        subjects.insert(name.clone(), decode_subject_entry(name, entry)?);
    }
    Ok(Some(subjects))
}

fn decode_subject_entry(name: &str, value: &Value) -> Result<SubjectMarks> {
    let obj = value.as_object().ok_or_else(|| {
        ILearnError::decode(format!(
            "subjects.{}: expected object, got {}",
            name,
            kind(value)
        ))
    })?;

    let required = |field: &str| -> Result<i32> {
        let raw = obj
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ILearnError::decode(format!("subjects.{}: missing '{}'", name, field)))?;
        as_i32(raw).ok_or_else(|| {
            ILearnError::decode(format!(
                "subjects.{}.{}: expected integer, got {}",
                name, field, raw
            ))
        })
    };

    Ok(SubjectMarks {
        marks: required("marks")?,
        total: required("total")?,
    })
}

/// 新建时的请求体（不含 `id` 和时间戳）
pub fn encode_insert(record: &StudentRecord) -> Value {
    let mut body = encode_mutable_fields(record);
    body.insert("student_id".to_string(), json!(record.student_id));
    Value::Object(body)
}

/// 更新时的请求体（不含 `student_id`、`id` 和时间戳）
pub fn encode_update(record: &StudentRecord) -> Value {
    Value::Object(encode_mutable_fields(record))
}

/// 科目映射转为 JSONB 对象，None 写为空对象
pub fn encode_subjects(subjects: Option<&SubjectMap>) -> Value {
    let entries: Map<String, Value> = subjects
        .into_iter()
        .flatten()
        .map(|(name, marks)| {
            (
                name.clone(),
                json!({ "marks": marks.marks, "total": marks.total }),
            )
        })
        .collect();
    Value::Object(entries)
}

fn encode_mutable_fields(record: &StudentRecord) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("name".to_string(), json!(record.name));
    body.insert("semester".to_string(), json!(record.semester));
    body.insert(
        "subjects".to_string(),
        encode_subjects(record.subjects.as_ref()),
    );
    body.insert("attendance".to_string(), json!(record.attendance));
    body.insert(
        "assignments_submitted".to_string(),
        json!(record.assignments_submitted),
    );
    body.insert(
        "total_assignments".to_string(),
        json!(record.total_assignments),
    );
    body.insert(
        "performance_notes".to_string(),
        json!(record.performance_notes),
    );
    body
}

// ==================== 字段提取 ====================

fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn string_field(obj: &Map<String, Value>, field: &str) -> Result<String> {
    match present(obj, field) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(type_error(field, "string", other)),
    }
}

fn i32_field(obj: &Map<String, Value>, field: &str) -> Result<Option<i32>> {
    match present(obj, field) {
        None => Ok(None),
        Some(v) => as_i32(v)
            .map(Some)
            .ok_or_else(|| type_error(field, "integer", v)),
    }
}

fn optional_i64(obj: &Map<String, Value>, field: &str) -> Result<Option<i64>> {
    match present(obj, field) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| type_error(field, "integer", v)),
    }
}

fn f64_field(obj: &Map<String, Value>, field: &str) -> Result<f64> {
    match present(obj, field) {
        None => Ok(0.0),
        Some(v) => v.as_f64().ok_or_else(|| type_error(field, "number", v)),
    }
}

fn timestamp_field(obj: &Map<String, Value>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match present(obj, field) {
        None => Ok(None),
        Some(Value::String(raw)) => parse_timestamp(raw)
            .map(Some)
            .ok_or_else(|| ILearnError::decode(format!("{}: invalid timestamp '{}'", field, raw))),
        Some(other) => Err(type_error(field, "timestamp string", other)),
    }
}

/// 解析 PostgREST 时间戳
///
/// 支持带时区的 RFC 3339，以及不带时区的 `timestamp` 列（按 UTC 处理）
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// 整数字段也接受小数部分为 0 的数字（JSONB 中可能写成 80.0）
fn as_i32(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

fn type_error(field: &str, expected: &str, got: &Value) -> ILearnError {
    ILearnError::decode(format!("{}: expected {}, got {}", field, expected, kind(got)))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
