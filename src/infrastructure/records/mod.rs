//! Supabase 学生档案客户端
//!
//! 通过 PostgREST 风格的 REST 接口读写 `students` 表：
//! - 列表 / 按 `student_id` 查询
//! - 新建 / 更新 / 删除
//!
//! 首次访问后端前执行一次就绪探测，并发的首次调用共享同一次探测。

pub mod codec;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::core::config::{normalize_base_url, AppConfig};
use crate::core::store::StudentStore;
use crate::domain::StudentRecord;
use crate::errors::{ILearnError, Result};

/// 档案表名
const STUDENTS_TABLE: &str = "students";

/// Supabase REST 客户端
pub struct SupabaseRecordStore {
    http: Client,
    rest_url: String,
    ready: OnceCell<()>,
}

impl SupabaseRecordStore {
    /// 创建新的客户端
    ///
    /// `api_key` 同时作为 `apikey` 头和 Bearer 凭证发送
    pub fn new(supabase_url: &str, api_key: &str) -> Result<Self> {
        let base = normalize_base_url(supabase_url)?;
        if api_key.trim().is_empty() {
            return Err(ILearnError::Config("Supabase__Key is required".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", api_key))?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ILearnError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", base),
            ready: OnceCell::new(),
        })
    }

    /// 从应用配置创建
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.supabase_url, &config.supabase_key)
    }

    /// 就绪探测是否已完成
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// 确保就绪探测已执行
    ///
    /// 只会成功执行一次；并发调用者等待同一次探测。探测失败时错误返回给
    /// 当前等待者，下一次调用会重新探测。
    async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                info!("Initializing Supabase connection...");
                let url = format!("{}?select=*&limit=1", self.table_url());
                let body = self.fetch_json(self.http.get(url)).await?;
                let rows = body.as_array().map(Vec::len).unwrap_or_default();
                info!("Supabase connected. Rows found: {}", rows);
                Ok::<(), ILearnError>(())
            })
            .await?;
        Ok(())
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.rest_url, STUDENTS_TABLE)
    }

    /// `student_id=eq.<id>` 过滤后的表地址
    fn filtered_url(&self, student_id: &str) -> String {
        format!(
            "{}?student_id=eq.{}",
            self.table_url(),
            urlencoding::encode(student_id)
        )
    }

    /// 发送请求并检查状态码
    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ILearnError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn fetch_json(&self, req: RequestBuilder) -> Result<Value> {
        let response = self.send(req).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn fetch_rows(&self, url: String) -> Result<Vec<StudentRecord>> {
        debug!("GET {}", url);
        let body = self.fetch_json(self.http.get(url)).await?;
        codec::decode_rows(&body)
    }

    /// 写操作不需要后端回显
    fn mutation(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("Prefer", "return=minimal")
    }
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|e| ILearnError::Config(format!("invalid header value: {}", e)))
}

fn require_student_id(student_id: &str) -> Result<()> {
    if student_id.trim().is_empty() {
        return Err(ILearnError::validation("student_id is required"));
    }
    Ok(())
}

#[async_trait]
impl StudentStore for SupabaseRecordStore {
    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        self.ensure_ready().await?;

        let records = self
            .fetch_rows(format!("{}?select=*", self.table_url()))
            .await?;
        info!("Fetched {} students", records.len());
        Ok(records)
    }

    async fn get_by_id(&self, student_id: &str) -> Result<Option<StudentRecord>> {
        self.ensure_ready().await?;

        let url = format!("{}&select=*", self.filtered_url(student_id));
        let mut records = self.fetch_rows(url).await?;
        if records.len() > 1 {
            return Err(ILearnError::decode(format!(
                "expected at most one row for student_id '{}', got {}",
                student_id,
                records.len()
            )));
        }
        Ok(records.pop())
    }

    async fn create(&self, record: &StudentRecord) -> Result<StudentRecord> {
        record.validate()?;
        self.ensure_ready().await?;

        let body = codec::encode_insert(record);
        debug!("POST {}", self.table_url());
        self.send(
            self.mutation(self.http.post(self.table_url()))
                .header(CONTENT_TYPE, "application/json")
                .json(&body),
        )
        .await?;

        info!("Student created: {}", record.student_id);
        Ok(record.clone())
    }

    async fn update(&self, record: &StudentRecord) -> Result<StudentRecord> {
        require_student_id(&record.student_id)?;
        self.ensure_ready().await?;

        let url = self.filtered_url(&record.student_id);
        let body = codec::encode_update(record);
        debug!("PATCH {}", url);
        self.send(
            self.mutation(self.http.patch(url))
                .header(CONTENT_TYPE, "application/json")
                .json(&body),
        )
        .await?;

        info!("Student updated: {}", record.student_id);
        Ok(record.clone())
    }

    /// 空学号同样下发，过滤条件不匹配任何行
    async fn delete(&self, student_id: &str) -> Result<()> {
        self.ensure_ready().await?;

        let url = self.filtered_url(student_id);
        debug!("DELETE {}", url);
        self.send(self.mutation(self.http.delete(url))).await?;

        info!("Student deleted: {}", student_id);
        Ok(())
    }
}
