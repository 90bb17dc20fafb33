//! 测试通用工具
//!
//! 提供测试日志初始化、唯一 ID 生成，以及基于 axum 的
//! Supabase / 聊天服务模拟后端

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

static INIT: Once = Once::new();

/// 测试使用的 API Key
pub const TEST_KEY: &str = "test-anon-key";

/// 初始化测试环境
pub fn setup() {
    INIT.call_once(|| {
        ilearn::logger::try_init("debug");
    });
}

/// 生成唯一的测试学号
pub fn generate_test_id() -> String {
    format!("test-{}", uuid::Uuid::new_v4())
}

/// 在随机端口上启动服务，返回基础地址
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// 一个已经关闭的本地地址（连接会被拒绝）
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ==================== Supabase 模拟后端 ====================

/// 模拟的 PostgREST `students` 表
#[derive(Default)]
pub struct MockSupabase {
    pub rows: Mutex<Vec<Value>>,
    /// 所有请求次数
    pub requests: AtomicUsize,
    /// 就绪探测（`limit=1`）次数
    pub probe_hits: AtomicUsize,
    /// 设置后所有请求返回该状态码
    pub fail_status: Mutex<Option<u16>>,
    /// 设置后非探测的 GET 返回该响应体
    pub override_get: Mutex<Option<Value>>,
    pub last_body: Mutex<Option<Value>>,
    pub last_prefer: Mutex<Option<String>>,
    next_id: AtomicI64,
}

impl MockSupabase {
    pub fn seed(&self, row: Value) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn fail_with(&self, status: Option<u16>) {
        *self.fail_status.lock().unwrap() = status;
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.probe_hits.load(Ordering::SeqCst)
    }

    fn reject(&self, headers: &HeaderMap) -> Option<Response> {
        let api_key = headers.get("apikey").and_then(|v| v.to_str().ok());
        let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
        let expected_bearer = format!("Bearer {}", TEST_KEY);
        if api_key != Some(TEST_KEY) || bearer != Some(expected_bearer.as_str()) {
            return Some((StatusCode::UNAUTHORIZED, "missing credentials").into_response());
        }

        if let Some(status) = *self.fail_status.lock().unwrap() {
            let status = StatusCode::from_u16(status).unwrap();
            return Some((status, "backend failure").into_response());
        }

        None
    }

    fn record_write(&self, headers: &HeaderMap, body: Option<&Value>) {
        *self.last_prefer.lock().unwrap() = headers
            .get("prefer")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.last_body.lock().unwrap() = body.cloned();
    }
}

fn filter_id(params: &HashMap<String, String>) -> Option<String> {
    params
        .get("student_id")
        .and_then(|f| f.strip_prefix("eq."))
        .map(str::to_string)
}

async fn mock_select(
    State(mock): State<Arc<MockSupabase>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);

    let is_probe = params.get("limit").map(String::as_str) == Some("1");
    if is_probe {
        mock.probe_hits.fetch_add(1, Ordering::SeqCst);
        // 让并发的首次调用有机会重叠
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    if let Some(resp) = mock.reject(&headers) {
        return resp;
    }

    if !is_probe {
        if let Some(body) = mock.override_get.lock().unwrap().clone() {
            return Json(body).into_response();
        }
    }

    let rows = mock.rows.lock().unwrap().clone();
    let rows: Vec<Value> = match filter_id(&params) {
        Some(id) => rows
            .into_iter()
            .filter(|r| r["student_id"] == id.as_str())
            .collect(),
        None => rows,
    };

    let rows = if is_probe {
        rows.into_iter().take(1).collect()
    } else {
        rows
    };

    Json(rows).into_response()
}

async fn mock_insert(
    State(mock): State<Arc<MockSupabase>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    if let Some(resp) = mock.reject(&headers) {
        return resp;
    }
    mock.record_write(&headers, Some(&body));

    let mut rows = mock.rows.lock().unwrap();
    if rows.iter().any(|r| r["student_id"] == body["student_id"]) {
        return (StatusCode::CONFLICT, "duplicate key value").into_response();
    }

    let mut row = body.clone();
    if let Some(obj) = row.as_object_mut() {
        obj.insert(
            "id".to_string(),
            json!(mock.next_id.fetch_add(1, Ordering::SeqCst) + 1),
        );
        obj.insert("created_at".to_string(), json!("2024-01-01T00:00:00+00:00"));
        obj.insert("updated_at".to_string(), json!("2024-01-01T00:00:00+00:00"));
    }
    rows.push(row);

    StatusCode::CREATED.into_response()
}

async fn mock_update(
    State(mock): State<Arc<MockSupabase>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    if let Some(resp) = mock.reject(&headers) {
        return resp;
    }
    mock.record_write(&headers, Some(&body));

    let Some(id) = filter_id(&params) else {
        return (StatusCode::BAD_REQUEST, "filter required").into_response();
    };

    let mut rows = mock.rows.lock().unwrap();
    for row in rows.iter_mut().filter(|r| r["student_id"] == id.as_str()) {
        if let (Some(target), Some(changes)) = (row.as_object_mut(), body.as_object()) {
            for (k, v) in changes {
                target.insert(k.clone(), v.clone());
            }
            target.insert("updated_at".to_string(), json!("2024-02-01T00:00:00+00:00"));
        }
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn mock_delete(
    State(mock): State<Arc<MockSupabase>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    if let Some(resp) = mock.reject(&headers) {
        return resp;
    }
    mock.record_write(&headers, None);

    let Some(id) = filter_id(&params) else {
        return (StatusCode::BAD_REQUEST, "filter required").into_response();
    };

    mock.rows
        .lock()
        .unwrap()
        .retain(|r| r["student_id"] != id.as_str());

    StatusCode::NO_CONTENT.into_response()
}

/// 启动模拟 Supabase，返回基础地址
pub async fn spawn_mock_supabase() -> (String, Arc<MockSupabase>) {
    let mock = Arc::new(MockSupabase::default());

    let app = Router::new()
        .route(
            "/rest/v1/students",
            get(mock_select)
                .post(mock_insert)
                .patch(mock_update)
                .delete(mock_delete),
        )
        .with_state(mock.clone());

    (spawn_server(app).await, mock)
}

// ==================== 聊天服务模拟 ====================

/// 模拟的聊天推理服务
pub struct MockChat {
    pub reply: Mutex<Value>,
    pub chat_status: Mutex<u16>,
    pub health_status: Mutex<u16>,
    pub health_delay: Mutex<Duration>,
    pub last_request: Mutex<Option<Value>>,
}

impl Default for MockChat {
    fn default() -> Self {
        Self {
            reply: Mutex::new(json!({
                "student_id": "S001",
                "message": "How am I doing?",
                "response": "Great!",
                "conversation_history": [
                    { "role": "user", "content": "How am I doing?" },
                    { "role": "assistant", "content": "Great!" }
                ],
                "suggestions": ["Review Math"]
            })),
            chat_status: Mutex::new(200),
            health_status: Mutex::new(200),
            health_delay: Mutex::new(Duration::ZERO),
            last_request: Mutex::new(None),
        }
    }
}

async fn mock_chat(State(mock): State<Arc<MockChat>>, Json(body): Json<Value>) -> Response {
    *mock.last_request.lock().unwrap() = Some(body);

    let status = StatusCode::from_u16(*mock.chat_status.lock().unwrap()).unwrap();
    if !status.is_success() {
        return (status, "inference failed").into_response();
    }

    let reply = mock.reply.lock().unwrap().clone();
    match reply {
        Value::String(raw) => (status, raw).into_response(),
        other => (status, Json(other)).into_response(),
    }
}

async fn mock_health(State(mock): State<Arc<MockChat>>) -> Response {
    let delay = *mock.health_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(*mock.health_status.lock().unwrap()).unwrap();
    (status, Json(json!({ "status": "ok" }))).into_response()
}

/// 启动模拟聊天服务，返回基础地址
pub async fn spawn_mock_chat() -> (String, Arc<MockChat>) {
    let mock = Arc::new(MockChat::default());

    let app = Router::new()
        .route("/chat", post(mock_chat))
        .route("/health", get(mock_health))
        .with_state(mock.clone());

    (spawn_server(app).await, mock)
}
