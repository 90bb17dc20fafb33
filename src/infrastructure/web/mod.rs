//! Web 服务器模块
//!
//! 提供学生档案和聊天转发的 JSON HTTP API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::core::store::StudentStore;
use crate::domain::{ChatExchange, StudentRecord};
use crate::errors::ILearnError;
use crate::infrastructure::chat::ChatGateway;

// ==================== 错误响应 ====================

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ErrorDetailsResponse {
    error: String,
    details: String,
}

fn status_for(err: &ILearnError) -> StatusCode {
    match err {
        ILearnError::Validation(_) => StatusCode::BAD_REQUEST,
        ILearnError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ILearnError::Upstream { .. }
        | ILearnError::Gateway { .. }
        | ILearnError::Decode(_)
        | ILearnError::Network(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: &ILearnError) -> Response {
    (
        status_for(err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn not_found(student_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Student not found: {}", student_id),
        }),
    )
        .into_response()
}

// ==================== 状态 ====================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StudentStore>,
    pub chat: ChatGateway,
}

impl AppState {
    pub fn new(store: Arc<dyn StudentStore>, chat: ChatGateway) -> Self {
        Self { store, chat }
    }
}

// ==================== API 响应类型 ====================

#[derive(Serialize)]
pub struct ChatOverviewResponse {
    pub api_status: bool,
    pub students: Vec<StudentRecord>,
}

// ==================== 处理器 ====================

/// 健康检查
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 获取学生列表
async fn list_students(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_all().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            error!("Error loading students: {}", e);
            error_response(&e)
        }
    }
}

/// 获取单个学生
async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Response {
    match state.store.get_by_id(&student_id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => not_found(&student_id),
        Err(e) => {
            error!("Error loading student {}: {}", student_id, e);
            error_response(&e)
        }
    }
}

/// 新建学生
async fn create_student(
    State(state): State<Arc<AppState>>,
    Json(record): Json<StudentRecord>,
) -> Response {
    match state.store.create(&record).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => {
            error!("Error creating student: {}", e);
            error_response(&e)
        }
    }
}

/// 更新学生，路径中的 ID 必须与请求体一致
async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
    Json(record): Json<StudentRecord>,
) -> Response {
    if student_id != record.student_id {
        return not_found(&student_id);
    }

    match state.store.update(&record).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => {
            error!("Error updating student {}: {}", student_id, e);
            error_response(&e)
        }
    }
}

/// 删除学生
async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Response {
    match state.store.delete(&student_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!("Error deleting student {}: {}", student_id, e);
            error_response(&e)
        }
    }
}

/// 转发聊天消息
async fn send_chat_message(
    State(state): State<Arc<AppState>>,
    Json(exchange): Json<ChatExchange>,
) -> Response {
    match state.chat.send_message(&exchange).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => {
            error!("Error sending message: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorDetailsResponse {
                    error: "Failed to send message".to_string(),
                    details: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// 聊天服务状态
async fn chat_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = if state.chat.check_health().await {
        "healthy"
    } else {
        "unhealthy"
    };
    Json(serde_json::json!({ "status": status }))
}

/// 聊天页概览：服务状态和学生列表，任何失败都降级为空数据
async fn chat_overview(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (api_status, students) = tokio::join!(state.chat.check_health(), state.store.list_all());

    let students = students.unwrap_or_else(|e| {
        warn!("Error loading students for chat page: {}", e);
        Vec::new()
    });

    Json(ChatOverviewResponse {
        api_status,
        students,
    })
}

// ==================== 路由 ====================

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/students", get(list_students).post(create_student))
        .route(
            "/api/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/api/chat", post(send_chat_message))
        .route("/api/chat/health", get(chat_health))
        .route("/api/chat/overview", get(chat_overview))
        .layer(cors)
        .with_state(state)
}

// ==================== 服务器启动 ====================

pub async fn start_web_server(bind_addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Web server started on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
