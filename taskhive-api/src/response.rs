/// Success response envelopes
///
/// Every successful response carries `"success": true` plus the payload
/// under `"data"`, except task endpoints which echo the task under
/// `"task"`. Paginated listings add `total` and `page` beside the data.
use axum::http::StatusCode;
use serde::Serialize;

use crate::routes::Json;

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub success: bool,
    pub data: T,
}

/// Task-endpoint envelope
#[derive(Debug, Serialize)]
pub struct TaskEnvelope<T> {
    pub success: bool,
    pub task: T,
}

/// Acknowledgement envelope for operations with no payload
#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: String,
}

/// Paginated listing envelope
#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
}

/// 200 with `{"success": true, "data": …}`
pub fn ok<T: Serialize>(data: T) -> Json<DataEnvelope<T>> {
    Json(DataEnvelope {
        success: true,
        data,
    })
}

/// 201 with `{"success": true, "data": …}`
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<DataEnvelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// 200 with `{"success": true, "task": …}`
pub fn ok_task<T: Serialize>(task: T) -> Json<TaskEnvelope<T>> {
    Json(TaskEnvelope {
        success: true,
        task,
    })
}

/// 201 with `{"success": true, "task": …}`
pub fn created_task<T: Serialize>(task: T) -> (StatusCode, Json<TaskEnvelope<T>>) {
    (StatusCode::CREATED, ok_task(task))
}

/// 200 with `{"success": true, "message": …}`
pub fn ok_message(message: impl Into<String>) -> Json<MessageEnvelope> {
    Json(MessageEnvelope {
        success: true,
        message: message.into(),
    })
}

/// 200 with `{"success": true, "data": […], "total": …, "page": …}`
pub fn ok_page<T: Serialize>(data: Vec<T>, total: i64, page: i64) -> Json<PageEnvelope<T>> {
    Json(PageEnvelope {
        success: true,
        data,
        total,
        page,
    })
}
