/// Direct push endpoint
///
/// Sends a one-off push to a user through the channel policy (FCM first,
/// APNs fallback). Unlike the task lifecycle path, a recipient with no
/// registered device token is a 400 here: the caller explicitly asked for
/// a delivery, so an undeliverable target is an error rather than a
/// silent no-op.
use axum::extract::State;
use serde::Deserialize;

use taskhive_shared::{
    models::user::User,
    push::{message::PushMessage, PushOutcome},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, MessageEnvelope},
    routes::Json,
};

/// Send notification request
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    /// Recipient user ID
    pub user_id: Option<String>,

    /// Notification title
    pub title: Option<String>,

    /// Notification body
    pub body: Option<String>,
}

/// Send a push notification to one user
///
/// # Endpoint
///
/// ```text
/// POST /v1/notifications/send
/// Authorization: Bearer <token>
///
/// { "user_id": "uuid", "title": "Standup", "body": "Starting in 5 minutes" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields or no registered device token
/// - `404 Not Found`: Unknown user
/// - `500 Internal Server Error`: Provider failure
pub async fn send_notification(
    State(state): State<AppState>,
    Json(req): Json<SendNotificationRequest>,
) -> ApiResult<Json<MessageEnvelope>> {
    let user_id = match req.user_id.as_deref() {
        Some(raw) => crate::routes::parse_id(raw, "user")?,
        None => return Err(ApiError::BadRequest("User id is required".to_string())),
    };

    let title = match req.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(ApiError::BadRequest("Title is required".to_string())),
    };

    let body = match req.body.as_deref().map(str::trim) {
        Some(b) if !b.is_empty() => b.to_string(),
        _ => return Err(ApiError::BadRequest("Body is required".to_string())),
    };

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let message = PushMessage { title, body };

    match state.pusher.notify_user(&user, &message, None).await? {
        PushOutcome::Sent(channel) => {
            tracing::info!(user_id = %user.id, channel = %channel.as_str(), "Notification sent");
            Ok(response::ok_message("Notification sent"))
        }
        PushOutcome::NoDeviceToken => Err(ApiError::BadRequest(
            "User has no registered device token".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_tolerates_missing_fields() {
        let req: SendNotificationRequest = serde_json::from_str("{}").unwrap();
        assert!(req.user_id.is_none());
        assert!(req.title.is_none());
        assert!(req.body.is_none());
    }

    // Delivery through a provider is covered by the worker's handler tests
}
