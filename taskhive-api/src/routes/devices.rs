/// Device token endpoints
///
/// Push delivery needs a registered device token. Clients call this after
/// obtaining one from FCM or APNs; the platform discriminator picks which
/// column on the user row to fill.
use axum::{extract::State, Extension};
use serde::Deserialize;

use taskhive_shared::{
    auth::middleware::AuthContext,
    models::user::{DevicePlatform, User},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, MessageEnvelope},
    routes::Json,
};

/// Save token request
#[derive(Debug, Deserialize)]
pub struct SaveTokenRequest {
    /// `fcm` or `apns`
    pub platform: Option<String>,

    /// Provider-issued device token
    pub token: Option<String>,
}

/// Register a device token on the caller's user row
///
/// # Endpoint
///
/// ```text
/// POST /v1/devices/token
/// Authorization: Bearer <token>
///
/// { "platform": "fcm", "token": "fcm-registration-token" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing token or unknown platform
/// - `404 Not Found`: User row no longer exists
pub async fn save_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SaveTokenRequest>,
) -> ApiResult<Json<MessageEnvelope>> {
    let platform = match req.platform.as_deref().map(str::trim) {
        Some("fcm") => DevicePlatform::Fcm,
        Some("apns") => DevicePlatform::Apns,
        Some(other) => {
            return Err(ApiError::BadRequest(format!("Invalid platform: {}", other)));
        }
        None => return Err(ApiError::BadRequest("Platform is required".to_string())),
    };

    let token = match req.token.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(ApiError::BadRequest("Token is required".to_string())),
    };

    User::set_device_token(&state.db, auth.user_id, platform, &token)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(response::ok_message("Token saved"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_token_request_deserializes() {
        let req: SaveTokenRequest =
            serde_json::from_str(r#"{ "platform": "fcm", "token": "abc" }"#).unwrap();
        assert_eq!(req.platform.as_deref(), Some("fcm"));
        assert_eq!(req.token.as_deref(), Some("abc"));

        let req: SaveTokenRequest = serde_json::from_str("{}").unwrap();
        assert!(req.platform.is_none());
        assert!(req.token.is_none());
    }

    // Token persistence is covered in tests/ and requires a running
    // database
}
