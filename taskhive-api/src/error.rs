/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts into the
/// failure envelope `{"success": false, "error": …, "message": …}` with
/// one of the four statuses the API uses: 400 validation, 401
/// authorization, 404 not found, 500 internal.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Task not found".to_string()))
/// }
/// ```
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use taskhive_shared::auth::authorization::AuthzError;
use taskhive_shared::auth::jwt::JwtError;
use taskhive_shared::auth::middleware::AuthError;
use taskhive_shared::auth::password::PasswordError;
use taskhive_shared::email::EmailError;
use taskhive_shared::push::PushError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    BadRequest(String),

    /// Actor lacks credentials or required role (401)
    Unauthorized(String),

    /// Referenced entity does not exist (404)
    NotFound(String),

    /// Persistence or unexpected failure (500)
    Internal(String),
}

/// Failure envelope body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,

    /// Machine-readable error code
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => {
                // Log internal errors but do not expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorBody {
            success: false,
            error: code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Known constraint names map to field-specific 400s (duplicates) and 404s
/// (dangling references); everything else is internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    return match constraint {
                        "users_email_key" => {
                            ApiError::BadRequest("Email already registered".to_string())
                        }
                        "companies_name_key" => {
                            ApiError::BadRequest("Company name already taken".to_string())
                        }
                        "memberships_company_user_key" => ApiError::BadRequest(
                            "User is already a member of this company".to_string(),
                        ),
                        "projects_company_name_key" => ApiError::BadRequest(
                            "Project name already taken in this company".to_string(),
                        ),
                        "orders_order_id_key" | "abandoned_orders_abd_order_id_key" => {
                            ApiError::BadRequest("Order already recorded".to_string())
                        }
                        "tasks_title_not_blank" => {
                            ApiError::BadRequest("Title is required".to_string())
                        }
                        "tasks_project_id_fkey" => {
                            ApiError::NotFound("Project not found".to_string())
                        }
                        "tasks_assigned_to_fkey"
                        | "tasks_created_by_fkey"
                        | "memberships_user_id_fkey"
                        | "companies_created_by_fkey" => {
                            ApiError::NotFound("User not found".to_string())
                        }
                        "projects_company_id_fkey"
                        | "memberships_company_id_fkey"
                        | "invites_company_id_fkey" => {
                            ApiError::NotFound("Company not found".to_string())
                        }
                        _ => ApiError::Internal(format!(
                            "Constraint violation: {}",
                            constraint
                        )),
                    };
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert request-DTO validation failures to a flattened 400
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut parts: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "is invalid".to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect();
        parts.sort();

        ApiError::BadRequest(parts.join("; "))
    }
}

/// Convert body-deserialization rejections to enveloped 400s
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert auth extraction errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DatabaseError(msg) => ApiError::Internal(msg),
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => {
                ApiError::Unauthorized(msg)
            }
            AuthError::UnknownUser => ApiError::Unauthorized("Unknown user".to_string()),
        }
    }
}

/// Convert membership authorization errors to API errors
///
/// Role and membership violations surface as 401 rather than 403.
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ApiError::Unauthorized("You are not a member of this company".to_string())
            }
            AuthzError::AdminRequired(_) => {
                ApiError::Unauthorized("Admin access required".to_string())
            }
            AuthzError::DatabaseError(err) => {
                ApiError::Internal(format!("Database error: {}", err))
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            other => ApiError::Unauthorized(format!("Invalid token: {}", other)),
        }
    }
}

/// Convert push delivery errors to API errors
///
/// Only the direct-send endpoint surfaces these; lifecycle side effects
/// log and swallow them.
impl From<PushError> for ApiError {
    fn from(err: PushError) -> Self {
        ApiError::Internal(format!("Push delivery failed: {}", err))
    }
}

/// Convert email errors to API errors
impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        ApiError::Internal(format!("Email delivery failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = ApiError::NotFound("Task not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Task not found");
    }

    #[tokio::test]
    async fn test_internal_error_is_not_exposed() {
        let response =
            ApiError::Internal("connection refused at 10.0.0.5".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["message"], "An internal error occurred");
    }

    #[test]
    fn test_authz_errors_are_unauthorized() {
        let err: ApiError = AuthzError::AdminRequired(uuid::Uuid::new_v4()).into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
