/// Authentication middleware for Axum
///
/// Extracts the `Authorization: Bearer <token>` header, validates the access
/// token, loads the user it names, and adds an [`AuthContext`] to request
/// extensions. Tokens whose user no longer exists are rejected, so deleting
/// an account revokes its outstanding tokens.
///
/// All authentication and authorization failures surface as 401 with the
/// standard `{"success": false, "error": ..., "message": ...}` envelope.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use taskhive_shared::auth::middleware::{create_auth_middleware, AuthContext};
/// use sqlx::PgPool;
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.full_name)
/// }
///
/// fn setup(pool: PgPool) -> Router {
///     Router::new()
///         .route("/protected", get(protected_handler))
///         .layer(middleware::from_fn(create_auth_middleware(pool, "secret")))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::user::User;

/// Authentication context added to request extensions
///
/// Handlers extract it with Axum's `Extension` extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// User's display name
    pub full_name: String,

    /// User's email
    pub email: String,
}

impl AuthContext {
    /// Creates auth context from a loaded user
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token subject no longer exists
    UnknownUser,

    /// Database error
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing credentials".to_string(),
            ),
            AuthError::InvalidFormat(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AuthError::UnknownUser => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unknown user".to_string(),
            ),
            AuthError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            ),
        };

        let body = json!({ "success": false, "error": code, "message": message });

        (status, Json(body)).into_response()
    }
}

/// JWT authentication middleware
///
/// Validates the bearer token, loads the user, and stores an
/// [`AuthContext`] in request extensions for downstream handlers.
///
/// # Errors
///
/// Returns 401 if the header is missing or malformed, the token fails
/// validation or has expired, or the subject user does not exist.
pub async fn jwt_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let user = User::find_by_id(&pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Database error: {}", e)))?
        .ok_or(AuthError::UnknownUser)?;

    let auth_context = AuthContext::from_user(&user);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// Creates a JWT authentication middleware closure
///
/// Captures the pool and secret so the result can be handed straight to
/// `axum::middleware::from_fn`.
pub fn create_auth_middleware(
    pool: PgPool,
    secret: impl Into<String>,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>
       + Clone {
    let secret = secret.into();
    move |req, next| {
        let pool = pool.clone();
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(pool, secret, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_auth_context_from_user() {
        let user = User {
            id: Uuid::new_v4(),
            full_name: "Jordan Lee".to_string(),
            email: "jordan@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            fcm_token: None,
            apns_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let context = AuthContext::from_user(&user);

        assert_eq!(context.user_id, user.id);
        assert_eq!(context.full_name, "Jordan Lee");
        assert_eq!(context.email, "jordan@example.com");
    }

    #[test]
    fn test_auth_error_into_response() {
        let err = AuthError::MissingCredentials;
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let err = AuthError::InvalidFormat("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let err = AuthError::UnknownUser;
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let err = AuthError::DatabaseError("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
