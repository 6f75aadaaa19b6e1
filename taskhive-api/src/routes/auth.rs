/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Signup
/// - Login
/// - Token refresh
/// - Invite acceptance
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an account
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `POST /v1/auth/invite/accept` - Join a company via invite token
use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use taskhive_shared::{
    auth::{jwt, password},
    models::{
        invite::Invite,
        membership::{CreateMembership, Membership},
        user::{CreateUser, User},
    },
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{self, DataEnvelope},
    routes::Json,
};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub full_name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Invite acceptance request
#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInviteRequest {
    /// Invite token from the invitation email
    pub token: String,

    /// Display name for the new account
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub full_name: String,

    /// Password for the new account
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// User representation returned by auth endpoints
///
/// Mirrors the `users` row without the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserPayload {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Session payload: the user plus a fresh token pair
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user: UserPayload,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh payload
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshPayload {
    /// New access token (24h)
    pub access_token: String,
}

fn issue_session(user: User, secret: &str) -> Result<SessionPayload, ApiError> {
    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, secret)?;
    let refresh_token = jwt::create_token(&refresh_claims, secret)?;

    Ok(SessionPayload {
        user: user.into(),
        access_token,
        refresh_token,
    })
}

/// Create a new account
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// {
///   "full_name": "Priya Sharma",
///   "email": "priya@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "user": { "id": "uuid", "full_name": "Priya Sharma", "email": "priya@example.com" },
///     "access_token": "eyJ...",
///     "refresh_token": "eyJ..."
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
/// - `500 Internal Server Error`: Server error
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<DataEnvelope<SessionPayload>>)> {
    req.validate()?;

    password::validate_password_strength(&req.password).map_err(ApiError::BadRequest)?;

    let password_hash = password::hash_password(&req.password)?;

    // Duplicate emails surface as a users_email_key violation
    let user = User::create(
        &state.db,
        CreateUser {
            full_name: req.full_name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let session = issue_session(user, state.jwt_secret())?;

    Ok(response::created(session))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "priya@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<DataEnvelope<SessionPayload>>> {
    req.validate()?;

    // Unknown email and bad password produce the same message
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let session = issue_session(user, state.jwt_secret())?;

    Ok(response::ok(session))
}

/// Exchange a refresh token for a new access token
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/refresh
/// Content-Type: application/json
///
/// { "refresh_token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<DataEnvelope<RefreshPayload>>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(response::ok(RefreshPayload { access_token }))
}

/// Accept a company invite
///
/// Looks up the invite by token, creates the account (or links an existing
/// one by email), adds the membership with the invited role, and marks the
/// invite accepted. Each token is consumed exactly once.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/invite/accept
/// Content-Type: application/json
///
/// {
///   "token": "f3a9...",
///   "full_name": "Priya Sharma",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or invite already accepted
/// - `404 Not Found`: Unknown invite token
/// - `500 Internal Server Error`: Server error
pub async fn accept_invite(
    State(state): State<AppState>,
    Json(req): Json<AcceptInviteRequest>,
) -> ApiResult<Json<DataEnvelope<SessionPayload>>> {
    req.validate()?;

    let invite = Invite::find_by_token(&state.db, req.token.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?;

    if invite.accepted {
        return Err(ApiError::BadRequest("Invite already accepted".to_string()));
    }

    // The invite email already proves control of the address, so an
    // existing account is linked without a password check
    let user = match User::find_by_email(&state.db, &invite.email).await? {
        Some(existing) => existing,
        None => {
            password::validate_password_strength(&req.password).map_err(ApiError::BadRequest)?;
            let password_hash = password::hash_password(&req.password)?;

            User::create(
                &state.db,
                CreateUser {
                    full_name: req.full_name,
                    email: invite.email.clone(),
                    password_hash,
                },
            )
            .await?
        }
    };

    Membership::create(
        &state.db,
        CreateMembership {
            company_id: invite.company_id,
            user_id: user.id,
            role: invite.role,
        },
    )
    .await?;

    Invite::mark_accepted(&state.db, invite.id).await?;

    let session = issue_session(user, state.jwt_secret())?;

    Ok(response::ok(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Priya Sharma".to_string(),
            email: "priya@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            fcm_token: None,
            apns_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_payload_omits_password_hash() {
        let payload: UserPayload = sample_user().into();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["full_name"], "Priya Sharma");
        assert_eq!(json["email"], "priya@example.com");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_signup_request_validation() {
        let req = SignupRequest {
            full_name: "Priya Sharma".to_string(),
            email: "not-an-email".to_string(),
            password: "SecureP@ss123".to_string(),
        };
        assert!(req.validate().is_err());

        let req = SignupRequest {
            full_name: "Priya Sharma".to_string(),
            email: "priya@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());

        let req = SignupRequest {
            full_name: "Priya Sharma".to_string(),
            email: "priya@example.com".to_string(),
            password: "SecureP@ss123".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_issue_session_round_trips_through_jwt() {
        let secret = "test-secret-with-at-least-32-bytes!!";
        let user = sample_user();
        let user_id = user.id;

        let session = issue_session(user, secret).unwrap();

        let claims = jwt::validate_access_token(&session.access_token, secret).unwrap();
        assert_eq!(claims.sub, user_id);

        let claims = jwt::validate_refresh_token(&session.refresh_token, secret).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    // Signup, login, and invite acceptance against real rows are covered in
    // tests/ and require a running database
}
