/// User model and database operations
///
/// Users belong to companies via the memberships table; nothing about
/// membership is embedded here. The two nullable token columns carry the
/// push registration tokens the channel-selection policy reads.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     full_name TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     fcm_token TEXT,
///     apns_token TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::user::{CreateUser, User};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         full_name: "Asha Rao".to_string(),
///         email: "asha@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "asha@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A user account.
///
/// Passwords are stored as Argon2id hashes, never in plaintext. Route
/// handlers map this to a response type that omits the hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub full_name: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// FCM registration token for the primary push channel
    pub fcm_token: Option<String>,

    /// APNs device token for the fallback push channel
    pub apns_token: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Which push channel a device token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Fcm,
    Apns,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub full_name: String,

    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,
}

impl User {
    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation (`users_email_key`) when the
    /// email is already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, full_name, email, password_hash, fcm_token, apns_token,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, fcm_token, apns_token,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, fcm_token, apns_token,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Stores (or replaces) a push registration token for one platform.
    ///
    /// Returns the updated user, or `None` if the user does not exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use taskhive_shared::models::user::{DevicePlatform, User};
    /// # use sqlx::PgPool;
    /// # use uuid::Uuid;
    /// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    /// User::set_device_token(&pool, user_id, DevicePlatform::Fcm, "fcm-token-abc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn set_device_token(
        pool: &PgPool,
        id: Uuid,
        platform: DevicePlatform,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let column = match platform {
            DevicePlatform::Fcm => "fcm_token",
            DevicePlatform::Apns => "apns_token",
        };

        let query = format!(
            "UPDATE users SET {column} = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING id, full_name, email, password_hash, fcm_token, apns_token,
                       created_at, updated_at"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(token)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let create_user = CreateUser {
            full_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
        };

        assert_eq!(create_user.email, "test@example.com");
        assert_eq!(create_user.password_hash, "hash");
    }

    #[test]
    fn test_device_platform_serde() {
        let fcm: DevicePlatform = serde_json::from_str("\"fcm\"").unwrap();
        assert_eq!(fcm, DevicePlatform::Fcm);

        let apns: DevicePlatform = serde_json::from_str("\"apns\"").unwrap();
        assert_eq!(apns, DevicePlatform::Apns);

        assert!(serde_json::from_str::<DevicePlatform>("\"web\"").is_err());
    }

    // Integration tests for database operations are in tests/ and require
    // a running database
}
