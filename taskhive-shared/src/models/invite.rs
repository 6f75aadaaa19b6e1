/// Invite model and database operations
///
/// Invites let a company admin bring a user in by email. Each invite carries
/// a unique token; the signup-via-token flow consumes it exactly once,
/// creating (or linking) the user and the membership and flipping the
/// accepted flag.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invites (
///     id UUID PRIMARY KEY,
///     email TEXT NOT NULL,
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'member',
///     token TEXT NOT NULL UNIQUE,
///     accepted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::MembershipRole;

/// Length of the random part of an invite token (characters)
const TOKEN_RANDOM_LENGTH: usize = 40;

/// Invite token prefix
const TOKEN_PREFIX: &str = "inv_";

/// A pending or consumed company invite.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invite {
    /// Unique invite ID (UUID v4)
    pub id: Uuid,

    /// Email address the invite was sent to
    pub email: String,

    /// Company the invite grants membership in
    pub company_id: Uuid,

    /// Role the accepted member will hold
    pub role: MembershipRole,

    /// Unique token embedded in the accept link
    pub token: String,

    /// Whether the invite has been consumed
    pub accepted: bool,

    /// When the invite was created
    pub created_at: DateTime<Utc>,

    /// When the invite was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new invite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvite {
    pub email: String,
    pub company_id: Uuid,
    pub role: MembershipRole,
}

/// Generates an invite token: `inv_` plus 40 random base62 characters.
pub fn generate_invite_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let random_part: String = (0..TOKEN_RANDOM_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{TOKEN_PREFIX}{random_part}")
}

impl Invite {
    /// Creates a new invite with a freshly generated token.
    pub async fn create(pool: &PgPool, data: CreateInvite) -> Result<Self, sqlx::Error> {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO invites (id, email, company_id, role, token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, company_id, role, token, accepted, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.email)
        .bind(data.company_id)
        .bind(data.role)
        .bind(generate_invite_token())
        .fetch_one(pool)
        .await?;

        Ok(invite)
    }

    /// Finds an invite by its token.
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, email, company_id, role, token, accepted, created_at, updated_at
            FROM invites
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(invite)
    }

    /// Marks an invite as consumed.
    ///
    /// The `AND accepted = FALSE` guard makes concurrent accepts race-safe:
    /// only one caller sees `true` back.
    pub async fn mark_accepted(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE invites
            SET accepted = TRUE, updated_at = NOW()
            WHERE id = $1 AND accepted = FALSE
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a company's invites, newest first.
    pub async fn list_by_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT id, email, company_id, role, token, accepted, created_at, updated_at
            FROM invites
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await?;

        Ok(invites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_invite_token_format() {
        let token = generate_invite_token();
        assert!(token.starts_with("inv_"));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH);
        assert!(token[TOKEN_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_invite_token_unique() {
        let a = generate_invite_token();
        let b = generate_invite_token();
        assert_ne!(a, b);
    }

    // Integration tests for database operations are in tests/ and require
    // a running database
}
