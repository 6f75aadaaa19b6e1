/// Membership model and database operations
///
/// The (company, user, role) relation is the single unit of truth for who
/// belongs where. The original drift-prone pattern of mirroring member lists
/// onto both sides of the relation is deliberately absent: anything that
/// needs a member list derives it with a join (see `CompanyMember`).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY,
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role membership_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (company_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **admin**: manage members, invites, and destructive company/project
///   operations
/// - **member**: read and update access within the company
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::membership::{CreateMembership, Membership, MembershipRole};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, company_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// Membership::create(&pool, CreateMembership {
///     company_id,
///     user_id,
///     role: MembershipRole::Admin,
/// })
/// .await?;
///
/// assert!(Membership::has_access(&pool, company_id, user_id).await?);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role a user holds within a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    /// Can manage members and perform destructive operations
    Admin,

    /// Read and update access
    Member,
}

impl MembershipRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }

    /// Parses a role from its wire string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(MembershipRole::Admin),
            "member" => Some(MembershipRole::Member),
            _ => None,
        }
    }

    /// Whether this role may manage members, invites, and deletions
    pub fn is_admin(&self) -> bool {
        matches!(self, MembershipRole::Admin)
    }
}

/// One (company, user, role) membership row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Membership row ID
    pub id: Uuid,

    /// Company ID
    pub company_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the company
    pub role: MembershipRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,

    /// When the membership was last updated
    pub updated_at: DateTime<Utc>,
}

/// A member list entry with user display fields joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompanyMember {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: MembershipRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub company_id: Uuid,

    pub user_id: Uuid,

    /// Role to assign (defaults to member)
    #[serde(default = "default_role")]
    pub role: MembershipRole,
}

fn default_role() -> MembershipRole {
    MembershipRole::Member
}

impl Membership {
    /// Adds a user to a company.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation
    /// (`memberships_company_user_key`) when the user is already a member,
    /// and with a foreign-key violation when the company or user is gone.
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (id, company_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, user_id, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.company_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds the membership for a (company, user) pair.
    pub async fn find(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, company_id, user_id, role, created_at, updated_at
            FROM memberships
            WHERE company_id = $1 AND user_id = $2
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Checks whether a user belongs to a company with any role.
    pub async fn has_access(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM memberships
                WHERE company_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Gets a user's role within a company, `None` when not a member.
    pub async fn get_role(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipRole>, sqlx::Error> {
        let role: Option<MembershipRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM memberships
            WHERE company_id = $1 AND user_id = $2
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Removes a user from a company.
    ///
    /// Returns `true` if a membership row was deleted.
    pub async fn delete(pool: &PgPool, company_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM memberships WHERE company_id = $1 AND user_id = $2")
            .bind(company_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a company's members with user display fields, oldest first.
    ///
    /// This is the derived "member list" the company detail response embeds.
    pub async fn list_members(
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<Vec<CompanyMember>, sqlx::Error> {
        let members = sqlx::query_as::<_, CompanyMember>(
            r#"
            SELECT m.user_id, u.full_name, u.email, m.role, m.created_at AS joined_at
            FROM memberships m
            INNER JOIN users u ON u.id = m.user_id
            WHERE m.company_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Counts a company's admins.
    ///
    /// Used to refuse removing the last admin.
    pub async fn count_admins(pool: &PgPool, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM memberships WHERE company_id = $1 AND role = 'admin'",
        )
        .bind(company_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_role_as_str() {
        assert_eq!(MembershipRole::Admin.as_str(), "admin");
        assert_eq!(MembershipRole::Member.as_str(), "member");
    }

    #[test]
    fn test_membership_role_parse() {
        assert_eq!(MembershipRole::parse("admin"), Some(MembershipRole::Admin));
        assert_eq!(MembershipRole::parse("member"), Some(MembershipRole::Member));
        assert_eq!(MembershipRole::parse("owner"), None);
        assert_eq!(MembershipRole::parse(""), None);
    }

    #[test]
    fn test_role_permissions() {
        assert!(MembershipRole::Admin.is_admin());
        assert!(!MembershipRole::Member.is_admin());
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), MembershipRole::Member);
    }

    // Integration tests for database operations are in tests/ and require
    // a running database
}
