/// Authorization helpers
///
/// Role-based access control over company memberships. There are two
/// roles: every member may read and write the company's projects and
/// tasks; admins may additionally manage the company itself, its members,
/// and its invites.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::auth::authorization::{require_admin, require_membership};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, company_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// // Any member may list projects
/// require_membership(&pool, company_id, user_id).await?;
///
/// // Only admins may invite
/// require_admin(&pool, company_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::Membership;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the company
    #[error("Not a member of company {0}")]
    NotMember(Uuid),

    /// Operation needs the admin role
    #[error("Admin role required in company {0}")]
    AdminRequired(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks that a user belongs to a company.
///
/// # Errors
///
/// Returns `AuthzError::NotMember` if no membership row exists.
pub async fn require_membership(
    pool: &PgPool,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    let has_access = Membership::has_access(pool, company_id, user_id).await?;

    if !has_access {
        return Err(AuthzError::NotMember(company_id));
    }

    Ok(())
}

/// Checks that a user holds the admin role in a company.
///
/// # Errors
///
/// Returns `AuthzError::NotMember` for non-members and
/// `AuthzError::AdminRequired` for plain members.
pub async fn require_admin(
    pool: &PgPool,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    let role = Membership::get_role(pool, company_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(company_id))?;

    if !role.is_admin() {
        return Err(AuthzError::AdminRequired(company_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authz_error_display() {
        let company_id = Uuid::new_v4();

        let err = AuthzError::NotMember(company_id);
        assert!(err.to_string().contains("Not a member"));

        let err = AuthzError::AdminRequired(company_id);
        assert!(err.to_string().contains("Admin role required"));
    }

    // Membership-backed checks are exercised in tests/ and require a
    // running database
}
