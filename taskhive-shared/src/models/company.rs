/// Company model and database operations
///
/// Companies are the tenant boundary: projects and tasks hang off a company,
/// and authorization is decided by the (company, user, role) membership
/// relation. Member lists are always derived by query from `memberships`,
/// never stored on the company row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL UNIQUE,
///     description TEXT,
///     created_by UUID NOT NULL REFERENCES users (id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::company::{Company, CreateCompany};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, creator: Uuid) -> Result<(), sqlx::Error> {
/// let company = Company::create(
///     &pool,
///     CreateCompany {
///         name: "Acme Corp".to_string(),
///         description: Some("Widgets at scale".to_string()),
///         created_by: creator,
///     },
/// )
/// .await?;
///
/// let mine = Company::list_for_user(&pool, creator).await?;
/// assert!(mine.iter().any(|c| c.id == company.id));
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A company (tenant).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID (UUID v4)
    pub id: Uuid,

    /// Company name, unique across the system
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// The user who created the company (always an admin member)
    pub created_by: Uuid,

    /// When the company was created
    pub created_at: DateTime<Utc>,

    /// When the company was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
}

impl Company {
    /// Creates a new company.
    ///
    /// Membership for the creator is written separately (see
    /// `Membership::create`); callers wrap both in one transaction-shaped
    /// flow at the route level.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation (`companies_name_key`) when
    /// the name is already taken.
    pub async fn create(pool: &PgPool, data: CreateCompany) -> Result<Self, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, name, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.description)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(company)
    }

    /// Finds a company by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, description, created_by, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Finds a company by exact name.
    ///
    /// Used by the creation handler to surface duplicate names as a
    /// validation failure rather than a constraint error.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, description, created_by, created_at, updated_at
            FROM companies
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Lists the companies a user is a member of, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT c.id, c.name, c.description, c.created_by, c.created_at, c.updated_at
            FROM companies c
            INNER JOIN memberships m ON m.company_id = c.id
            WHERE m.user_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(companies)
    }

    /// Updates the name and/or description. Only supplied fields change.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE companies SET updated_at = NOW()");
        let mut bind_count = 1;

        if name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, name, description, created_by, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Company>(&query).bind(id);

        if let Some(name) = name {
            q = q.bind(name);
        }
        if let Some(description) = description {
            q = q.bind(description);
        }

        let company = q.fetch_optional(pool).await?;

        Ok(company)
    }

    /// Deletes a company and, via cascade, its projects, tasks, memberships,
    /// and invites.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
