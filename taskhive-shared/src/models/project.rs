/// Project model and database operations
///
/// Projects group tasks within a company. Project names are unique within
/// their company only; two companies can both have a "Website" project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     description TEXT,
///     company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (company_id, name)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A project within a company.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID (UUID v4)
    pub id: Uuid,

    /// Project name, unique within the owning company
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Owning company
    pub company_id: Uuid,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub company_id: Uuid,
}

impl Project {
    /// Creates a new project.
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation
    /// (`projects_company_name_key`) when the name is already used within
    /// the company.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, description, company_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, company_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.description)
        .bind(data.company_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, company_id, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by name within one company.
    pub async fn find_in_company(
        pool: &PgPool,
        company_id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, company_id, created_at, updated_at
            FROM projects
            WHERE company_id = $1 AND name = $2
            "#,
        )
        .bind(company_id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists a company's projects, newest first.
    pub async fn list_by_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, company_id, created_at, updated_at
            FROM projects
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates the name and/or description. Only supplied fields change.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE projects SET updated_at = NOW()");
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
            " WHERE id = $1 RETURNING id, name, description, company_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(name) = name {
            q = q.bind(name);
        }
        if let Some(description) = description {
            q = q.bind(description);
        }

        let project = q.fetch_optional(pool).await?;

        Ok(project)
    }

    /// Deletes a project and, via cascade, its tasks.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_struct() {
        let data = CreateProject {
            name: "Website Redesign".to_string(),
            description: Some("Q1 refresh".to_string()),
            company_id: Uuid::new_v4(),
        };

        assert_eq!(data.name, "Website Redesign");
        assert!(data.description.is_some());
    }

    // Integration tests for database operations are in tests/ and require
    // a running database
}
