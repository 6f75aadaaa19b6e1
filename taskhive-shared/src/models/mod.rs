/// Database models for Taskhive
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and device push tokens
/// - `company`: Companies (top-level tenant grouping)
/// - `membership`: User-company relationships with roles
/// - `project`: Projects within a company
/// - `invite`: Email invitations into a company
/// - `task`: Tasks, the notification-bearing core entity
/// - `order`: Confirmed and abandoned checkout orders
/// - `email_log`: Transactional-email delivery log
/// - `scheduled_job`: Delayed job queue rows
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::user::{User, CreateUser};
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     full_name: "Jordan Lee".to_string(),
///     email: "jordan@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod company;
pub mod email_log;
pub mod invite;
pub mod membership;
pub mod order;
pub mod project;
pub mod scheduled_job;
pub mod task;
pub mod user;
