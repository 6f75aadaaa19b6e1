/// Email delivery log
///
/// One row per transactional-email attempt on the order path, whether the
/// provider accepted it or not. The log is append-only; nothing updates a
/// row after insertion.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE email_status AS ENUM ('accepted', 'error');
///
/// CREATE TABLE email_logs (
///     id UUID PRIMARY KEY,
///     to_email TEXT NOT NULL,
///     bcc TEXT[] NOT NULL DEFAULT '{}',
///     subject TEXT NOT NULL,
///     order_id TEXT,
///     status email_status NOT NULL,
///     provider_message_id TEXT,
///     error_message TEXT,
///     meta JSONB NOT NULL DEFAULT '{}',
///     sent_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Outcome of a send attempt as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "email_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    /// Provider accepted the message for delivery
    Accepted,
    /// Send failed; `error_message` carries the reason
    Error,
}

/// One logged send attempt.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailLog {
    pub id: Uuid,

    /// Recipient address
    pub to_email: String,

    /// Blind-copied addresses (admin copies)
    pub bcc: Vec<String>,

    pub subject: String,

    /// Gateway order reference this email relates to, when applicable
    pub order_id: Option<String>,

    pub status: EmailStatus,

    /// Provider-assigned message ID on success
    pub provider_message_id: Option<String>,

    /// Failure detail on error
    pub error_message: Option<String>,

    /// Provider/template context kept for debugging
    pub meta: JsonValue,

    /// When the attempt was made
    pub sent_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

/// Input for recording a send attempt
#[derive(Debug, Clone)]
pub struct CreateEmailLog {
    pub to_email: String,
    pub bcc: Vec<String>,
    pub subject: String,
    pub order_id: Option<String>,
    pub status: EmailStatus,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub meta: JsonValue,
}

const EMAIL_LOG_COLUMNS: &str = "id, to_email, bcc, subject, order_id, status, \
     provider_message_id, error_message, meta, sent_at, created_at";

impl EmailLog {
    /// Records a send attempt.
    pub async fn record(pool: &PgPool, data: CreateEmailLog) -> Result<Self, sqlx::Error> {
        let log = sqlx::query_as::<_, EmailLog>(&format!(
            r#"
            INSERT INTO email_logs (id, to_email, bcc, subject, order_id, status,
                                    provider_message_id, error_message, meta, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            RETURNING {EMAIL_LOG_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(data.to_email)
        .bind(data.bcc)
        .bind(data.subject)
        .bind(data.order_id)
        .bind(data.status)
        .bind(data.provider_message_id)
        .bind(data.error_message)
        .bind(data.meta)
        .fetch_one(pool)
        .await?;

        Ok(log)
    }

    /// Lists attempts for a gateway order reference, newest first.
    pub async fn list_for_order(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let logs = sqlx::query_as::<_, EmailLog>(&format!(
            r#"
            SELECT {EMAIL_LOG_COLUMNS} FROM email_logs
            WHERE order_id = $1
            ORDER BY sent_at DESC
            "#
        ))
        .bind(order_id)
        .fetch_all(pool)
        .await?;

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&EmailStatus::Accepted).unwrap(), "\"accepted\"");
        assert_eq!(serde_json::to_string(&EmailStatus::Error).unwrap(), "\"error\"");

        let status: EmailStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, EmailStatus::Error);
    }

    // Integration tests for database operations are in tests/ and require
    // a running database
}
