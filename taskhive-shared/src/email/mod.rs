/// Transactional email delivery
///
/// A thin client for the Resend HTTP API plus the HTML templates it sends.
/// Delivery is best-effort on every caller path: send failures are logged
/// to `email_logs`, never propagated to the request that triggered them.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::email::{EmailConfig, Mailer, OutgoingEmail, Tag};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = Mailer::new(&EmailConfig::from_env())?;
///
/// let sent = mailer
///     .send(OutgoingEmail {
///         to: "customer@example.com".to_string(),
///         subject: "Your Order is Confirmed (#order_42)".to_string(),
///         html: "<p>Thank you!</p>".to_string(),
///         bcc: mailer.admin_bcc().into_iter().collect(),
///         tags: vec![Tag::new("type", "order_confirmation")],
///     })
///     .await?;
/// println!("provider message id: {}", sent.id);
/// # Ok(())
/// # }
/// ```

pub mod templates;

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resend API base URL
const DEFAULT_BASE_URL: &str = "https://api.resend.com";

/// Outbound request timeout
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Error type for email delivery
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// HTTP transport failure
    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the message
    #[error("Email provider returned {status}: {body}")]
    Provider {
        status: reqwest::StatusCode,
        body: String,
    },

    /// No API key configured; sending is disabled
    #[error("Email sending is not configured")]
    NotConfigured,
}

/// Email provider configuration, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    /// Resend API key; `None` disables sending
    pub api_key: Option<String>,

    /// Provider base URL override
    pub base_url: Option<String>,

    /// From address for all outbound mail
    pub from: Option<String>,

    /// Admin address blind-copied on order confirmations
    pub admin_bcc: Option<String>,
}

impl EmailConfig {
    /// Reads provider settings from the environment.
    ///
    /// `RESEND_API_KEY` enables sending, `EMAIL_FROM` sets the sender and
    /// `ADMIN_ORDER_BCC` adds an admin copy to order confirmations. Blank
    /// values are treated as unset.
    pub fn from_env() -> Self {
        let non_blank = |name: &str| {
            env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            api_key: non_blank("RESEND_API_KEY"),
            base_url: non_blank("RESEND_BASE_URL"),
            from: non_blank("EMAIL_FROM"),
            admin_bcc: non_blank("ADMIN_ORDER_BCC"),
        }
    }
}

/// Dashboard tag attached to an outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One message to send.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub bcc: Vec<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<&'a Tag>,
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, Deserialize)]
pub struct SentEmail {
    /// Provider-assigned message ID
    pub id: String,
}

/// Resend API client.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    from: String,
    admin_bcc: Option<String>,
}

impl Mailer {
    /// Builds the client. A missing API key still yields a mailer; sends
    /// through it fail with `EmailError::NotConfigured`.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(EmailError::Http)?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone(),
            from: config
                .from
                .clone()
                .unwrap_or_else(|| "TaskHive <no-reply@taskhive.dev>".to_string()),
            admin_bcc: config.admin_bcc.clone(),
        })
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Admin address to blind-copy on order confirmations, if configured.
    pub fn admin_bcc(&self) -> Option<String> {
        self.admin_bcc.clone()
    }

    /// Sends one message and returns the provider acknowledgement.
    pub async fn send(&self, email: OutgoingEmail) -> Result<SentEmail, EmailError> {
        let api_key = self.api_key.as_ref().ok_or(EmailError::NotConfigured)?;

        let request = SendRequest {
            from: &self.from,
            to: [email.to.as_str()],
            bcc: email.bcc.iter().map(String::as_str).collect(),
            subject: &email.subject,
            html: &email.html,
            tags: email.tags.iter().collect(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Provider { status, body });
        }

        Ok(response.json::<SentEmail>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_shape() {
        let tags = vec![Tag::new("type", "order_confirmation")];
        let request = SendRequest {
            from: "TaskHive <no-reply@taskhive.dev>",
            to: ["customer@example.com"],
            bcc: vec!["admin@example.com"],
            subject: "Your Order is Confirmed (#order_42)",
            html: "<p>Thanks</p>",
            tags: tags.iter().collect(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["to"][0], "customer@example.com");
        assert_eq!(value["bcc"][0], "admin@example.com");
        assert_eq!(value["tags"][0]["name"], "type");
        assert_eq!(value["tags"][0]["value"], "order_confirmation");
    }

    #[test]
    fn test_empty_bcc_and_tags_omitted() {
        let request = SendRequest {
            from: "a@b.c",
            to: ["d@e.f"],
            bcc: vec![],
            subject: "s",
            html: "<p>h</p>",
            tags: vec![],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("bcc").is_none());
        assert!(value.get("tags").is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_refuses_send() {
        let mailer = Mailer::new(&EmailConfig::default()).unwrap();
        assert!(!mailer.is_configured());

        let result = mailer
            .send(OutgoingEmail {
                to: "customer@example.com".to_string(),
                subject: "s".to_string(),
                html: "<p>h</p>".to_string(),
                bcc: vec![],
                tags: vec![],
            })
            .await;

        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }
}
