/// Push notification delivery
///
/// Two channels: FCM (primary) and APNs (fallback), selected per user by
/// which device token is registered. The [`Pusher`] facade owns the provider
/// clients and applies the selection policy; a user with no token is a
/// silent no-op on the task lifecycle path, never an error.
///
/// # Modules
///
/// - [`message`]: notification kinds and title/body composition
/// - [`fcm`]: FCM HTTP client
/// - [`apns`]: APNs HTTP/2 client with provider-token auth
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::push::{PushConfig, Pusher};
/// use taskhive_shared::push::message::{NotifyKind, PushMessage, TaskRef};
/// # use taskhive_shared::models::user::User;
/// # use uuid::Uuid;
///
/// # async fn example(user: User, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pusher = Pusher::new(&PushConfig::from_env())?;
///
/// let message = PushMessage::compose(NotifyKind::Assigned, "Ship report", None);
/// let task = TaskRef { task_id, kind: NotifyKind::Assigned };
/// let outcome = pusher.notify_user(&user, &message, Some(task)).await?;
/// println!("delivery outcome: {:?}", outcome);
/// # Ok(())
/// # }
/// ```

pub mod apns;
pub mod fcm;
pub mod message;

use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::models::user::User;
use apns::ApnsClient;
use fcm::FcmClient;
use message::{PushMessage, TaskRef};

/// Outbound request timeout for both providers
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for push delivery
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// HTTP transport failure
    #[error("Push request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the notification
    #[error("{0}")]
    Provider(String),

    /// APNs provider-token problem
    #[error("APNs provider token error: {0}")]
    ProviderToken(String),

    /// The selected channel has no configured client
    #[error("Push channel not configured: {0}")]
    NotConfigured(&'static str),

    /// Bad or partial channel configuration
    #[error("Push configuration error: {0}")]
    Config(String),
}

/// Delivery channel, in selection-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Fcm,
    Apns,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Fcm => "fcm",
            Channel::Apns => "apns",
        }
    }

    /// Applies the selection policy to a user's registered tokens.
    ///
    /// A trimmed non-blank FCM token wins; otherwise a non-blank APNs
    /// token; otherwise no channel.
    pub fn select(fcm_token: Option<&str>, apns_token: Option<&str>) -> Option<Channel> {
        if fcm_token.map(str::trim).filter(|t| !t.is_empty()).is_some() {
            return Some(Channel::Fcm);
        }
        if apns_token.map(str::trim).filter(|t| !t.is_empty()).is_some() {
            return Some(Channel::Apns);
        }
        None
    }
}

/// What happened to a delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Delivered through the given channel
    Sent(Channel),

    /// User has no registered device token; nothing was attempted
    NoDeviceToken,
}

/// Push provider configuration, read from the environment.
///
/// Every field is optional: a channel with missing configuration simply
/// cannot be used, which surfaces as `PushError::NotConfigured` if the
/// selection policy picks it.
#[derive(Debug, Clone, Default)]
pub struct PushConfig {
    pub fcm_server_key: Option<String>,
    pub fcm_endpoint: Option<String>,
    pub apns_auth_key: Option<String>,
    pub apns_key_id: Option<String>,
    pub apns_team_id: Option<String>,
    pub apns_topic: Option<String>,
    pub apns_endpoint: Option<String>,
}

impl PushConfig {
    /// Reads provider settings from the environment.
    ///
    /// `FCM_SERVER_KEY` enables FCM; `APNS_AUTH_KEY` (PEM contents),
    /// `APNS_KEY_ID`, `APNS_TEAM_ID` and `APNS_TOPIC` together enable APNs.
    /// `FCM_ENDPOINT` and `APNS_ENDPOINT` override the provider URLs.
    pub fn from_env() -> Self {
        Self {
            fcm_server_key: env::var("FCM_SERVER_KEY").ok(),
            fcm_endpoint: env::var("FCM_ENDPOINT").ok(),
            apns_auth_key: env::var("APNS_AUTH_KEY").ok(),
            apns_key_id: env::var("APNS_KEY_ID").ok(),
            apns_team_id: env::var("APNS_TEAM_ID").ok(),
            apns_topic: env::var("APNS_TOPIC").ok(),
            apns_endpoint: env::var("APNS_ENDPOINT").ok(),
        }
    }
}

/// Push dispatcher holding the per-channel clients.
#[derive(Debug, Clone)]
pub struct Pusher {
    fcm: Option<FcmClient>,
    apns: Option<ApnsClient>,
}

impl Pusher {
    /// Builds clients for every configured channel.
    ///
    /// # Errors
    ///
    /// Returns `PushError::Config` for a partially configured APNs channel
    /// and `PushError::ProviderToken` for an unparseable auth key; both are
    /// startup-time failures.
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(PushError::Http)?;

        let fcm = config.fcm_server_key.as_ref().map(|key| {
            FcmClient::new(
                client.clone(),
                config
                    .fcm_endpoint
                    .clone()
                    .unwrap_or_else(|| fcm::DEFAULT_FCM_ENDPOINT.to_string()),
                key.clone(),
            )
        });

        let apns = match (
            config.apns_auth_key.as_ref(),
            config.apns_key_id.as_ref(),
            config.apns_team_id.as_ref(),
            config.apns_topic.as_ref(),
        ) {
            (None, None, None, None) => None,
            (Some(auth_key), Some(key_id), Some(team_id), Some(topic)) => Some(ApnsClient::new(
                client,
                config
                    .apns_endpoint
                    .clone()
                    .unwrap_or_else(|| apns::DEFAULT_APNS_ENDPOINT.to_string()),
                topic.clone(),
                team_id.clone(),
                key_id.clone(),
                auth_key,
            )?),
            _ => {
                return Err(PushError::Config(
                    "APNs needs APNS_AUTH_KEY, APNS_KEY_ID, APNS_TEAM_ID and APNS_TOPIC together"
                        .to_string(),
                ))
            }
        };

        Ok(Self { fcm, apns })
    }

    /// A pusher with no channels; every selected delivery fails with
    /// `NotConfigured`. Used in tests.
    pub fn disabled() -> Self {
        Self {
            fcm: None,
            apns: None,
        }
    }

    /// Delivers a notification to a user through the selected channel.
    ///
    /// Returns `PushOutcome::NoDeviceToken` without error when the user has
    /// no registered token.
    pub async fn notify_user(
        &self,
        user: &User,
        message: &PushMessage,
        task: Option<TaskRef>,
    ) -> Result<PushOutcome, PushError> {
        match Channel::select(user.fcm_token.as_deref(), user.apns_token.as_deref()) {
            None => Ok(PushOutcome::NoDeviceToken),
            Some(Channel::Fcm) => {
                let client = self.fcm.as_ref().ok_or(PushError::NotConfigured("fcm"))?;
                let token = user.fcm_token.as_deref().unwrap_or_default().trim();
                client.send(token, message, task).await?;
                Ok(PushOutcome::Sent(Channel::Fcm))
            }
            Some(Channel::Apns) => {
                let client = self.apns.as_ref().ok_or(PushError::NotConfigured("apns"))?;
                let token = user.apns_token.as_deref().unwrap_or_default().trim();
                client.send(token, message, task).await?;
                Ok(PushOutcome::Sent(Channel::Apns))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_tokens(fcm: Option<&str>, apns: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Jordan Lee".to_string(),
            email: "jordan@example.com".to_string(),
            password_hash: String::new(),
            fcm_token: fcm.map(String::from),
            apns_token: apns.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_select_prefers_fcm() {
        assert_eq!(
            Channel::select(Some("fcm-token"), Some("apns-token")),
            Some(Channel::Fcm)
        );
    }

    #[test]
    fn test_select_falls_back_to_apns() {
        assert_eq!(Channel::select(None, Some("apns-token")), Some(Channel::Apns));
        assert_eq!(Channel::select(Some("   "), Some("apns-token")), Some(Channel::Apns));
        assert_eq!(Channel::select(Some(""), Some("apns-token")), Some(Channel::Apns));
    }

    #[test]
    fn test_select_none_when_no_tokens() {
        assert_eq!(Channel::select(None, None), None);
        assert_eq!(Channel::select(Some(""), Some("  ")), None);
    }

    #[tokio::test]
    async fn test_no_token_is_silent_noop() {
        let pusher = Pusher::disabled();
        let user = user_with_tokens(None, None);
        let message = PushMessage {
            title: "t".to_string(),
            body: "b".to_string(),
        };

        let outcome = pusher.notify_user(&user, &message, None).await.unwrap();
        assert_eq!(outcome, PushOutcome::NoDeviceToken);
    }

    #[tokio::test]
    async fn test_unconfigured_channel_errors() {
        let pusher = Pusher::disabled();
        let user = user_with_tokens(Some("fcm-token"), None);
        let message = PushMessage {
            title: "t".to_string(),
            body: "b".to_string(),
        };

        let result = pusher.notify_user(&user, &message, None).await;
        assert!(matches!(result, Err(PushError::NotConfigured("fcm"))));
    }

    #[test]
    fn test_partial_apns_config_rejected() {
        let config = PushConfig {
            apns_auth_key: Some("pem".to_string()),
            apns_key_id: Some("KEY".to_string()),
            ..Default::default()
        };

        let result = Pusher::new(&config);
        assert!(matches!(result, Err(PushError::Config(_))));
    }
}
