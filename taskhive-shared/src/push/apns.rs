/// APNs delivery client
///
/// Token-based APNs: requests are authenticated with a provider JWT signed
/// ES256 using the .p8 auth key. Apple accepts a provider token for up to
/// an hour, so one is cached and reissued after 45 minutes rather than
/// signed per send.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::message::{PushMessage, TaskRef};
use super::PushError;

/// Default APNs endpoint (production)
pub const DEFAULT_APNS_ENDPOINT: &str = "https://api.push.apple.com";

/// Reissue the provider token after this long; Apple allows up to an hour
const TOKEN_REFRESH: Duration = Duration::from_secs(45 * 60);

#[derive(Debug, Serialize)]
struct ProviderClaims<'a> {
    iss: &'a str,
    iat: i64,
}

#[derive(Debug, Serialize)]
struct ApnsAlert<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct ApnsAps<'a> {
    alert: ApnsAlert<'a>,
    sound: &'a str,
}

#[derive(Debug, Serialize)]
struct ApnsRequest<'a> {
    aps: ApnsAps<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ApnsErrorBody {
    reason: String,
}

struct CachedToken {
    token: String,
    issued_at: Instant,
}

/// APNs client with a cached provider token.
#[derive(Clone)]
pub struct ApnsClient {
    client: reqwest::Client,
    endpoint: String,
    topic: String,
    team_id: String,
    key_id: String,
    key: EncodingKey,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl fmt::Debug for ApnsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApnsClient")
            .field("endpoint", &self.endpoint)
            .field("topic", &self.topic)
            .field("team_id", &self.team_id)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl ApnsClient {
    /// Builds a client from the .p8 auth key PEM.
    ///
    /// # Errors
    ///
    /// Returns `PushError::ProviderToken` if the key PEM cannot be parsed.
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        topic: String,
        team_id: String,
        key_id: String,
        auth_key_pem: &str,
    ) -> Result<Self, PushError> {
        let key = EncodingKey::from_ec_pem(auth_key_pem.as_bytes())
            .map_err(|e| PushError::ProviderToken(format!("Invalid APNs auth key: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            topic,
            team_id,
            key_id,
            key,
            cached: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns a provider JWT, signing a fresh one when the cached token
    /// is past its refresh age.
    fn provider_token(&self) -> Result<String, PushError> {
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| PushError::ProviderToken("Token cache poisoned".to_string()))?;

        if let Some(ref entry) = *cached {
            if entry.issued_at.elapsed() < TOKEN_REFRESH {
                return Ok(entry.token.clone());
            }
        }

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.key_id.clone());

        let claims = ProviderClaims {
            iss: &self.team_id,
            iat: Utc::now().timestamp(),
        };

        let token = encode(&header, &claims, &self.key)
            .map_err(|e| PushError::ProviderToken(format!("Signing failed: {e}")))?;

        *cached = Some(CachedToken {
            token: token.clone(),
            issued_at: Instant::now(),
        });

        Ok(token)
    }

    /// Sends a notification to one device token.
    ///
    /// # Errors
    ///
    /// Returns `PushError::Provider` with Apple's `reason` string when the
    /// request is rejected.
    pub async fn send(
        &self,
        token: &str,
        message: &PushMessage,
        task: Option<TaskRef>,
    ) -> Result<(), PushError> {
        let provider_token = self.provider_token()?;

        let request = ApnsRequest {
            aps: ApnsAps {
                alert: ApnsAlert {
                    title: &message.title,
                    body: &message.body,
                },
                sound: "default",
            },
            task_id: task.map(|t| t.task_id.to_string()),
            kind: task.map(|t| t.kind.as_str()),
        };

        let url = format!("{}/3/device/{}", self.endpoint, token);
        let response = self
            .client
            .post(&url)
            .header("authorization", format!("bearer {provider_token}"))
            .header("apns-topic", &self.topic)
            .header("apns-push-type", "alert")
            .header("apns-priority", "10")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<ApnsErrorBody>()
                .await
                .map(|b| b.reason)
                .unwrap_or_else(|_| format!("status {status}"));
            return Err(PushError::Provider(format!("APNs rejected: {reason}")));
        }

        Ok(())
    }
}
