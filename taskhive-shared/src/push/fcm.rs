/// FCM delivery client
///
/// Sends display notifications through the FCM HTTP endpoint using a server
/// key. Task metadata rides along in the `data` payload so the mobile app
/// can deep-link to the task; direct sends omit it.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::message::{PushMessage, TaskRef};
use super::PushError;

/// Default FCM send endpoint
pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct FcmData {
    task_id: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl From<TaskRef> for FcmData {
    fn from(task: TaskRef) -> Self {
        FcmData {
            task_id: task.task_id.to_string(),
            kind: task.kind.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    to: &'a str,
    notification: FcmNotification<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<FcmData>,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    failure: i64,
    #[serde(default)]
    results: Vec<JsonValue>,
}

/// FCM client over a shared HTTP connection pool.
#[derive(Debug, Clone)]
pub struct FcmClient {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl FcmClient {
    pub fn new(client: reqwest::Client, endpoint: String, server_key: String) -> Self {
        Self {
            client,
            endpoint,
            server_key,
        }
    }

    /// Sends a notification to one device token.
    ///
    /// # Errors
    ///
    /// Returns `PushError::Provider` when FCM rejects the request or
    /// reports a delivery failure for the token.
    pub async fn send(
        &self,
        token: &str,
        message: &PushMessage,
        task: Option<TaskRef>,
    ) -> Result<(), PushError> {
        let request = FcmRequest {
            to: token,
            notification: FcmNotification {
                title: &message.title,
                body: &message.body,
            },
            data: task.map(FcmData::from),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Provider(format!(
                "FCM returned {status}: {body}"
            )));
        }

        // A 200 can still carry per-token failures
        let parsed: FcmResponse = response.json().await?;
        if parsed.failure > 0 {
            let detail = parsed
                .results
                .first()
                .and_then(|r| r.get("error"))
                .and_then(|e| e.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(PushError::Provider(format!("FCM delivery failed: {detail}")));
        }

        Ok(())
    }
}
