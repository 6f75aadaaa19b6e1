/// API route handlers
///
/// Handlers organized by resource:
///
/// - `health`: liveness and health check
/// - `auth`: signup, login, refresh, invite acceptance
/// - `companies`: company CRUD, members, invites
/// - `projects`: project CRUD
/// - `tasks`: task lifecycle and queries
/// - `devices`: device token registration
/// - `notifications`: direct push send
/// - `orders`: checkout orders, abandoned orders, stats
/// - `payments`: payment gateway sessions
///
/// Identifiers cross the wire as strings and are parsed explicitly, so a
/// malformed id is a 400 in the standard envelope before any lookup runs.
use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

pub mod auth;
pub mod companies;
pub mod devices;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod projects;
pub mod tasks;

/// JSON body extractor whose rejection uses the standard failure envelope.
///
/// Axum's stock extractor reports a body that fails to deserialize as a
/// plain-text 422; this wrapper routes the rejection through
/// [`ApiError::BadRequest`] so malformed fields get the same enveloped 400
/// as any other validation failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Parses a wire identifier, rejecting malformed input before any lookup.
pub(crate) fn parse_id(value: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} id", what)))
}

/// Deserializer distinguishing an absent field from an explicit null.
///
/// Used with `#[serde(default, deserialize_with = "double_option")]`:
/// absent stays `None`, `null` becomes `Some(None)` (clear the field) and a
/// value becomes `Some(Some(_))`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "task").unwrap(), id);
        assert_eq!(parse_id(&format!("  {id} "), "task").unwrap(), id);
    }

    #[test]
    fn test_parse_id_rejects_malformed() {
        let err = parse_id("not-a-uuid", "project").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Invalid project id"));
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Payload {
            #[serde(default, deserialize_with = "double_option")]
            description: Option<Option<String>>,
        }

        let absent: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.description, None);

        let cleared: Payload = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: Payload = serde_json::from_str(r#"{"description": "notes"}"#).unwrap();
        assert_eq!(set.description, Some(Some("notes".to_string())));
    }
}
