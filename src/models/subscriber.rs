//! Podcast mailing-list subscriber model.

use serde::{Deserialize, Serialize};

use super::{lenient, require_email};
use crate::errors::AppError;

/// A podcast mailing-list entry. Unsubscribing flips `is_active` rather than
/// removing the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastSubscriber {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub date_subscribed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_unsubscribed: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for subscribing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

impl SubscribeRequest {
    /// The normalized (trimmed, lower-cased) email.
    pub fn normalized_email(&self) -> Result<String, AppError> {
        normalize_email(&self.email)
    }
}

/// Request body for a partial subscriber update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriberRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool_opt")]
    pub is_active: Option<bool>,
}

impl UpdateSubscriberRequest {
    /// The normalized replacement email, if one was supplied.
    pub fn normalized_email(&self) -> Result<Option<String>, AppError> {
        self.email.as_deref().map(normalize_email).transpose()
    }
}

/// How a subscribe request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    AlreadyActive,
    Reactivated,
}

/// Query parameters for listing subscribers.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriberListQuery {
    pub active: Option<bool>,
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    require_email(raw, "Email")?;
    Ok(raw.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized() {
        let request = SubscribeRequest {
            email: "  Listener@Example.COM ".into(),
        };
        assert_eq!(request.normalized_email().unwrap(), "listener@example.com");
    }

    #[test]
    fn test_invalid_email_rejected() {
        let request = SubscribeRequest {
            email: "listener@".into(),
        };
        assert!(request.normalized_email().is_err());
        let request = SubscribeRequest { email: "".into() };
        assert_eq!(
            request.normalized_email().unwrap_err().message(),
            "Email is required"
        );
    }

    #[test]
    fn test_form_string_active_flag() {
        let request: UpdateSubscriberRequest =
            serde_json::from_value(serde_json::json!({ "isActive": "false" })).unwrap();
        assert_eq!(request.is_active, Some(false));

        let request: UpdateSubscriberRequest =
            serde_json::from_value(serde_json::json!({ "isActive": true })).unwrap();
        assert_eq!(request.is_active, Some(true));
    }
}
