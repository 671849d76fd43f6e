//! Support ticket model.

use serde::{Deserialize, Serialize};

use super::{require, require_email, require_if_present};
use crate::errors::AppError;

/// Workflow state of a support ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Pending,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::InProgress => "in-progress",
            TicketStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Parse a client-supplied status, naming the allowed values on failure.
    pub fn parse_field(s: &str) -> Result<Self, AppError> {
        Self::parse(s.trim()).ok_or_else(|| {
            AppError::Validation(
                "Status must be one of: pending, in-progress, resolved".to_string(),
            )
        })
    }
}

/// A help request submitted through the contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for opening a support ticket.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupportTicketRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl CreateSupportTicketRequest {
    /// Validate and resolve the initial status.
    pub fn validate(&self) -> Result<TicketStatus, AppError> {
        require(&self.name, "Name")?;
        require_email(&self.email, "Email")?;
        require(&self.subject, "Subject")?;
        require(&self.message, "Message")?;
        match &self.status {
            Some(status) => TicketStatus::parse_field(status),
            None => Ok(TicketStatus::default()),
        }
    }
}

/// Request body for a partial support ticket update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupportTicketRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateSupportTicketRequest {
    /// Validate supplied fields and resolve the new status, if any.
    pub fn validate(&self) -> Result<Option<TicketStatus>, AppError> {
        require_if_present(self.name.as_ref(), "Name")?;
        if let Some(email) = &self.email {
            require_email(email, "Email")?;
        }
        require_if_present(self.subject.as_ref(), "Subject")?;
        require_if_present(self.message.as_ref(), "Message")?;
        self.status
            .as_deref()
            .map(TicketStatus::parse_field)
            .transpose()
    }
}

/// Query parameters for listing support tickets.
#[derive(Debug, Default, Deserialize)]
pub struct SupportListQuery {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateSupportTicketRequest {
        CreateSupportTicketRequest {
            name: "A".into(),
            email: "a@b.com".into(),
            subject: "S".into(),
            message: "M".into(),
            status: None,
        }
    }

    #[test]
    fn test_status_defaults_to_pending() {
        assert_eq!(valid_request().validate().unwrap(), TicketStatus::Pending);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_value(TicketStatus::InProgress).unwrap(),
            "in-progress"
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        let request = CreateSupportTicketRequest {
            status: Some("closed".into()),
            ..valid_request()
        };
        let err = request.validate().unwrap_err();
        assert!(err.message().contains("pending, in-progress, resolved"));
    }

    #[test]
    fn test_bad_email_rejected() {
        let request = CreateSupportTicketRequest {
            email: "not-an-email".into(),
            ..valid_request()
        };
        assert_eq!(
            request.validate().unwrap_err().message(),
            "Email must be a valid email address"
        );
    }
}
