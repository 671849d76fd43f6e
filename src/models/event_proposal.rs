//! Event proposal model.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A student-submitted idea for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProposal {
    pub id: String,
    pub proposal: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating or updating an event proposal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProposalRequest {
    #[serde(default)]
    pub proposal: Option<String>,
}

impl EventProposalRequest {
    /// The trimmed proposal text, required to be non-empty.
    pub fn proposal_text(&self) -> Result<String, AppError> {
        self.proposal_update()?
            .ok_or_else(|| AppError::Validation("Proposal text is required".to_string()))
    }

    /// Replacement text for a patch; absent means leave it unchanged, blank is rejected.
    pub fn proposal_update(&self) -> Result<Option<String>, AppError> {
        match self.proposal.as_deref().map(str::trim) {
            None => Ok(None),
            Some("") => Err(AppError::Validation(
                "Proposal text is required".to_string(),
            )),
            Some(text) => Ok(Some(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_text_is_trimmed() {
        let request = EventProposalRequest {
            proposal: Some("  Exam-week study night \n".into()),
        };
        assert_eq!(request.proposal_text().unwrap(), "Exam-week study night");
    }

    #[test]
    fn test_whitespace_proposal_rejected() {
        let request = EventProposalRequest {
            proposal: Some(" \t ".into()),
        };
        assert!(request.proposal_text().is_err());
        assert!(EventProposalRequest { proposal: None }.proposal_text().is_err());
    }

    #[test]
    fn test_patch_without_text_is_a_no_op() {
        assert_eq!(
            EventProposalRequest { proposal: None }.proposal_update().unwrap(),
            None
        );
        let blank = EventProposalRequest {
            proposal: Some("   ".into()),
        };
        assert!(blank.proposal_update().is_err());
    }
}
