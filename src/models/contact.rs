//! Tutor contact form model.

use serde::Deserialize;

use super::{require, require_email};
use crate::errors::AppError;

/// A student's message to a tutor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorContactRequest {
    #[serde(default)]
    pub tutor_name: String,
    #[serde(default)]
    pub tutor_email: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl TutorContactRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require(&self.tutor_name, "Tutor name")?;
        require_email(&self.tutor_email, "Tutor email")?;
        require(&self.student_name, "Your name")?;
        require_email(&self.student_email, "Your email")?;
        require(&self.message, "Message")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_validation() {
        let mut request = TutorContactRequest {
            tutor_name: "Dr. Lee".into(),
            tutor_email: "lee@tutors.example".into(),
            student_name: "Jo".into(),
            student_email: "jo@uni.example".into(),
            message: "Can we meet before the midterm?".into(),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        request.student_email = "jo".into();
        assert_eq!(
            request.validate().unwrap_err().message(),
            "Your email must be a valid email address"
        );
    }
}
