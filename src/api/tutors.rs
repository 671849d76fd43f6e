//! Tutor contact endpoint.

use std::sync::Arc;

use axum::extract::State;
use html_escape::{encode_double_quoted_attribute, encode_safe};

use super::{success, ApiResult, Payload};
use crate::adapters::{Mailer, OutgoingEmail};
use crate::errors::AppError;
use crate::models::TutorContactRequest;
use crate::AppState;

/// POST /api/tutors/contact - Forward a student's message to a tutor.
///
/// Both emails go out in a background task; the response does not wait for
/// the provider.
pub async fn contact_tutor(
    State(state): State<AppState>,
    Payload { body, .. }: Payload<TutorContactRequest>,
) -> ApiResult<()> {
    body.validate()?;

    let mailer = state
        .mailer
        .clone()
        .ok_or_else(|| AppError::Internal("Email sending is not configured".to_string()))?;

    let emails = contact_emails(&body, &state.config.site_url);
    tokio::spawn(send_all(mailer, emails));

    success(()).map(|r| r.with_message("Message sent to tutor"))
}

async fn send_all(mailer: Arc<dyn Mailer>, emails: Vec<OutgoingEmail>) {
    for email in emails {
        match mailer.send(&email).await {
            Ok(()) => tracing::info!("Sent \"{}\" to {}", email.subject, email.to),
            Err(e) => tracing::error!("Failed to send \"{}\" to {}: {}", email.subject, email.to, e),
        }
    }
}

/// The message to the tutor followed by the student's confirmation.
fn contact_emails(request: &TutorContactRequest, site_url: &str) -> Vec<OutgoingEmail> {
    let subject = request
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Tutoring request");
    let course = request
        .course
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| format!("<p><strong>Course:</strong> {}</p>", encode_safe(c)))
        .unwrap_or_default();

    let tutor_name = encode_safe(request.tutor_name.trim());
    let student_name = encode_safe(request.student_name.trim());
    let student_email = encode_safe(request.student_email.trim());
    let message = encode_safe(request.message.trim()).replace('\n', "<br>");

    let to_tutor = OutgoingEmail {
        to: request.tutor_email.trim().to_string(),
        subject: format!("Study Simple: {}", subject),
        html: format!(
            "<p>Hi {tutor_name},</p>\
             <p>{student_name} ({student_email}) sent you a message through Study Simple.</p>\
             {course}<blockquote>{message}</blockquote>\
             <p>Reply to this email to answer them directly.</p>"
        ),
        reply_to: Some(request.student_email.trim().to_string()),
    };

    let confirmation = OutgoingEmail {
        to: request.student_email.trim().to_string(),
        subject: format!("Your message to {} was sent", request.tutor_name.trim()),
        html: format!(
            "<p>Hi {student_name},</p>\
             <p>We forwarded your message to {tutor_name}. They will reply to you by email.</p>\
             {course}<blockquote>{message}</blockquote>\
             <p><a href=\"{site}\">Back to Study Simple</a></p>",
            site = encode_double_quoted_attribute(site_url),
        ),
        reply_to: None,
    };

    vec![to_tutor, confirmation]
}
