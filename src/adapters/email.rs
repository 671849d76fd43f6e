use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{check_status, Mailer, OutgoingEmail};
use crate::config::EmailConfig;
use crate::errors::AppError;

/// The JSON payload for Resend's `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Sends mail through the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let payload = SendEmailPayload {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        check_status("Email provider", response).await?;

        tracing::debug!("Sent email '{}' to {}", email.subject, email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn mailer(base_url: String) -> ResendMailer {
        ResendMailer::new(&EmailConfig {
            api_key: "re_test".into(),
            from: "Study Simple <hello@studysimple.example>".into(),
            base_url,
        })
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "tutor@example.com".into(),
            subject: "New student enquiry".into(),
            html: "<p>Hi</p>".into(),
            reply_to: Some("student@example.com".into()),
        }
    }

    #[tokio::test]
    async fn test_send_posts_payload() {
        let seen: Arc<Mutex<Option<(String, Value)>>> = Arc::default();
        let capture = seen.clone();
        let app = Router::new().route(
            "/emails",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let capture = capture.clone();
                async move {
                    let auth = headers["authorization"].to_str().unwrap().to_string();
                    *capture.lock().unwrap() = Some((auth, body));
                    Json(serde_json::json!({ "id": "email_1" }))
                }
            }),
        );

        mailer(serve(app).await).send(&email()).await.unwrap();

        let (auth, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(auth, "Bearer re_test");
        assert_eq!(body["to"][0], "tutor@example.com");
        assert_eq!(body["reply_to"], "student@example.com");
        assert_eq!(body["from"], "Study Simple <hello@studysimple.example>");
    }

    #[tokio::test]
    async fn test_provider_failure_is_returned() {
        let app = Router::new().route(
            "/emails",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "invalid from") }),
        );

        let err = mailer(serve(app).await).send(&email()).await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
        assert!(err.message().contains("invalid from"));
    }
}
