use async_trait::async_trait;
use serde::Serialize;

use super::GatewayError;

const MAILTRAP_BASE_URL: &str = "https://send.api.mailtrap.io";

/// Transactional email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(&self, to: &str, code: &str) -> Result<(), GatewayError>;
    async fn send_welcome_email(&self, to: &str, name: &str) -> Result<(), GatewayError>;
    async fn send_password_reset_email(&self, to: &str, reset_url: &str)
    -> Result<(), GatewayError>;
    async fn send_reset_success_email(&self, to: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Serialize)]
struct SendRequest {
    from: Address,
    to: Vec<Address>,
    subject: String,
    html: String,
    category: String,
}

#[derive(Debug, Serialize)]
struct Address {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

/// Mailtrap transactional send API client.
pub struct MailtrapMailer {
    client: reqwest::Client,
    api_token: String,
    sender_email: String,
    base_url: String,
}

impl MailtrapMailer {
    pub fn new(api_token: impl Into<String>, sender_email: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token: api_token.into(),
            sender_email: sender_email.into(),
            base_url: MAILTRAP_BASE_URL.to_string(),
        }
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: String,
        category: &str,
    ) -> Result<(), GatewayError> {
        let body = SendRequest {
            from: Address {
                email: self.sender_email.clone(),
                name: Some("CDYEATS".into()),
            },
            to: vec![Address {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html,
            category: category.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/send", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                service: "mailtrap",
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(to, category, "email dispatched");
        let _ = response.json::<serde_json::Value>().await;
        Ok(())
    }
}

#[async_trait]
impl Mailer for MailtrapMailer {
    async fn send_verification_email(&self, to: &str, code: &str) -> Result<(), GatewayError> {
        let html = format!(
            "<p>Welcome to CDYEATS. Use the code below to verify your email address.</p>\
             <h2>{code}</h2>\
             <p>The code expires in 24 hours.</p>"
        );
        self.send(to, "Verify your email", html, "Email Verification")
            .await
    }

    async fn send_welcome_email(&self, to: &str, name: &str) -> Result<(), GatewayError> {
        let html = format!(
            "<p>Hi {name},</p><p>Your email is verified. Enjoy ordering with CDYEATS!</p>"
        );
        self.send(to, "Welcome to CDYEATS", html, "Welcome").await
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        reset_url: &str,
    ) -> Result<(), GatewayError> {
        let html = format!(
            "<p>We received a request to reset your password.</p>\
             <p><a href=\"{reset_url}\">Reset your password</a></p>\
             <p>The link expires in 1 hour. If you did not ask for this, ignore this email.</p>"
        );
        self.send(to, "Reset your password", html, "Reset Password")
            .await
    }

    async fn send_reset_success_email(&self, to: &str) -> Result<(), GatewayError> {
        let html = "<p>Your password was reset successfully.</p>".to_string();
        self.send(to, "Reset password successfully", html, "Password Reset")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_request_serializes_single_recipient() {
        let body = SendRequest {
            from: Address {
                email: "no-reply@cdyeats.example".into(),
                name: Some("CDYEATS".into()),
            },
            to: vec![Address {
                email: "diner@example.com".into(),
                name: None,
            }],
            subject: "Verify your email".into(),
            html: "<h2>123456</h2>".into(),
            category: "Email Verification".into(),
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["to"][0]["email"], json!("diner@example.com"));
        assert!(value["to"][0].get("name").is_none());
        assert_eq!(value["category"], json!("Email Verification"));
    }
}
