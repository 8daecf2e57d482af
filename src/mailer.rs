use async_trait::async_trait;
use thiserror::Error;

use crate::entity::users::UserRole;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery is not configured")]
    NotConfigured,
}

/// Credentials mail sent to provisioned restaurant accounts.
#[derive(Debug, Clone)]
pub struct WelcomeEmail {
    pub to: String,
    pub name: String,
    pub role: UserRole,
    pub temporary_password: String,
    pub login_url: String,
    pub restaurant_name: Option<String>,
}

impl WelcomeEmail {
    pub fn subject(&self) -> &'static str {
        "Welcome to BiteDrop - Your Account Details"
    }

    pub fn body(&self) -> String {
        let mut body = format!(
            "Hello {},\n\nAn account with the role {} has been created for you",
            self.name,
            self.role.as_str()
        );
        if let Some(restaurant) = &self.restaurant_name {
            body.push_str(&format!(" at {restaurant}"));
        }
        body.push_str(&format!(
            ".\n\nEmail: {}\nTemporary password: {}\n\nSign in at {} and choose a new password.\n",
            self.to, self.temporary_password, self.login_url
        ));
        body
    }
}

/// Outbound mail collaborator. Failures are reported, never retried.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), MailError>;
}

/// Mailer that hands messages to the log. Without a sender address it
/// reports `NotConfigured`, mirroring a mail backend with no credentials.
#[derive(Debug, Clone, Default)]
pub struct TracingMailer {
    from: Option<String>,
}

impl TracingMailer {
    pub fn new(from: Option<String>) -> Self {
        Self { from }
    }
}

#[async_trait]
impl Mailer for TracingMailer {
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), MailError> {
        let from = self.from.as_deref().ok_or(MailError::NotConfigured)?;
        tracing::info!(
            from,
            to = %email.to,
            subject = email.subject(),
            "welcome email dispatched"
        );
        tracing::debug!(to = %email.to, body = %email.body(), "welcome email body");
        Ok(())
    }
}
