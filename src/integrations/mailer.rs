use super::IntegrationError;
use async_trait::async_trait;
use tracing::{info, instrument};

/// Outgoing mail. Delivery itself (SMTP) lives outside this crate.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), IntegrationError>;
}

/// Mailer that only records the message in the logs
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    #[instrument(skip(self, body), fields(from = %self.sender))]
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), IntegrationError> {
        if to.is_empty() {
            return Err(IntegrationError::Mail("empty recipient".to_string()));
        }
        info!(%to, %subject, body_len = body.len(), "Mail queued");
        Ok(())
    }
}

/// Body of the verification mail, markdown like the rest of the frontend copy
pub fn verification_body(code: &str) -> String {
    format!(
        "## Welcome!\n\n\
         Head back to the website and enter the following code to continue:\n\n\
         ## {code}\n\n\
         If you did not request this code, please ignore this email.\n"
    )
}

pub fn email_update_body(code: &str) -> String {
    format!(
        "## You've requested to update your email.\n\n\
         Head back to the website and enter the following code to continue:\n\n\
         ## {code}\n\n\
         If you did not request this code, please ignore this email.\n"
    )
}

pub fn recovery_body(code: &str) -> String {
    format!(
        "## You've requested a password reset.\n\n\
         Head back to the website and enter the following code to continue:\n\n\
         ## {code}\n\n\
         If you did not request this code, please ignore this email.\n"
    )
}
