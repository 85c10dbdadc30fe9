use async_trait::async_trait;
use std::fmt;

/// Failure to hand a message to the mail transport.
#[derive(Debug)]
pub struct MailError(pub String);

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Failed to send email: {}", self.0)
    }
}

impl std::error::Error for MailError {}

/// Delivers verification links to new users.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, email: &str, link: &str) -> Result<(), MailError>;
}

/// Builds the link the user follows to verify their address.
pub fn verification_link(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/verify-email?token={}",
        frontend_url.trim_end_matches('/'),
        token
    )
}

/// Writes verification links to the log instead of sending mail.
///
/// Used when no mail transport is configured, which is the case for local
/// development.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, email: &str, link: &str) -> Result<(), MailError> {
        log::info!("verification email for {}: {}", email, link);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_link() {
        assert_eq!(
            verification_link("http://localhost:5173/", "abc.def.ghi"),
            "http://localhost:5173/verify-email?token=abc.def.ghi"
        );
    }

    #[actix_rt::test]
    async fn test_log_mailer_never_fails() {
        let result = LogMailer
            .send_verification("a@x.com", "http://localhost/verify-email?token=t")
            .await;
        assert!(result.is_ok());
    }
}
