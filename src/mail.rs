//! Outbound mail channel used for password-reset OTPs.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::MailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, otp: u32) -> anyhow::Result<()>;
}

pub const OTP_SUBJECT: &str = "Reset Password OTP";

pub fn otp_body(otp: u32) -> String {
    format!("Your OTP to reset password is: {otp}")
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(host: &str, config: &MailConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_otp(&self, to: &str, otp: u32) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(OTP_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(otp_body(otp))?;
        self.transport.send(message).await?;
        info!("otp mail sent");
        Ok(())
    }
}

/// Stand-in when no SMTP host is configured; every send fails.
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send_otp(&self, _to: &str, _otp: u32) -> anyhow::Result<()> {
        error!("mail transport is not configured (SMTP_HOST unset)");
        anyhow::bail!("mail transport is not configured")
    }
}

/// Builds the mailer from config; falls back to `UnconfiguredMailer`.
pub fn from_config(config: &MailConfig) -> anyhow::Result<Box<dyn Mailer>> {
    match &config.smtp_host {
        Some(host) => Ok(Box::new(SmtpMailer::new(host, config)?)),
        None => {
            tracing::warn!("SMTP_HOST not set; password reset mails will fail");
            Ok(Box::new(UnconfiguredMailer))
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every OTP instead of sending it. `fail` makes every send error.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, u32)>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_otp(&self, to: &str, otp: u32) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("smtp connection refused");
            }
            self.sent.lock().unwrap().push((to.to_string(), otp));
            Ok(())
        }
    }
}
