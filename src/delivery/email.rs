use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{
    appsettings::EmailSettings,
    models::{Channel, EmailPayload, Notification, Payload},
};

use super::{ChannelSender, SendError};

pub struct EmailSender {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSender {
    pub fn new(settings: &EmailSettings) -> anyhow::Result<Self> {
        let from = settings
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid sender address {:?}", settings.from))?;

        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            .with_context(|| format!("Invalid SMTP relay {:?}", settings.smtp_host))?
            .port(settings.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self::with_transport(from, mailer))
    }

    pub fn with_transport(from: Mailbox, mailer: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { from, mailer }
    }

    fn build_message(
        &self,
        notification: &Notification,
        email: &EmailPayload,
    ) -> Result<Message, SendError> {
        let to = notification
            .recipient
            .parse::<Mailbox>()
            .map_err(|_| SendError::InvalidRecipient(notification.recipient.clone()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        Ok(message)
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        let Payload::Email(email) = &notification.payload else {
            return Err(SendError::wrong_channel(Channel::Email, notification));
        };

        let message = self.build_message(notification, email)?;
        self.mailer.send(message).await?;

        log::info!(
            "E-mail notification {} sent. [from = {}, to = {}, subject = {:?}]",
            notification.id,
            self.from,
            notification.recipient,
            email.subject
        );

        Ok(())
    }
}
