use chrono::{DateTime, Utc};
use thiserror::Error;

use super::notification::{Channel, EmailPayload, Payload, SmsPayload};

pub const SMS_MAX_CHARS: usize = 160;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipient {0:?} is not a valid e-mail address")]
    InvalidEmailRecipient(String),

    #[error("Recipient is required for {0} notifications")]
    MissingRecipient(Channel),

    #[error("E-mail subject is required")]
    EmptySubject,

    #[error("E-mail body is required")]
    EmptyBody,

    #[error("SMS text is required")]
    EmptyText,

    #[error("SMS text must be at most 160 characters, got {0}")]
    TextTooLong(usize),
}

/// Input of the creation path. The store assigns id, status and timestamps.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: String,
    pub payload: Payload,
    pub send_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn new(recipient: impl Into<String>, payload: Payload, send_at: DateTime<Utc>) -> Self {
        Self {
            recipient: recipient.into(),
            payload,
            send_at,
        }
    }

    pub fn channel(&self) -> Channel {
        self.payload.channel()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.payload {
            Payload::Email(EmailPayload { subject, body }) => {
                self.recipient
                    .parse::<lettre::Address>()
                    .map_err(|_| ValidationError::InvalidEmailRecipient(self.recipient.clone()))?;

                if subject.is_empty() {
                    return Err(ValidationError::EmptySubject);
                }
                if body.is_empty() {
                    return Err(ValidationError::EmptyBody);
                }
            }
            Payload::Sms(SmsPayload { text }) => {
                if self.recipient.trim().is_empty() {
                    return Err(ValidationError::MissingRecipient(Channel::Sms));
                }

                let chars = text.chars().count();
                if chars == 0 {
                    return Err(ValidationError::EmptyText);
                }
                if chars > SMS_MAX_CHARS {
                    return Err(ValidationError::TextTooLong(chars));
                }
            }
        }

        Ok(())
    }
}
