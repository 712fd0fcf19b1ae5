mod email;
mod sms;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Channel, Notification, NotificationId};

pub use email::EmailSender;
pub use sms::SmsSender;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("{expected} sender was given {actual} notification {id}")]
    WrongChannel {
        expected: Channel,
        actual: Channel,
        id: NotificationId,
    },

    #[error("Invalid recipient {0:?}")]
    InvalidRecipient(String),

    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Could not build e-mail: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the message with status {status}: {message}")]
    Provider { status: u16, message: String },
}

impl SendError {
    pub(crate) fn wrong_channel(expected: Channel, notification: &Notification) -> Self {
        SendError::WrongChannel {
            expected,
            actual: notification.channel(),
            id: notification.id,
        }
    }
}

/// Delivers a notification over one channel. Implementations reject notifications
/// of any other channel with [`SendError::WrongChannel`].
#[async_trait]
pub trait ChannelSender: Send + Sync + 'static {
    async fn send(&self, notification: &Notification) -> Result<(), SendError>;
}
