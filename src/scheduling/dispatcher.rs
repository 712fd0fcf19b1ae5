use std::{sync::Arc, time::Duration};

use anyhow::Context;
use thiserror::Error;

use crate::{
    delivery::{ChannelSender, SendError},
    models::{Channel, Notification, NotificationStatus},
    storage::NotificationStorage,
};

#[derive(Debug, Error)]
enum DeliveryError {
    #[error(transparent)]
    Send(#[from] SendError),

    #[error("Sending timed out after {0:?}")]
    TimedOut(Duration),
}

/// Makes a single delivery attempt for a notification and records the outcome.
///
/// There is no retry: a failed attempt is recorded as [`NotificationStatus::Failed`],
/// which is terminal. Only a failure to record the status is returned as an error.
pub struct NotificationDispatcher<S: NotificationStorage> {
    storage: Arc<S>,
    email_sender: Arc<dyn ChannelSender>,
    sms_sender: Arc<dyn ChannelSender>,
    send_timeout: Duration,
}

impl<S: NotificationStorage> NotificationDispatcher<S> {
    pub fn new(
        storage: Arc<S>,
        email_sender: Arc<dyn ChannelSender>,
        sms_sender: Arc<dyn ChannelSender>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            email_sender,
            sms_sender,
            send_timeout,
        }
    }

    pub async fn process(&self, notification: &Notification) -> anyhow::Result<NotificationStatus> {
        let id = notification.id;
        let status = match self.deliver(notification).await {
            Ok(()) => NotificationStatus::Sent,
            Err(error) => {
                log::warn!(
                    "Delivery of notification {} over {} failed: {}",
                    id,
                    notification.channel(),
                    error
                );
                NotificationStatus::Failed
            }
        };

        self.storage
            .update_status(id, status)
            .await
            .with_context(|| format!("Could not set status {status} for notification {id}"))?;

        log::info!("Notification {id} processed. [status = {status}]");

        Ok(status)
    }

    fn sender_for(&self, channel: Channel) -> &dyn ChannelSender {
        match channel {
            Channel::Email => self.email_sender.as_ref(),
            Channel::Sms => self.sms_sender.as_ref(),
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let sender = self.sender_for(notification.channel());

        tokio::time::timeout(self.send_timeout, sender.send(notification))
            .await
            .map_err(|_| DeliveryError::TimedOut(self.send_timeout))??;

        Ok(())
    }
}
