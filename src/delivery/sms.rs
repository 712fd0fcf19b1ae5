use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    appsettings::SmsSettings,
    models::{Channel, Notification, Payload},
};

use super::{ChannelSender, SendError};

#[derive(Deserialize)]
struct MessageCreated {
    sid: String,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

/// Sends text messages through the Twilio Messages API.
pub struct SmsSender {
    client: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl SmsSender {
    pub fn new(settings: &SmsSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    pub fn with_client(settings: &SmsSettings, client: reqwest::Client) -> Self {
        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            settings.api_base.trim_end_matches('/'),
            settings.account_sid
        );

        Self {
            client,
            messages_url,
            account_sid: settings.account_sid.clone(),
            auth_token: settings.auth_token.clone(),
            from_number: settings.from_number.clone(),
        }
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        let Payload::Sms(sms) = &notification.payload else {
            return Err(SendError::wrong_channel(Channel::Sms, notification));
        };

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", notification.recipient.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", sms.text.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|error| error.message)
                .unwrap_or(body);

            return Err(SendError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let created: MessageCreated = response.json().await?;
        log::info!(
            "SMS notification {} sent. [to = {}, message_sid = {}]",
            notification.id,
            notification.recipient,
            created.sid
        );

        Ok(())
    }
}
