use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NotificationId = uuid::Uuid;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "EMAIL",
            Channel::Sms => "SMS",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMAIL" => Ok(Channel::Email),
            "SMS" => Ok(Channel::Sms),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

/// Delivery status. `Sent` and `Failed` are terminal: nothing in this crate moves
/// a notification out of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotificationStatus::Pending)
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(NotificationStatus::Pending),
            "SENT" => Ok(NotificationStatus::Sent),
            "FAILED" => Ok(NotificationStatus::Failed),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown variant {0:?}")]
pub struct UnknownVariant(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPayload {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsPayload {
    pub text: String,
}

/// Channel specific content. The variant decides the channel of the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "UPPERCASE")]
pub enum Payload {
    Email(EmailPayload),
    Sms(SmsPayload),
}

impl Payload {
    pub fn email(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Payload::Email(EmailPayload {
            subject: subject.into(),
            body: body.into(),
        })
    }

    pub fn sms(text: impl Into<String>) -> Self {
        Payload::Sms(SmsPayload { text: text.into() })
    }

    pub fn channel(&self) -> Channel {
        match self {
            Payload::Email(_) => Channel::Email,
            Payload::Sms(_) => Channel::Sms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: String,
    pub payload: Payload,
    pub send_at: DateTime<Utc>,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn channel(&self) -> Channel {
        self.payload.channel()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Pending && self.send_at <= now
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    use super::*;

    fn notification(send_at: DateTime<Utc>, status: NotificationStatus) -> Notification {
        Notification {
            id: NotificationId::new_v4(),
            recipient: "someone@example.com".to_owned(),
            payload: Payload::email("Subject", "Body"),
            send_at,
            status,
            created_at: send_at,
            updated_at: send_at,
        }
    }

    #[test]
    fn channel_follows_payload_variant() {
        assert_eq!(Payload::email("s", "b").channel(), Channel::Email);
        assert_eq!(Payload::sms("hello").channel(), Channel::Sms);
    }

    #[test]
    fn text_forms_parse_back() {
        for channel in [Channel::Email, Channel::Sms] {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
        for status in [
            NotificationStatus::Pending,
            NotificationStatus::Sent,
            NotificationStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<NotificationStatus>().unwrap(), status);
        }

        assert_eq!(
            "PUSH".parse::<Channel>(),
            Err(UnknownVariant("PUSH".to_owned()))
        );
    }

    #[test]
    fn payload_serializes_with_channel_tag() {
        let json = serde_json::to_value(Payload::sms("hi")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "channel": "SMS", "payload": { "text": "hi" } })
        );
    }

    #[test]
    fn only_pending_is_not_terminal() {
        assert!(!NotificationStatus::Pending.is_terminal());
        assert!(NotificationStatus::Sent.is_terminal());
        assert!(NotificationStatus::Failed.is_terminal());
    }

    proptest! {
        #[test]
        fn pending_is_due_once_send_at_has_passed(
            now in arb::<DateTime<Utc>>(),
            offset_secs in -86_400i64..86_400
        ) {
            let Some(send_at) = now.checked_add_signed(Duration::seconds(offset_secs)) else {
                return Ok(());
            };

            let pending = notification(send_at, NotificationStatus::Pending);
            prop_assert_eq!(pending.is_due(now), send_at <= now);

            let sent = notification(send_at, NotificationStatus::Sent);
            let failed = notification(send_at, NotificationStatus::Failed);
            prop_assert!(!sent.is_due(now));
            prop_assert!(!failed.is_due(now));
        }
    }
}
