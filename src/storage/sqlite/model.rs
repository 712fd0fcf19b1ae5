use chrono::{DateTime, Utc};

use crate::models::{
    Channel, EmailPayload, Notification, NotificationId, NotificationStatus, Payload, SmsPayload,
};

use super::SqliteStorageError;

#[derive(sqlx::FromRow)]
pub struct NotificationStorageModel {
    pub id: String,
    pub recipient: String,
    pub channel: String,
    pub payload: String,
    pub send_at: i64,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<NotificationStorageModel> for Notification {
    type Error = SqliteStorageError;

    fn try_from(value: NotificationStorageModel) -> Result<Self, Self::Error> {
        let id = value
            .id
            .parse::<NotificationId>()
            .map_err(|e| SqliteStorageError::InvalidRecord(format!("id {:?}: {e}", value.id)))?;
        let channel = value
            .channel
            .parse::<Channel>()
            .map_err(|e| SqliteStorageError::InvalidRecord(format!("notification {id}: {e}")))?;
        let status = value
            .status
            .parse::<NotificationStatus>()
            .map_err(|e| SqliteStorageError::InvalidRecord(format!("notification {id}: {e}")))?;

        Ok(Self {
            id,
            recipient: value.recipient,
            payload: parse_payload(channel, &value.payload)?,
            send_at: from_millis(value.send_at)?,
            status,
            created_at: from_millis(value.created_at)?,
            updated_at: from_millis(value.updated_at)?,
        })
    }
}

pub fn payload_json(payload: &Payload) -> Result<String, SqliteStorageError> {
    let json = match payload {
        Payload::Email(email) => serde_json::to_string(email)?,
        Payload::Sms(sms) => serde_json::to_string(sms)?,
    };

    Ok(json)
}

fn parse_payload(channel: Channel, json: &str) -> Result<Payload, SqliteStorageError> {
    let payload = match channel {
        Channel::Email => Payload::Email(serde_json::from_str::<EmailPayload>(json)?),
        Channel::Sms => Payload::Sms(serde_json::from_str::<SmsPayload>(json)?),
    };

    Ok(payload)
}

pub fn to_millis(datetime: DateTime<Utc>) -> i64 {
    datetime.timestamp_millis()
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, SqliteStorageError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| SqliteStorageError::InvalidRecord(format!("timestamp {millis} out of range")))
}
