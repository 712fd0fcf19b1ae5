mod new_notification;
mod notification;

pub use new_notification::{NewNotification, SMS_MAX_CHARS, ValidationError};
pub use notification::{
    Channel, EmailPayload, Notification, NotificationId, NotificationStatus, Payload, SmsPayload,
    UnknownVariant,
};
