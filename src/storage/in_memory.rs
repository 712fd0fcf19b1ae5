use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{NewNotification, Notification, NotificationId, NotificationStatus};

use super::notification_storage::{NotificationStorage, Page};

#[derive(Debug, Error)]
pub enum InMemoryStorageError {
    #[error("Notification {0} does not exist")]
    NotFound(NotificationId),
}

type Sequence = u64;

#[derive(Default)]
struct InMemoryStore {
    next_sequence: Sequence,
    storage: HashMap<NotificationId, (Sequence, Notification)>,
}

impl InMemoryStore {
    /// Matching notifications ordered by creation, oldest first.
    fn ordered(&self, filter: impl Fn(&Notification) -> bool) -> Vec<Notification> {
        let mut matching: Vec<_> = self
            .storage
            .values()
            .filter(|(_, notification)| filter(notification))
            .collect();
        matching.sort_by_key(|(sequence, notification)| (notification.created_at, *sequence));

        matching
            .into_iter()
            .map(|(_, notification)| notification.clone())
            .collect()
    }
}

fn paginate(notifications: impl Iterator<Item = Notification>, page: Page) -> Vec<Notification> {
    notifications
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[derive(Default)]
pub struct InMemoryNotificationStorage {
    store: RwLock<InMemoryStore>,
}

impl InMemoryNotificationStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStorage for InMemoryNotificationStorage {
    type Error = InMemoryStorageError;

    async fn insert(&self, notification: NewNotification) -> Result<Notification, Self::Error> {
        let mut store = self.store.write().await;
        let sequence = store.next_sequence;
        store.next_sequence += 1;

        let now = Utc::now();
        let NewNotification {
            recipient,
            payload,
            send_at,
        } = notification;
        let created = Notification {
            id: NotificationId::new_v4(),
            recipient,
            payload,
            send_at,
            status: NotificationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        store.storage.insert(created.id, (sequence, created.clone()));
        log::debug!("Stored notification {}", created.id);

        Ok(created)
    }

    async fn get(&self, id: NotificationId) -> Result<Option<Notification>, Self::Error> {
        let store = self.store.read().await;
        Ok(store.storage.get(&id).map(|(_, n)| n.clone()))
    }

    async fn delete(&self, id: NotificationId) -> Result<Option<Notification>, Self::Error> {
        let mut store = self.store.write().await;
        Ok(store.storage.remove(&id).map(|(_, n)| n))
    }

    async fn list(&self, page: Page) -> Result<Vec<Notification>, Self::Error> {
        let store = self.store.read().await;
        Ok(paginate(store.ordered(|_| true).into_iter(), page))
    }

    async fn recently_created(&self, page: Page) -> Result<Vec<Notification>, Self::Error> {
        let store = self.store.read().await;
        let pending = store.ordered(|n| n.status == NotificationStatus::Pending);
        Ok(paginate(pending.into_iter().rev(), page))
    }

    async fn recently_sent(&self, page: Page) -> Result<Vec<Notification>, Self::Error> {
        let store = self.store.read().await;
        let sent = store.ordered(|n| n.status == NotificationStatus::Sent);
        Ok(paginate(sent.into_iter().rev(), page))
    }

    async fn fetch_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, Self::Error> {
        let store = self.store.read().await;
        Ok(store.ordered(|n| n.is_due(now)))
    }

    async fn update_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> Result<(), Self::Error> {
        let mut store = self.store.write().await;
        let (_, notification) = store
            .storage
            .get_mut(&id)
            .ok_or(InMemoryStorageError::NotFound(id))?;

        notification.status = status;
        notification.updated_at = Utc::now();

        Ok(())
    }
}
