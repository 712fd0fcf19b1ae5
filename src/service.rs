use std::sync::Arc;

use thiserror::Error;

use crate::{
    models::{NewNotification, Notification, NotificationId, ValidationError},
    storage::{NotificationStorage, Page},
};

#[derive(Debug, Error)]
pub enum ServiceError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Notification {0} not found")]
    NotFound(NotificationId),

    #[error(transparent)]
    Storage(E),
}

type ServiceResult<T, S> = Result<T, ServiceError<<S as NotificationStorage>::Error>>;

/// Creation and lookup path for notifications. Dispatch happens elsewhere, once
/// a notification becomes due.
pub struct NotificationService<S: NotificationStorage> {
    storage: Arc<S>,
}

impl<S: NotificationStorage> NotificationService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, notification: NewNotification) -> ServiceResult<Notification, S> {
        notification.validate()?;

        let created = self
            .storage
            .insert(notification)
            .await
            .map_err(ServiceError::Storage)?;

        log::info!(
            "Created {} notification {} due at {}",
            created.channel(),
            created.id,
            created.send_at
        );

        Ok(created)
    }

    pub async fn find_by_id(&self, id: NotificationId) -> ServiceResult<Notification, S> {
        self.storage
            .get(id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn delete_by_id(&self, id: NotificationId) -> ServiceResult<Notification, S> {
        let deleted = self
            .storage
            .delete(id)
            .await
            .map_err(ServiceError::Storage)?
            .ok_or(ServiceError::NotFound(id))?;

        log::info!("Deleted notification {id}");

        Ok(deleted)
    }

    pub async fn list(&self, page: Page) -> ServiceResult<Vec<Notification>, S> {
        self.storage.list(page).await.map_err(ServiceError::Storage)
    }

    pub async fn recently_created(&self, page: Page) -> ServiceResult<Vec<Notification>, S> {
        self.storage
            .recently_created(page)
            .await
            .map_err(ServiceError::Storage)
    }

    pub async fn recently_sent(&self, page: Page) -> ServiceResult<Vec<Notification>, S> {
        self.storage
            .recently_sent(page)
            .await
            .map_err(ServiceError::Storage)
    }
}
