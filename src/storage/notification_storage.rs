use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{NewNotification, Notification, NotificationId, NotificationStatus};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// 1-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

#[async_trait]
pub trait NotificationStorage: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn insert(&self, notification: NewNotification) -> Result<Notification, Self::Error>;
    async fn get(&self, id: NotificationId) -> Result<Option<Notification>, Self::Error>;
    async fn delete(&self, id: NotificationId) -> Result<Option<Notification>, Self::Error>;

    /// All notifications, oldest first.
    async fn list(&self, page: Page) -> Result<Vec<Notification>, Self::Error>;
    /// Pending notifications, newest first.
    async fn recently_created(&self, page: Page) -> Result<Vec<Notification>, Self::Error>;
    /// Sent notifications, newest first.
    async fn recently_sent(&self, page: Page) -> Result<Vec<Notification>, Self::Error>;

    /// Pending notifications with `send_at <= now`, in creation order.
    async fn fetch_due(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, Self::Error>;

    /// Fails when no notification with `id` exists.
    async fn update_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(Page::default().limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(Page::default().offset(), 0);

        let page = Page::new(0, 0);
        assert_eq!(page.limit(), 1);
        assert_eq!(page.offset(), 0);

        let page = Page::new(3, 1000);
        assert_eq!(page.limit(), MAX_PAGE_LIMIT);
        assert_eq!(page.offset(), 2 * MAX_PAGE_LIMIT);
    }
}
