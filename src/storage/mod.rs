mod in_memory;
mod notification_storage;
pub mod sqlite;

pub use in_memory::{InMemoryNotificationStorage, InMemoryStorageError};
pub use notification_storage::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, NotificationStorage, Page};
pub use sqlite::{SqliteNotificationStorage, SqliteStorageError};
