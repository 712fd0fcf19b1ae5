mod dispatcher;
mod scheduler;

#[cfg(test)]
mod tests;

pub use dispatcher::NotificationDispatcher;
pub use scheduler::{NotificationScheduler, SchedulerHandle, TickReport};
