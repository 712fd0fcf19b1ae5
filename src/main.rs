use std::sync::Arc;

use anyhow::Context;
use herald::{
    appsettings::AppSettings,
    delivery::{ChannelSender, EmailSender, SmsSender},
    scheduling::{NotificationDispatcher, NotificationScheduler},
    storage::{self, InMemoryNotificationStorage, NotificationStorage, SqliteNotificationStorage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load().context("Could not load appsettings")?;

    let email_sender: Arc<dyn ChannelSender> = Arc::new(EmailSender::new(&settings.email)?);
    let sms_sender: Arc<dyn ChannelSender> = Arc::new(SmsSender::new(&settings.sms));

    match &settings.database.url {
        Some(url) => {
            let pool = storage::sqlite::connect(url)
                .await
                .with_context(|| format!("Could not open database {url}"))?;
            let storage = Arc::new(SqliteNotificationStorage::new(pool));
            run(storage, email_sender, sms_sender, &settings).await
        }
        None => {
            log::warn!("No database configured, notifications are kept in memory");
            let storage = Arc::new(InMemoryNotificationStorage::new());
            run(storage, email_sender, sms_sender, &settings).await
        }
    }
}

async fn run<S: NotificationStorage>(
    storage: Arc<S>,
    email_sender: Arc<dyn ChannelSender>,
    sms_sender: Arc<dyn ChannelSender>,
    settings: &AppSettings,
) -> anyhow::Result<()> {
    let dispatcher = Arc::new(NotificationDispatcher::new(
        storage.clone(),
        email_sender,
        sms_sender,
        settings.scheduler.send_timeout(),
    ));
    let scheduler = NotificationScheduler::new(storage, dispatcher, settings.scheduler.interval());

    let handle = scheduler.start()?;

    tokio::signal::ctrl_c()
        .await
        .context("Could not listen for shutdown signal")?;
    log::info!("Shutdown requested");

    handle.shutdown().await
}
