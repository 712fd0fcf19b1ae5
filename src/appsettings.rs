use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_send_timeout_secs() -> u64 {
    30
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs.max(1))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DatabaseSettings {
    /// SQLite url. Notifications are kept in memory when unset.
    pub url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Deserialize, Debug, Clone)]
pub struct SmsSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    #[serde(default = "default_sms_api_base")]
    pub api_base: String,
}

fn default_sms_api_base() -> String {
    "https://api.twilio.com".to_owned()
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub email: EmailSettings,
    pub sms: SmsSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
