pub mod appsettings;
pub mod delivery;
pub mod models;
pub mod scheduling;
pub mod service;
pub mod storage;
