// Library for tests to access modules

pub mod config;
pub mod dispatch;
pub mod models;
pub mod protocol;
pub mod quality;
pub mod ring;
pub mod routes;
pub mod stores;
pub mod transport;
pub mod version;
pub mod worker;
