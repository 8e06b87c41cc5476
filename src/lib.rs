pub mod config;
pub mod error;
pub mod identity;
pub mod guard;
pub mod navigation;
pub mod dashboard;
pub mod routes;
pub mod records;
pub mod data;
pub mod server;
