pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod search_config;
pub mod search_engine;
pub mod store;
