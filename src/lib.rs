pub mod analytics;
pub mod api;
pub mod auth;
pub mod blog;
pub mod config;
pub mod contact;
pub mod error;
pub mod models;
pub mod storage;
