pub mod app;
pub mod auth;
pub mod config;
pub mod state;
pub mod storage;
