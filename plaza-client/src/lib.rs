pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod feed;
pub mod format;
pub mod forms;
pub mod mutation;
pub mod session;
pub mod views;
