pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod download;
pub mod entities;
pub mod error;
pub mod export;
pub mod inventory;
pub mod models;
pub mod permissions;
pub mod reports;
pub mod search;
pub mod stats;
pub mod storage;
pub mod ui;

pub use error::{AppError, Result};
