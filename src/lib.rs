//! Shelfmark Personal Media Library
//!
//! A self-hosted manager for books, comics, CDs, vinyl and films,
//! providing a REST JSON API for cataloging, external metadata lookup,
//! reading tracking and lending.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
