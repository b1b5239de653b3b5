//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles commands, menu buttons and state-driven text/photo messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and button labels

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

use std::path::PathBuf;

use crate::db::Repository;
use crate::search::GoogleSearch;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::{command_handler, message_handler, Command};

/// Everything the handlers share, injected through the dispatcher.
pub struct AppState {
    pub repo: Repository,
    pub http: reqwest::Client,
    pub search: GoogleSearch,
    /// Directory for per-user photo scans (`<photos_dir>/<user_id>.jpg`).
    pub photos_dir: PathBuf,
}
