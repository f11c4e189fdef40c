// Away Days - social logging backend for football match-watching
// experiences.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;

// Re-exports for convenience
pub use app_state::AppState;
pub use error::{AppError, AppResult};
