//! Timer Bell - A local countdown-timer service
//!
//! This library provides a registry of independent countdown timers with
//! pause/resume/stop, a single alarm session played on completion, desktop
//! notifications, saved presets and remote sound search.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
