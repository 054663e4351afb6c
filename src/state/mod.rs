//! State management module
//!
//! This module contains the countdown engine, presets, settings and the
//! application state that ties them to the adapters.

pub mod app_state;
pub mod preset;
pub mod registry;
pub mod settings;
pub mod sounds;
pub mod timer_state;

// Re-export main types
pub use app_state::{Adapters, AppState};
pub use preset::{Preset, PresetBook, PresetId};
pub use registry::{Completion, TimerRegistry, MAX_TIMER_SECONDS};
pub use settings::{DefaultSound, Settings};
pub use sounds::{BlobRef, BlobStore};
pub use timer_state::{BlobId, SoundSpec, Timer, TimerId, TimerStatus, TimerView};
