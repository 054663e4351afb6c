//! External adapters module
//!
//! Audio playback, alarm coordination, desktop notifications, remote sound
//! search and key-value persistence.

pub mod alarm;
pub mod audio;
pub mod notification;
pub mod sound_search;
pub mod storage;

// Re-export main types
pub use alarm::{AlarmCoordinator, AlarmInfo, AlarmSession};
pub use audio::{AudioBackend, AudioError, CommandBackend, PlayTarget, Playback, PlaybackSource};
pub use notification::{DesktopNotifier, Notifier, NotifyError};
pub use sound_search::{SearchError, SoundHit, SoundSearch};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
