//! Saved timer presets

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::AppError,
    services::storage::{load_json, save_json, KeyValueStore, PRESETS_KEY},
    utils::format::{format_remaining, FormatStyle},
};

use super::SoundSpec;

pub type PresetId = u64;

/// A named timer configuration that survives restarts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: PresetId,
    pub label: String,
    pub total_seconds: u64,
    #[serde(default)]
    pub sound: SoundSpec,
}

impl Preset {
    /// List entry text, e.g. `Tea (00:04:00)`
    pub fn summary(&self) -> String {
        format!(
            "{} ({})",
            self.label,
            format_remaining(self.total_seconds, FormatStyle::Clock)
        )
    }
}

/// Presets, most recent first, mirrored to the key-value store
pub struct PresetBook {
    store: Arc<dyn KeyValueStore>,
    presets: Vec<Preset>,
    last_id: PresetId,
}

impl PresetBook {
    /// Load saved presets. Missing or malformed data gives an empty book.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let presets: Vec<Preset> = load_json::<Vec<Preset>>(store.as_ref(), PRESETS_KEY)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.label.trim().is_empty() && p.total_seconds > 0)
            .collect();
        let last_id = presets.iter().map(|p| p.id).max().unwrap_or(0);

        info!("Loaded {} presets", presets.len());
        Self {
            store,
            presets,
            last_id,
        }
    }

    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get(&self, id: PresetId) -> Result<&Preset, AppError> {
        self.presets
            .iter()
            .find(|p| p.id == id)
            .ok_or(AppError::PresetNotFound(id))
    }

    /// Save a configuration at the front of the list.
    ///
    /// Uploaded blobs only live in memory, so they are stored as the
    /// default sound.
    pub fn add(&mut self, label: &str, total_seconds: u64, sound: SoundSpec) -> Preset {
        let sound = match sound {
            SoundSpec::Uploaded { .. } => SoundSpec::Default,
            other => other,
        };
        let preset = Preset {
            id: self.next_id(),
            label: label.to_string(),
            total_seconds,
            sound,
        };

        self.presets.insert(0, preset.clone());
        self.persist();
        info!("Saved preset {} '{}'", preset.id, preset.label);
        preset
    }

    pub fn delete(&mut self, id: PresetId) -> Result<(), AppError> {
        let before = self.presets.len();
        self.presets.retain(|p| p.id != id);
        if self.presets.len() == before {
            return Err(AppError::PresetNotFound(id));
        }
        self.persist();
        info!("Removed preset {}", id);
        Ok(())
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.presets.len();
        self.presets.clear();
        self.persist();
        info!("Cleared {} presets", removed);
        removed
    }

    /// Millisecond timestamp, bumped so ids stay unique within a millisecond
    fn next_id(&mut self) -> PresetId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), PRESETS_KEY, &self.presets) {
            warn!("Presets kept in memory only: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;

    fn book() -> (Arc<MemoryStore>, PresetBook) {
        let store = Arc::new(MemoryStore::new());
        let book = PresetBook::load(store.clone());
        (store, book)
    }

    #[test]
    fn new_presets_go_first_with_unique_ids() {
        let (_, mut book) = book();
        let a = book.add("Tea", 240, SoundSpec::Default);
        let b = book.add("Pasta", 480, SoundSpec::Default);
        assert_ne!(a.id, b.id);
        assert_eq!(book.list()[0].label, "Pasta");
        assert_eq!(book.list()[1].label, "Tea");
    }

    #[test]
    fn presets_survive_reload() {
        let (store, mut book) = book();
        let sound = SoundSpec::RemotePreview {
            name: "Bell".into(),
            url: "https://cdn.test/bell.mp3".into(),
        };
        let saved = book.add("Tea", 240, sound);

        let reloaded = PresetBook::load(store);
        assert_eq!(reloaded.get(saved.id).unwrap(), &saved);
    }

    #[test]
    fn uploaded_sound_is_saved_as_default() {
        let (_, mut book) = book();
        let preset = book.add("Tea", 60, SoundSpec::Uploaded { name: "ding.wav".into(), blob: 4 });
        assert_eq!(preset.sound, SoundSpec::Default);
    }

    #[test]
    fn delete_and_clear() {
        let (store, mut book) = book();
        let a = book.add("Tea", 60, SoundSpec::Default);
        book.add("Eggs", 420, SoundSpec::Default);

        book.delete(a.id).unwrap();
        assert!(matches!(book.delete(a.id), Err(AppError::PresetNotFound(_))));
        assert_eq!(book.list().len(), 1);

        assert_eq!(book.clear(), 1);
        assert!(PresetBook::load(store).list().is_empty());
    }

    #[test]
    fn malformed_storage_gives_empty_book() {
        let store = Arc::new(MemoryStore::new());
        store.set(PRESETS_KEY, "[{\"oops\": true}]").unwrap();
        assert!(PresetBook::load(store).list().is_empty());
    }

    #[test]
    fn legacy_entries_without_sound_default() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(PRESETS_KEY, r#"[{"id": 5, "label": "Tea", "total_seconds": 60}]"#)
            .unwrap();
        let book = PresetBook::load(store);
        assert_eq!(book.get(5).unwrap().sound, SoundSpec::Default);
        assert_eq!(book.get(5).unwrap().summary(), "Tea (00:01:00)");
    }
}
