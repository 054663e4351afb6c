//! Uploaded sounds held in memory until the timers using them are gone

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
    sync::Arc,
};

use serde::Serialize;

use super::BlobId;

#[derive(Debug, Clone)]
pub struct UploadedSound {
    pub name: String,
    pub content_type: String,
    pub data: Arc<Vec<u8>>,
    /// Set once a timer has used the sound
    claimed: bool,
}

impl UploadedSound {
    /// Name for the transient playback file. Players sniff the format from
    /// the extension, so one is derived from the content type when missing.
    pub fn file_name(&self) -> String {
        if Path::new(&self.name).extension().is_some() {
            return self.name.clone();
        }
        let mime = self.content_type.split(';').next().unwrap_or("").trim();
        let ext = match mime {
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
            "audio/ogg" => "ogg",
            "audio/webm" => "webm",
            "audio/flac" | "audio/x-flac" => "flac",
            "audio/mp4" | "audio/aac" | "audio/x-m4a" => "m4a",
            _ => return self.name.clone(),
        };
        format!("{}.{}", self.name, ext)
    }
}

/// Reference handed back to the client after an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobRef {
    pub blob: BlobId,
    pub name: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct BlobStore {
    sounds: HashMap<BlobId, UploadedSound>,
    next_id: BlobId,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, content_type: &str, data: Vec<u8>) -> BlobRef {
        self.next_id += 1;
        let id = self.next_id;
        let blob_ref = BlobRef {
            blob: id,
            name: name.to_string(),
            size: data.len(),
        };
        self.sounds.insert(
            id,
            UploadedSound {
                name: name.to_string(),
                content_type: content_type.to_string(),
                data: Arc::new(data),
                claimed: false,
            },
        );
        blob_ref
    }

    pub fn get(&self, id: BlobId) -> Option<&UploadedSound> {
        self.sounds.get(&id)
    }

    /// Mark a sound as used by a timer, making it eligible for release
    pub fn claim(&mut self, id: BlobId) {
        if let Some(sound) = self.sounds.get_mut(&id) {
            sound.claimed = true;
        }
    }

    pub fn remove(&mut self, id: BlobId) -> Option<UploadedSound> {
        self.sounds.remove(&id)
    }

    /// Drop claimed sounds no live timer refers to. Unclaimed uploads stay
    /// until a timer uses them or they are deleted.
    pub fn release_unreferenced(&mut self, referenced: &BTreeSet<BlobId>) -> usize {
        let before = self.sounds.len();
        self.sounds
            .retain(|id, sound| !sound.claimed || referenced.contains(id));
        before - self.sounds.len()
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}
