//! User settings: saved default sound and notification message

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::AppError,
    services::{
        notification::DEFAULT_MESSAGE_TEMPLATE,
        storage::{load_json, save_json, KeyValueStore, DEFAULT_SOUND_KEY, NOTIFICATION_MSG_KEY},
    },
};

/// Largest default sound accepted, before base64 encoding
pub const MAX_DEFAULT_SOUND_BYTES: usize = 1536 * 1024;

/// Uploaded sound saved as the default alarm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSound {
    pub name: String,
    /// `data:<mime>;base64,<payload>`
    pub data: String,
    #[serde(rename = "type", default = "upload_kind")]
    pub kind: String,
}

fn upload_kind() -> String {
    "upload".to_string()
}

impl DefaultSound {
    pub fn from_bytes(name: &str, content_type: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            data: format!("data:{};base64,{}", content_type, STANDARD.encode(bytes)),
            kind: upload_kind(),
        }
    }

    /// Decode the data URL payload
    pub fn decode(&self) -> Option<Vec<u8>> {
        let (_, payload) = self.data.split_once(";base64,")?;
        STANDARD.decode(payload).ok()
    }
}

/// Settings mirrored to the key-value store
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
    default_sound: Option<DefaultSound>,
    notification_message: String,
}

impl Settings {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let default_sound = load_json::<DefaultSound>(store.as_ref(), DEFAULT_SOUND_KEY)
            .filter(|s| s.kind == "upload");
        let notification_message = match store.get(NOTIFICATION_MSG_KEY) {
            Ok(message) => message.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load notification message: {}", e);
                String::new()
            }
        };

        Self {
            store,
            default_sound,
            notification_message,
        }
    }

    pub fn default_sound(&self) -> Option<&DefaultSound> {
        self.default_sound.as_ref()
    }

    /// Save an uploaded file as the default alarm sound
    pub fn set_default_sound(
        &mut self,
        name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<&DefaultSound, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("sound name must not be empty".to_string()));
        }
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("please select a file first".to_string()));
        }
        if bytes.len() > MAX_DEFAULT_SOUND_BYTES {
            return Err(AppError::InvalidInput(
                "file too large, please use a file under 1.5MB".to_string(),
            ));
        }

        let sound = DefaultSound::from_bytes(name, content_type, bytes);
        save_json(self.store.as_ref(), DEFAULT_SOUND_KEY, &sound)?;
        info!("Saved default sound '{}' ({} bytes)", name, bytes.len());
        Ok(self.default_sound.insert(sound))
    }

    pub fn clear_default_sound(&mut self) -> Result<(), AppError> {
        self.store.remove(DEFAULT_SOUND_KEY)?;
        self.default_sound = None;
        info!("Cleared default sound");
        Ok(())
    }

    /// Template as saved; empty means the built-in message
    pub fn notification_message(&self) -> &str {
        &self.notification_message
    }

    pub fn effective_notification_message(&self) -> &str {
        if self.notification_message.is_empty() {
            DEFAULT_MESSAGE_TEMPLATE
        } else {
            &self.notification_message
        }
    }

    pub fn set_notification_message(&mut self, message: &str) -> Result<(), AppError> {
        let message = message.trim();
        self.store.set(NOTIFICATION_MSG_KEY, message)?;
        self.notification_message = message.to_string();
        info!("Saved notification message template");
        Ok(())
    }
}
