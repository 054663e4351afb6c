//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    services::{
        notification::render_message, AlarmCoordinator, AlarmInfo, AudioBackend, KeyValueStore,
        Notifier, NotifyError, PlaybackSource, SearchError, SoundHit, SoundSearch,
    },
    utils::Clock,
};

use super::{
    BlobId, BlobRef, BlobStore, Completion, DefaultSound, Preset, PresetBook, PresetId, Settings,
    SoundSpec, TimerId, TimerRegistry, TimerView,
};

pub const NOTIFICATION_TITLE: &str = "Timer done";

/// External collaborators injected into the application state
pub struct Adapters {
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn Notifier>,
    pub audio: Arc<dyn AudioBackend>,
    pub sound_search: SoundSearch,
    pub clock: Arc<dyn Clock>,
}

/// Main application state: the countdown engine plus everything around it
pub struct AppState {
    registry: Mutex<TimerRegistry>,
    presets: Mutex<PresetBook>,
    settings: Mutex<Settings>,
    blobs: Mutex<BlobStore>,
    pub alarm: AlarmCoordinator,
    pub notifier: Arc<dyn Notifier>,
    pub sound_search: SoundSearch,
    pub clock: Arc<dyn Clock>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(port: u16, host: String, grace: Duration, adapters: Adapters) -> Self {
        Self {
            registry: Mutex::new(TimerRegistry::new(grace)),
            presets: Mutex::new(PresetBook::load(Arc::clone(&adapters.store))),
            settings: Mutex::new(Settings::load(adapters.store)),
            blobs: Mutex::new(BlobStore::new()),
            alarm: AlarmCoordinator::new(adapters.audio),
            notifier: adapters.notifier,
            sound_search: adapters.sound_search,
            clock: adapters.clock,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    // ---- timers ----

    /// Validate the sound choice and start a new countdown
    pub fn create_timer(
        &self,
        label: &str,
        total_seconds: u64,
        sound: SoundSpec,
    ) -> Result<TimerView, AppError> {
        let sound = self.resolve_sound_choice(sound)?;
        let uploaded = match &sound {
            SoundSpec::Uploaded { blob, .. } => Some(*blob),
            _ => None,
        };
        let now = self.clock.now();
        let mut registry = self.registry()?;
        let id = registry.create(label, total_seconds, sound, now)?;
        let view = registry.get(id)?.view();
        // Lock order is registry then blobs, as in `release_unused_sounds`
        if let Some(blob) = uploaded {
            self.blobs()?.claim(blob);
        }
        drop(registry);

        self.record_action("create");
        Ok(view)
    }

    pub fn list_timers(&self) -> Result<Vec<TimerView>, AppError> {
        Ok(self.registry()?.list())
    }

    pub fn get_timer(&self, id: TimerId) -> Result<TimerView, AppError> {
        Ok(self.registry()?.get(id)?.view())
    }

    pub fn pause_timer(&self, id: TimerId) -> Result<TimerView, AppError> {
        let now = self.clock.now();
        let mut registry = self.registry()?;
        registry.pause(id, now)?;
        let view = registry.get(id)?.view();
        drop(registry);
        self.record_action("pause");
        Ok(view)
    }

    pub fn resume_timer(&self, id: TimerId) -> Result<TimerView, AppError> {
        let now = self.clock.now();
        let mut registry = self.registry()?;
        registry.resume(id, now)?;
        let view = registry.get(id)?.view();
        drop(registry);
        self.record_action("resume");
        Ok(view)
    }

    pub fn toggle_timer(&self, id: TimerId) -> Result<TimerView, AppError> {
        let now = self.clock.now();
        let mut registry = self.registry()?;
        registry.toggle(id, now)?;
        let view = registry.get(id)?.view();
        drop(registry);
        self.record_action("toggle");
        Ok(view)
    }

    /// Stop a timer and silence any alarm it started
    pub fn stop_timer(&self, id: TimerId) -> Result<TimerView, AppError> {
        let view = self.registry()?.stop(id)?;

        if self.alarm.release_for(id)? {
            info!("Silenced alarm of stopped timer {}", id);
        }
        self.record_action("stop");
        Ok(view)
    }

    /// Advance every timer to the current instant and ring completed ones.
    /// Returns the number of timers that finished.
    pub fn advance(&self) -> Result<usize, AppError> {
        let now = self.clock.now();
        let completions = self.registry()?.tick(now);
        for completion in &completions {
            self.ring(completion);
        }
        self.alarm.reap()?;
        self.release_unused_sounds()?;
        Ok(completions.len())
    }

    /// Free uploaded sounds whose timers have all been swept
    fn release_unused_sounds(&self) -> Result<(), AppError> {
        let registry = self.registry()?;
        let released = self
            .blobs()?
            .release_unreferenced(&registry.referenced_blobs());
        if released > 0 {
            debug!("Released {} uploaded sounds", released);
        }
        Ok(())
    }

    // ---- alarms ----

    /// Notify and play the alarm for a finished timer. Failures only log.
    fn ring(&self, completion: &Completion) {
        let body = match self.settings() {
            Ok(settings) => {
                render_message(settings.effective_notification_message(), &completion.label)
            }
            Err(_) => render_message("", &completion.label),
        };
        match self.notifier.notify(NOTIFICATION_TITLE, &body) {
            Ok(()) => {}
            Err(NotifyError::PermissionDenied) => {
                debug!("Notification skipped for timer {}: permission not granted", completion.id)
            }
            Err(e) => warn!("Notification failed for timer {}: {}", completion.id, e),
        }

        let source = self.playback_source(&completion.sound);
        if let Err(e) = self
            .alarm
            .play(Some(completion.id), completion.sound.display_name(), source)
        {
            warn!("Alarm failed for timer {}: {}", completion.id, e);
        }
    }

    /// Map a sound choice to playable audio, falling back to the chime
    fn playback_source(&self, sound: &SoundSpec) -> PlaybackSource {
        match sound {
            SoundSpec::Default => PlaybackSource::Chime,
            SoundSpec::RemotePreview { url, .. } => PlaybackSource::Url(url.clone()),
            SoundSpec::Uploaded { blob, .. } => {
                let uploaded = self.blobs().ok().and_then(|b| b.get(*blob).cloned());
                match uploaded {
                    Some(sound) => PlaybackSource::Bytes {
                        name: sound.file_name(),
                        data: sound.data,
                    },
                    None => {
                        warn!("Uploaded sound {} is gone, playing the chime", blob);
                        PlaybackSource::Chime
                    }
                }
            }
            SoundSpec::SavedDefault { name } => {
                let data = self
                    .settings()
                    .ok()
                    .and_then(|s| s.default_sound().and_then(DefaultSound::decode));
                match data {
                    Some(data) => PlaybackSource::Bytes {
                        name: name.clone(),
                        data: Arc::new(data),
                    },
                    None => {
                        warn!("Saved default sound unavailable, playing the chime");
                        PlaybackSource::Chime
                    }
                }
            }
        }
    }

    /// Stop whatever alarm is playing
    pub fn silence_alarm(&self) -> Result<bool, AppError> {
        let silenced = self.alarm.silence()?;
        self.record_action("silence");
        Ok(silenced)
    }

    pub fn active_alarm(&self) -> Option<AlarmInfo> {
        self.alarm.active()
    }

    /// Audition a remote sound. The preview takes the alarm slot, so it
    /// replaces whatever is ringing and `silence_alarm` stops it.
    pub fn preview_sound(&self, name: &str, url: &str) -> Result<AlarmInfo, AppError> {
        let url = validate_preview_url(url)?;
        let name = match name.trim() {
            "" => "Preview",
            name => name,
        };
        self.alarm.play(None, name, PlaybackSource::Url(url))?;
        self.record_action("preview");
        Ok(AlarmInfo {
            timer_id: None,
            sound: name.to_string(),
        })
    }

    /// Check the requested sound and apply the saved default
    fn resolve_sound_choice(&self, sound: SoundSpec) -> Result<SoundSpec, AppError> {
        match sound {
            SoundSpec::Default | SoundSpec::SavedDefault { .. } => {
                Ok(match self.settings()?.default_sound() {
                    Some(saved) => SoundSpec::SavedDefault {
                        name: saved.name.clone(),
                    },
                    None => SoundSpec::Default,
                })
            }
            SoundSpec::Uploaded { blob, .. } => {
                let blobs = self.blobs()?;
                let uploaded = blobs.get(blob).ok_or(AppError::BlobNotFound(blob))?;
                Ok(SoundSpec::Uploaded {
                    name: uploaded.name.clone(),
                    blob,
                })
            }
            SoundSpec::RemotePreview { name, url } => Ok(SoundSpec::RemotePreview {
                name,
                url: validate_preview_url(&url)?,
            }),
        }
    }

    // ---- presets ----

    pub fn list_presets(&self) -> Result<Vec<Preset>, AppError> {
        Ok(self.presets()?.list().to_vec())
    }

    /// Save a timer's label, duration and sound as a preset
    pub fn save_preset(&self, timer_id: TimerId) -> Result<Preset, AppError> {
        let (label, total_seconds, sound) = {
            let registry = self.registry()?;
            let timer = registry.get(timer_id)?;
            (timer.label.clone(), timer.total_seconds, timer.sound.clone())
        };
        let preset = self.presets()?.add(&label, total_seconds, sound);
        self.record_action("save-preset");
        Ok(preset)
    }

    /// Start a new timer from a preset. The preset itself is not touched.
    pub fn start_preset(&self, preset_id: PresetId) -> Result<TimerView, AppError> {
        let preset = self.presets()?.get(preset_id)?.clone();
        info!("Starting saved timer {}", preset.summary());
        self.create_timer(&preset.label, preset.total_seconds, preset.sound)
    }

    pub fn delete_preset(&self, preset_id: PresetId) -> Result<(), AppError> {
        self.presets()?.delete(preset_id)?;
        self.record_action("delete-preset");
        Ok(())
    }

    pub fn clear_presets(&self) -> Result<usize, AppError> {
        let removed = self.presets()?.clear();
        self.record_action("clear-presets");
        Ok(removed)
    }

    // ---- sounds ----

    /// Keep an uploaded sound in memory for use by timers
    pub fn upload_sound(
        &self,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<BlobRef, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("sound name must not be empty".to_string()));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput("uploaded sound is empty".to_string()));
        }
        let blob_ref = self.blobs()?.insert(name, content_type, data);
        info!("Stored uploaded sound {} '{}' ({} bytes)", blob_ref.blob, name, blob_ref.size);
        Ok(blob_ref)
    }

    /// Forget an uploaded sound. Timers still using it fall back to the chime.
    pub fn remove_sound(&self, blob: BlobId) -> Result<(), AppError> {
        let removed = self.blobs()?.remove(blob).ok_or(AppError::BlobNotFound(blob))?;
        info!("Removed uploaded sound {} '{}'", blob, removed.name);
        self.record_action("remove-sound");
        Ok(())
    }

    pub async fn search_sounds(&self, query: &str) -> Result<Vec<SoundHit>, AppError> {
        match self.sound_search.search(query).await {
            Ok(hits) => Ok(hits),
            Err(SearchError::EmptyQuery) => {
                Err(AppError::InvalidInput(SearchError::EmptyQuery.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    // ---- settings ----

    pub fn default_sound(&self) -> Result<Option<DefaultSound>, AppError> {
        Ok(self.settings()?.default_sound().cloned())
    }

    pub fn set_default_sound(
        &self,
        name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<DefaultSound, AppError> {
        let saved = self.settings()?.set_default_sound(name, content_type, data)?.clone();
        self.record_action("set-default-sound");
        Ok(saved)
    }

    pub fn clear_default_sound(&self) -> Result<(), AppError> {
        self.settings()?.clear_default_sound()?;
        self.record_action("clear-default-sound");
        Ok(())
    }

    pub fn notification_message(&self) -> Result<String, AppError> {
        Ok(self.settings()?.notification_message().to_string())
    }

    pub fn set_notification_message(&self, message: &str) -> Result<(), AppError> {
        self.settings()?.set_notification_message(message)?;
        self.record_action("set-notification-message");
        Ok(())
    }

    pub fn set_notification_permission(&self, granted: bool) {
        self.notifier.set_permission(granted);
        self.record_action(if granted { "grant-notifications" } else { "deny-notifications" });
    }

    /// Send a sample notification so the user can check delivery
    pub fn test_notification(&self) -> Result<(), AppError> {
        match self
            .notifier
            .notify("Test Notification", "Your notifications are working!")
        {
            Ok(()) => Ok(()),
            Err(NotifyError::PermissionDenied) => Err(AppError::PermissionDenied),
            Err(e) => {
                warn!("Test notification failed: {}", e);
                Err(AppError::NotificationFailed(e.to_string()))
            }
        }
    }

    // ---- metadata ----

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    /// Count of timers currently counting down
    pub fn running_timers(&self) -> Result<usize, AppError> {
        Ok(self.registry()?.running_count())
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last) = self.last_action.lock() {
            *last = Some((action.to_string(), Utc::now()));
        }
    }

    fn registry(&self) -> Result<MutexGuard<'_, TimerRegistry>, AppError> {
        self.registry
            .lock()
            .map_err(|_| AppError::StatePoisoned("timer registry"))
    }

    fn presets(&self) -> Result<MutexGuard<'_, PresetBook>, AppError> {
        self.presets
            .lock()
            .map_err(|_| AppError::StatePoisoned("presets"))
    }

    fn settings(&self) -> Result<MutexGuard<'_, Settings>, AppError> {
        self.settings
            .lock()
            .map_err(|_| AppError::StatePoisoned("settings"))
    }

    fn blobs(&self) -> Result<MutexGuard<'_, BlobStore>, AppError> {
        self.blobs
            .lock()
            .map_err(|_| AppError::StatePoisoned("uploaded sounds"))
    }
}

fn validate_preview_url(url: &str) -> Result<String, AppError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(AppError::InvalidInput(format!("invalid preview url: {:?}", url)))
    }
}
