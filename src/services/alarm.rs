//! Alarm coordination: at most one alarm plays at a time

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{error::AppError, state::TimerId};

use super::audio::{chime_wav, write_transient, AudioBackend, PlayTarget, Playback, PlaybackSource};

/// The alarm currently sounding
pub struct AlarmSession {
    timer_id: Option<TimerId>,
    sound_name: String,
    playback: Box<dyn Playback>,
    /// Backing file for in-memory sounds, deleted on release
    transient: Option<NamedTempFile>,
}

impl AlarmSession {
    /// Halt playback and free the transient file
    pub fn release(mut self) {
        self.playback.halt();
        if let Some(file) = self.transient.take() {
            let path = file.path().display().to_string();
            if let Err(e) = file.close() {
                debug!("Failed to remove transient sound {}: {}", path, e);
            }
        }
        debug!("Released alarm '{}'", self.sound_name);
    }
}

/// Summary of the active alarm for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmInfo {
    pub timer_id: Option<TimerId>,
    pub sound: String,
}

/// Owns the single alarm session
pub struct AlarmCoordinator {
    backend: Arc<dyn AudioBackend>,
    current: Mutex<Option<AlarmSession>>,
}

impl AlarmCoordinator {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            current: Mutex::new(None),
        }
    }

    /// Start an alarm, releasing the previous one first
    pub fn play(
        &self,
        timer_id: Option<TimerId>,
        sound_name: &str,
        source: PlaybackSource,
    ) -> Result<(), AppError> {
        let mut current = self.lock()?;
        if let Some(previous) = current.take() {
            previous.release();
        }

        let (playback, transient) = match source {
            PlaybackSource::Url(url) => (self.backend.start(PlayTarget::Url(&url))?, None),
            PlaybackSource::Chime => self.start_file("chime.wav", &chime_wav())?,
            PlaybackSource::Bytes { name, data } => self.start_file(&name, &data)?,
        };
        info!("Playing alarm '{}' for timer {:?}", sound_name, timer_id);
        *current = Some(AlarmSession {
            timer_id,
            sound_name: sound_name.to_string(),
            playback,
            transient,
        });
        Ok(())
    }

    /// Release the alarm if it belongs to `timer_id`
    pub fn release_for(&self, timer_id: TimerId) -> Result<bool, AppError> {
        let mut current = self.lock()?;
        if current.as_ref().and_then(|s| s.timer_id) != Some(timer_id) {
            return Ok(false);
        }
        if let Some(session) = current.take() {
            session.release();
        }
        Ok(true)
    }

    /// Release whatever alarm is playing
    pub fn silence(&self) -> Result<bool, AppError> {
        match self.lock()?.take() {
            Some(session) => {
                info!("Silenced alarm '{}'", session.sound_name);
                session.release();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Release a session whose playback ended on its own
    pub fn reap(&self) -> Result<bool, AppError> {
        let mut current = self.lock()?;
        let ended = current
            .as_mut()
            .map(|s| s.playback.is_finished())
            .unwrap_or(false);
        if ended {
            if let Some(session) = current.take() {
                session.release();
            }
        }
        Ok(ended)
    }

    fn start_file(
        &self,
        name: &str,
        data: &[u8],
    ) -> Result<(Box<dyn Playback>, Option<NamedTempFile>), AppError> {
        let file = write_transient(name, data)?;
        let playback = self.backend.start(PlayTarget::File(file.path()))?;
        Ok((playback, Some(file)))
    }

    pub fn active(&self) -> Option<AlarmInfo> {
        let current = self.current.lock().ok()?;
        current.as_ref().map(|s| AlarmInfo {
            timer_id: s.timer_id,
            sound: s.sound_name.clone(),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<AlarmSession>>, AppError> {
        self.current
            .lock()
            .map_err(|_| AppError::StatePoisoned("alarm session"))
    }
}
