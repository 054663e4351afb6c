//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use timer_bell::{
    services::{
        AudioBackend, AudioError, KeyValueStore, MemoryStore, Notifier, NotifyError, PlayTarget,
        Playback, SoundSearch,
    },
    state::{Adapters, AppState},
    utils::ManualClock,
};

/// Notifier that records every delivered notification
#[derive(Default)]
pub struct RecordingNotifier {
    granted: AtomicBool,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn granted() -> Self {
        let notifier = Self::default();
        notifier.granted.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn set_permission(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        if !self.permission_granted() {
            return Err(NotifyError::PermissionDenied);
        }
        self.sent.lock().unwrap().push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// What the recording backend was asked to play
#[derive(Debug, Clone)]
pub struct Played {
    pub target: String,
    /// Contents of the transient file at start time
    pub bytes: Option<Vec<u8>>,
    pub halted: Arc<AtomicBool>,
}

impl Played {
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RecordingBackend {
    pub played: Mutex<Vec<Played>>,
}

impl RecordingBackend {
    pub fn played(&self) -> Vec<Played> {
        self.played.lock().unwrap().clone()
    }
}

struct RecordedPlayback {
    halted: Arc<AtomicBool>,
}

impl Playback for RecordedPlayback {
    fn halt(&mut self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    fn is_finished(&mut self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }
}

impl AudioBackend for RecordingBackend {
    fn start(&self, target: PlayTarget<'_>) -> Result<Box<dyn Playback>, AudioError> {
        let (target, bytes) = match target {
            PlayTarget::File(path) => (path.display().to_string(), std::fs::read(path).ok()),
            PlayTarget::Url(url) => (url.to_string(), None),
        };
        let halted = Arc::new(AtomicBool::new(false));
        self.played.lock().unwrap().push(Played {
            target,
            bytes,
            halted: halted.clone(),
        });
        Ok(Box::new(RecordedPlayback { halted }))
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub audio: Arc<RecordingBackend>,
    pub store: Arc<dyn KeyValueStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        let clock = Arc::new(ManualClock::new());
        let notifier = Arc::new(RecordingNotifier::granted());
        let audio = Arc::new(RecordingBackend::default());
        let adapters = Adapters {
            store: Arc::clone(&store),
            notifier: notifier.clone(),
            audio: audio.clone(),
            sound_search: SoundSearch::new(None),
            clock: clock.clone(),
        };
        let state = Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            Duration::from_millis(800),
            adapters,
        ));
        Self {
            state,
            clock,
            notifier,
            audio,
            store,
        }
    }

    /// Move the clock one second and run one tick; returns completions
    pub fn tick(&self) -> usize {
        self.clock.advance_secs(1);
        self.state.advance().unwrap()
    }

    pub fn ticks(&self, n: u64) -> usize {
        (0..n).map(|_| self.tick()).sum()
    }
}
