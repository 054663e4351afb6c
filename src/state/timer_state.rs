//! Timer structure and its countdown lifecycle

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::format::{format_remaining, FormatStyle};

pub type TimerId = u64;
pub type BlobId = u64;

/// Lifecycle of a single countdown. `Finished` and `Stopped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Running,
    Paused,
    Finished,
    Stopped,
}

impl TimerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerStatus::Finished | TimerStatus::Stopped)
    }
}

/// Audio source played when a timer completes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoundSpec {
    /// Built-in chime
    #[default]
    Default,
    /// A sound uploaded for this timer, held in memory until the process exits
    Uploaded { name: String, blob: BlobId },
    /// A preview clip picked from the sound search
    RemotePreview { name: String, url: String },
    /// The default sound saved in settings
    SavedDefault { name: String },
}

impl SoundSpec {
    /// Human readable name shown next to the timer
    pub fn display_name(&self) -> &str {
        match self {
            SoundSpec::Default => "Default",
            SoundSpec::Uploaded { name, .. }
            | SoundSpec::RemotePreview { name, .. }
            | SoundSpec::SavedDefault { name } => name,
        }
    }
}

/// One running countdown.
///
/// Remaining time is derived from a deadline rather than decremented, so a
/// late or skipped tick never makes the timer drift.
#[derive(Debug, Clone)]
pub struct Timer {
    pub id: TimerId,
    pub label: String,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub status: TimerStatus,
    pub sound: SoundSpec,
    pub created_at: DateTime<Utc>,
    deadline: Option<Instant>,
    /// Exact remaining time while paused
    banked: Duration,
    finished_at: Option<Instant>,
}

impl Timer {
    pub(crate) fn start(
        id: TimerId,
        label: String,
        total_seconds: u64,
        sound: SoundSpec,
        now: Instant,
    ) -> Option<Self> {
        let total = Duration::from_secs(total_seconds);
        let deadline = now.checked_add(total)?;
        Some(Self {
            id,
            label,
            total_seconds,
            remaining_seconds: total_seconds,
            status: TimerStatus::Running,
            sound,
            created_at: Utc::now(),
            deadline: Some(deadline),
            banked: total,
            finished_at: None,
        })
    }

    /// Exact time left at `now`
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match (self.status, self.deadline) {
            (TimerStatus::Running, Some(deadline)) => deadline.saturating_duration_since(now),
            (TimerStatus::Paused, _) => self.banked,
            _ => Duration::ZERO,
        }
    }

    /// Recompute the remaining time. Returns true only on the tick that
    /// moves the timer into `Finished`.
    pub(crate) fn advance(&mut self, now: Instant) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }

        let remaining = self.remaining_at(now);
        self.remaining_seconds = ceil_secs(remaining);
        if remaining.is_zero() {
            self.status = TimerStatus::Finished;
            self.deadline = None;
            self.finished_at = Some(now);
            return true;
        }
        false
    }

    pub(crate) fn pause(&mut self, now: Instant) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        let remaining = self.remaining_at(now);
        // An elapsed deadline is left for the next tick to finish.
        if remaining.is_zero() {
            return false;
        }
        self.banked = remaining;
        self.remaining_seconds = ceil_secs(remaining);
        self.deadline = None;
        self.status = TimerStatus::Paused;
        true
    }

    pub(crate) fn resume(&mut self, now: Instant) -> bool {
        if self.status != TimerStatus::Paused {
            return false;
        }
        let Some(deadline) = now.checked_add(self.banked) else {
            return false;
        };
        self.deadline = Some(deadline);
        self.status = TimerStatus::Running;
        true
    }

    pub(crate) fn stop(&mut self) -> bool {
        match self.status {
            TimerStatus::Running | TimerStatus::Paused => {
                self.status = TimerStatus::Stopped;
                self.deadline = None;
                true
            }
            TimerStatus::Finished | TimerStatus::Stopped => false,
        }
    }

    /// Whether the timer can be dropped from the registry
    pub(crate) fn is_expired(&self, now: Instant, grace: Duration) -> bool {
        match (self.status, self.finished_at) {
            (TimerStatus::Stopped, _) => true,
            (TimerStatus::Finished, Some(at)) => now.saturating_duration_since(at) >= grace,
            _ => false,
        }
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            id: self.id,
            label: self.label.clone(),
            total_seconds: self.total_seconds,
            remaining_seconds: self.remaining_seconds,
            remaining: match self.status {
                TimerStatus::Finished => "Done!".to_string(),
                _ => format_remaining(self.remaining_seconds, FormatStyle::Clock),
            },
            status: self.status,
            sound: self.sound.clone(),
            created_at: self.created_at,
        }
    }
}

/// Serializable snapshot of a timer for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    pub id: TimerId,
    pub label: String,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub remaining: String,
    pub status: TimerStatus,
    pub sound: SoundSpec,
    pub created_at: DateTime<Utc>,
}

/// Whole seconds, rounded up
pub fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
