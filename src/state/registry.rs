//! Timer registry: owns every live countdown and advances them together

use std::{
    collections::{BTreeMap, BTreeSet},
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::error::AppError;

use super::{BlobId, SoundSpec, Timer, TimerId, TimerStatus, TimerView};

/// Longest accepted countdown: 366 days
pub const MAX_TIMER_SECONDS: u64 = 366 * 24 * 60 * 60;

/// How long a swept timer still answers `stop` with its final state
pub const RETIRED_TTL: Duration = Duration::from_secs(60);

/// Emitted once when a timer reaches zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: TimerId,
    pub label: String,
    pub sound: SoundSpec,
}

/// Set of independent countdowns sharing one clock
#[derive(Debug)]
pub struct TimerRegistry {
    timers: BTreeMap<TimerId, Timer>,
    /// Final snapshots of swept timers, keyed by id, with the sweep time
    retired: BTreeMap<TimerId, (TimerView, Instant)>,
    next_id: TimerId,
    /// How long a finished timer stays visible before removal
    grace: Duration,
}

impl TimerRegistry {
    pub fn new(grace: Duration) -> Self {
        Self {
            timers: BTreeMap::new(),
            retired: BTreeMap::new(),
            next_id: 1,
            grace,
        }
    }

    /// Register a new running timer
    pub fn create(
        &mut self,
        label: &str,
        total_seconds: u64,
        sound: SoundSpec,
        now: Instant,
    ) -> Result<TimerId, AppError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(AppError::InvalidInput("timer label must not be empty".to_string()));
        }
        if total_seconds == 0 {
            return Err(AppError::InvalidInput(
                "timer duration must be at least one second".to_string(),
            ));
        }
        if total_seconds > MAX_TIMER_SECONDS {
            return Err(AppError::InvalidInput(format!(
                "timer duration must not exceed {} seconds",
                MAX_TIMER_SECONDS
            )));
        }

        let id = self.next_id;
        let timer = Timer::start(id, label.to_string(), total_seconds, sound, now).ok_or_else(
            || AppError::InvalidInput("timer duration is out of range".to_string()),
        )?;
        self.next_id += 1;
        self.timers.insert(id, timer);

        info!("Created timer {} '{}' for {}s", id, label, total_seconds);
        Ok(id)
    }

    /// Advance every running timer to `now` and sweep expired ones.
    ///
    /// Each timer yields at most one completion over its lifetime.
    pub fn tick(&mut self, now: Instant) -> Vec<Completion> {
        let mut completions = Vec::new();
        for timer in self.timers.values_mut() {
            if timer.advance(now) {
                info!("Timer {} '{}' finished", timer.id, timer.label);
                completions.push(Completion {
                    id: timer.id,
                    label: timer.label.clone(),
                    sound: timer.sound.clone(),
                });
            }
        }

        let grace = self.grace;
        let expired: Vec<TimerId> = self
            .timers
            .values()
            .filter(|timer| timer.is_expired(now, grace))
            .map(|timer| timer.id)
            .collect();
        for id in &expired {
            if let Some(timer) = self.timers.remove(id) {
                self.retired.insert(*id, (timer.view(), now));
            }
        }
        if !expired.is_empty() {
            debug!("Swept {} timers from the registry", expired.len());
        }
        self.retired
            .retain(|_, (_, at)| now.saturating_duration_since(*at) < RETIRED_TTL);

        completions
    }

    /// Running -> Paused. Other states are left alone.
    pub fn pause(&mut self, id: TimerId, now: Instant) -> Result<TimerStatus, AppError> {
        let timer = self.timer_mut(id)?;
        if timer.pause(now) {
            info!("Paused timer {} with {}s left", id, timer.remaining_seconds);
        } else {
            debug!("Ignoring pause for timer {} in state {:?}", id, timer.status);
        }
        Ok(timer.status)
    }

    /// Paused -> Running. Other states are left alone.
    pub fn resume(&mut self, id: TimerId, now: Instant) -> Result<TimerStatus, AppError> {
        let timer = self.timer_mut(id)?;
        if timer.resume(now) {
            info!("Resumed timer {} with {}s left", id, timer.remaining_seconds);
        } else {
            debug!("Ignoring resume for timer {} in state {:?}", id, timer.status);
        }
        Ok(timer.status)
    }

    /// Pause a running timer or resume a paused one
    pub fn toggle(&mut self, id: TimerId, now: Instant) -> Result<TimerStatus, AppError> {
        let status = self.get(id)?.status;
        match status {
            TimerStatus::Paused => self.resume(id, now),
            _ => self.pause(id, now),
        }
    }

    /// Running/Paused -> Stopped. Repeated calls return the same final
    /// snapshot, also for a while after the timer has been swept.
    pub fn stop(&mut self, id: TimerId) -> Result<TimerView, AppError> {
        if let Some((view, _)) = self.retired.get(&id) {
            debug!("Timer {} already swept as {:?}", id, view.status);
            return Ok(view.clone());
        }
        let timer = self.timer_mut(id)?;
        if timer.stop() {
            info!("Stopped timer {} '{}'", id, timer.label);
        }
        Ok(timer.view())
    }

    pub fn get(&self, id: TimerId) -> Result<&Timer, AppError> {
        self.timers.get(&id).ok_or(AppError::TimerNotFound(id))
    }

    /// Snapshots in creation order
    pub fn list(&self) -> Vec<TimerView> {
        self.timers.values().map(Timer::view).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Uploaded sounds still referenced by a live timer
    pub fn referenced_blobs(&self) -> BTreeSet<BlobId> {
        self.timers
            .values()
            .filter_map(|t| match t.sound {
                SoundSpec::Uploaded { blob, .. } => Some(blob),
                _ => None,
            })
            .collect()
    }

    /// Number of timers currently counting down
    pub fn running_count(&self) -> usize {
        self.timers
            .values()
            .filter(|t| t.status == TimerStatus::Running)
            .count()
    }

    fn timer_mut(&mut self, id: TimerId) -> Result<&mut Timer, AppError> {
        self.timers.get_mut(&id).ok_or(AppError::TimerNotFound(id))
    }
}
