//! Audio playback: backends, transient sound files and the built-in chime

use std::{
    f32::consts::PI,
    io::{self, Write},
    path::Path,
    process::Stdio,
    sync::Arc,
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::debug;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("invalid player command: {0:?}")]
    InvalidPlayer(String),

    #[error("failed to launch audio player")]
    Launch(#[source] io::Error),

    #[error("failed to prepare sound file")]
    Transient(#[source] io::Error),
}

/// Where a sound comes from before it is handed to a backend
#[derive(Debug, Clone)]
pub enum PlaybackSource {
    /// Built-in chime
    Chime,
    /// In-memory audio, written to a transient file while it plays
    Bytes { name: String, data: Arc<Vec<u8>> },
    /// Remote preview clip streamed by the player
    Url(String),
}

/// What a backend is asked to play
#[derive(Debug, Clone, Copy)]
pub enum PlayTarget<'a> {
    File(&'a Path),
    Url(&'a str),
}

/// A sound that is currently playing
pub trait Playback: Send {
    /// Stop immediately
    fn halt(&mut self);
    /// True once playback ended on its own or was halted
    fn is_finished(&mut self) -> bool;
}

/// Starts playbacks
pub trait AudioBackend: Send + Sync {
    fn start(&self, target: PlayTarget<'_>) -> Result<Box<dyn Playback>, AudioError>;
}

/// Backend that runs an external player command with the file path or URL
/// appended, e.g. `paplay` or `mpv --no-video`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(command_line: &str) -> Result<Self, AudioError> {
        let mut parts = shlex::split(command_line)
            .ok_or_else(|| AudioError::InvalidPlayer(command_line.to_string()))?;
        if parts.is_empty() {
            return Err(AudioError::InvalidPlayer(command_line.to_string()));
        }
        let program = parts.remove(0);
        Ok(Self { program, args: parts })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl AudioBackend for CommandBackend {
    fn start(&self, target: PlayTarget<'_>) -> Result<Box<dyn Playback>, AudioError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        match target {
            PlayTarget::File(path) => command.arg(path),
            PlayTarget::Url(url) => command.arg(url),
        };

        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(AudioError::Launch)?;

        debug!("Started {} for {:?}", self.program, target);
        Ok(Box::new(ChildPlayback { child }))
    }
}

struct ChildPlayback {
    child: Child,
}

impl Playback for ChildPlayback {
    fn halt(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!("Player already exited: {}", e);
        }
    }

    fn is_finished(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }
}

/// Write sound bytes to a temporary file that is deleted when dropped
pub fn write_transient(name: &str, data: &[u8]) -> Result<NamedTempFile, AudioError> {
    let suffix = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("timer-bell-")
        .suffix(&suffix)
        .tempfile()
        .map_err(AudioError::Transient)?;
    file.write_all(data).map_err(AudioError::Transient)?;
    file.flush().map_err(AudioError::Transient)?;
    Ok(file)
}

const CHIME_SAMPLE_RATE: u32 = 22_050;

/// Synthesise the built-in alarm: two decaying bell tones as a 16-bit mono WAV
pub fn chime_wav() -> Vec<u8> {
    let notes = [(880.0_f32, 0.45_f32), (660.0, 0.75)];
    let mut samples = Vec::new();
    for (freq, secs) in notes {
        let count = (CHIME_SAMPLE_RATE as f32 * secs) as usize;
        for n in 0..count {
            let t = n as f32 / CHIME_SAMPLE_RATE as f32;
            let envelope = (-4.0 * t / secs).exp();
            let value = (2.0 * PI * freq * t).sin() * envelope * 0.6;
            samples.push((value * i16::MAX as f32) as i16);
        }
    }

    let data_len = (samples.len() * 2) as u32;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&CHIME_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(CHIME_SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}
