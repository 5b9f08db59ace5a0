// src/progress.rs

//! Progress reporting for the install transaction
//!
//! `commit_install` takes any `ProgressTracker`, so the same entry point
//! serves text, graphical, and silent callers. A commit runs through two
//! phases: fetching package files, then installing them. Each phase
//! reports a position out of a known length (percent for apt).
//!
//! Implementations here:
//! - `SilentProgress`: no output, keeps counters (scripts, tests)
//! - `LogProgress`: reports through tracing
//! - `CallbackProgress`: forwards `ProgressEvent`s to a closure
//!
//! The command-line front end adds an indicatif bar on top of the trait.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use tracing::info;

/// Stage of a backend commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    /// Downloading package files not already in the cache
    Fetch,
    /// Unpacking and configuring packages
    Install,
}

impl CommitPhase {
    fn to_u8(self) -> u8 {
        match self {
            Self::Fetch => 0,
            Self::Install => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Fetch,
            _ => Self::Install,
        }
    }
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Install => write!(f, "install"),
        }
    }
}

/// Core trait for progress tracking
///
/// Implementations must be thread-safe; backends may report from a reader
/// thread.
pub trait ProgressTracker: Send + Sync {
    /// Start a phase with the given total; resets the position to zero
    fn begin_phase(&self, phase: CommitPhase, length: u64);

    /// Current phase (the last one begun)
    fn phase(&self) -> CommitPhase;

    /// Set the current status message
    fn set_message(&self, message: &str);

    /// Set progress to a specific position within the phase
    fn set_position(&self, position: u64);

    fn position(&self) -> u64;

    fn length(&self) -> u64;

    /// Finish progress successfully with a message
    fn finish_with_message(&self, message: &str);

    /// Finish progress with an error message
    fn finish_with_error(&self, message: &str);

    fn is_finished(&self) -> bool;
}

/// Counters shared by the implementations below
#[derive(Debug, Default)]
struct ProgressState {
    phase: AtomicU8,
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl ProgressState {
    fn begin(&self, phase: CommitPhase, length: u64) {
        self.phase.store(phase.to_u8(), Ordering::Relaxed);
        self.length.store(length, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
    }

    fn phase(&self) -> CommitPhase {
        CommitPhase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    /// Store a position clamped to the length; returns the previous one
    fn set_position(&self, position: u64) -> u64 {
        let length = self.length.load(Ordering::Relaxed);
        let position = if length > 0 { position.min(length) } else { position };
        self.position.swap(position, Ordering::Relaxed)
    }
}

/// Silent progress tracker (no-op)
#[derive(Debug, Default)]
pub struct SilentProgress {
    state: ProgressState,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressTracker for SilentProgress {
    fn begin_phase(&self, phase: CommitPhase, length: u64) {
        self.state.begin(phase, length);
    }

    fn phase(&self) -> CommitPhase {
        self.state.phase()
    }

    fn set_message(&self, _message: &str) {}

    fn set_position(&self, position: u64) {
        self.state.set_position(position);
    }

    fn position(&self) -> u64 {
        self.state.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.state.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, _message: &str) {
        self.state.finished.store(true, Ordering::Relaxed);
    }

    fn finish_with_error(&self, _message: &str) {
        self.state.finished.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Relaxed)
    }
}

/// Logging progress tracker
///
/// Logs at info level, about ten position lines per phase.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    state: ProgressState,
}

impl LogProgress {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ProgressState::default(),
        }
    }
}

impl ProgressTracker for LogProgress {
    fn begin_phase(&self, phase: CommitPhase, length: u64) {
        self.state.begin(phase, length);
        info!("{}: {} started", self.name, phase);
    }

    fn phase(&self) -> CommitPhase {
        self.state.phase()
    }

    fn set_message(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }

    fn set_position(&self, position: u64) {
        let old = self.state.set_position(position);
        let new = self.position();
        let length = self.length();

        let interval = std::cmp::max(1, length / 10);
        if length > 0 && new / interval > old / interval {
            info!(
                "{} [{}]: {}% ({}/{})",
                self.name,
                self.phase(),
                (new * 100) / length,
                new,
                length
            );
        }
    }

    fn position(&self) -> u64 {
        self.state.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.state.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, message: &str) {
        self.state.finished.store(true, Ordering::Relaxed);
        info!("{}: {}", self.name, message);
    }

    fn finish_with_error(&self, message: &str) {
        self.state.finished.store(true, Ordering::Relaxed);
        info!("{}: ERROR - {}", self.name, message);
    }

    fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Relaxed)
    }
}

/// Events emitted by `CallbackProgress`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase { phase: CommitPhase, total: u64 },
    Message(String),
    Position { current: u64, total: u64 },
    Finished(String),
    Error(String),
}

/// Callback-based progress tracker, for GUI or custom front ends
pub struct CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    callback: F,
    state: ProgressState,
}

impl<F> CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            state: ProgressState::default(),
        }
    }
}

impl<F> ProgressTracker for CallbackProgress<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn begin_phase(&self, phase: CommitPhase, length: u64) {
        self.state.begin(phase, length);
        (self.callback)(ProgressEvent::Phase {
            phase,
            total: length,
        });
    }

    fn phase(&self) -> CommitPhase {
        self.state.phase()
    }

    fn set_message(&self, message: &str) {
        (self.callback)(ProgressEvent::Message(message.to_string()));
    }

    fn set_position(&self, position: u64) {
        self.state.set_position(position);
        (self.callback)(ProgressEvent::Position {
            current: self.position(),
            total: self.length(),
        });
    }

    fn position(&self) -> u64 {
        self.state.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.state.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, message: &str) {
        self.state.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Finished(message.to_string()));
    }

    fn finish_with_error(&self, message: &str) {
        self.state.finished.store(true, Ordering::Relaxed);
        (self.callback)(ProgressEvent::Error(message.to_string()));
    }

    fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Relaxed)
    }
}
