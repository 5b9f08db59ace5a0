// src/commands/progress.rs
//! Terminal progress for the install transaction
//!
//! One bar per commit phase, with the current apt status line as its
//! message.

use indicatif::{ProgressBar, ProgressStyle};
use onbundle::{CommitPhase, ProgressTracker};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

/// indicatif-backed `ProgressTracker`
pub struct CliProgress {
    bar: ProgressBar,
    operation: String,
    phase: AtomicU8,
    finished: AtomicBool,
}

impl CliProgress {
    pub fn new(operation: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(operation.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            operation: operation.to_string(),
            phase: AtomicU8::new(0),
            finished: AtomicBool::new(false),
        }
    }
}

impl ProgressTracker for CliProgress {
    fn begin_phase(&self, phase: CommitPhase, length: u64) {
        self.phase.store(
            match phase {
                CommitPhase::Fetch => 0,
                CommitPhase::Install => 1,
            },
            Ordering::Relaxed,
        );

        let label = match phase {
            CommitPhase::Fetch => "Fetching",
            CommitPhase::Install => "Installing",
        };
        let template = format!("{} {{msg}} ({{pos}}/{{len}}) [{{bar:40.green/dim}}] {{percent}}%", label);
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            self.bar.set_style(style.progress_chars("##-"));
        }
        self.bar.set_length(length);
        self.bar.set_position(0);
    }

    fn phase(&self) -> CommitPhase {
        match self.phase.load(Ordering::Relaxed) {
            0 => CommitPhase::Fetch,
            _ => CommitPhase::Install,
        }
    }

    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn set_position(&self, position: u64) {
        let length = self.bar.length().unwrap_or(position);
        self.bar.set_position(position.min(length));
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn finish_with_message(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        self.bar
            .finish_with_message(format!("{}: {}", self.operation, message));
    }

    fn finish_with_error(&self, message: &str) {
        self.finished.store(true, Ordering::Relaxed);
        self.bar
            .abandon_with_message(format!("{}: FAILED: {}", self.operation, message));
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}
