// src/lib.rs

//! onbundle: installer for `.on` package bundles
//!
//! A bundle wraps one or more Debian packages together with a metadata
//! file and an MD5 manifest. Installing one runs a fixed pipeline on top
//! of the system package manager:
//!
//! 1. `bundle::extract` unpacks the archive and checks its identity
//! 2. `bundle::check_sums` verifies the payload against the manifest
//! 3. `reconcile::check_version` compares versions with the backend
//! 4. `install::mark_install` marks the main package and stages bundled
//!    dependencies into the backend's cache
//! 5. `install::commit_install` runs the backend transaction
//!
//! The package manager itself sits behind `backend::PackageBackend`;
//! `AptBackend` drives apt/dpkg and `MemoryBackend` keeps everything in
//! process.

pub mod backend;
pub mod bundle;
pub mod config;
mod error;
pub mod install;
pub mod progress;
pub mod reconcile;
pub mod version;

pub use backend::{AptBackend, DependencyGroup, MemoryBackend, PackageBackend, PackageInfo};
pub use bundle::{
    check_sums, extract, extract_to, is_valid, read_metadata, BundleBuilder, BundlePath,
    ChecksumReport, ExtractedTree, TagSection,
};
pub use config::Config;
pub use error::{Error, Result};
pub use install::{commit_install, mark_install, CandidateRole, InstallCandidate, InstallPlan};
pub use progress::{
    CallbackProgress, CommitPhase, LogProgress, ProgressEvent, ProgressTracker, SilentProgress,
};
pub use reconcile::{check_version, check_version_all, VersionCheck, VersionVerdict};
pub use version::{compare_versions, DebVersion};
