// src/install.rs

//! Install planning: marking bundle packages and committing them
//!
//! `mark_install` records intent in the backend and stages bundled
//! dependency files into the backend's archive cache so the commit can
//! use them without fetching. `commit_install` then hands the pending set
//! to the backend in a single transaction.

use crate::backend::PackageBackend;
use crate::bundle::{file_name_prefix, split_package_name, BundlePath, ExtractedTree};
use crate::error::{Error, Result};
use crate::progress::ProgressTracker;
use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Why a candidate is in the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRole {
    /// The package the bundle is named after
    Main,
    /// A bundled dependency of the main package
    Dependency,
}

/// A package resolved for installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCandidate {
    pub name: String,
    pub version: String,
    /// Local payload file backing this candidate, if the bundle has one
    pub package_file: Option<PathBuf>,
    pub role: CandidateRole,
}

impl fmt::Display for InstallCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.version)
    }
}

/// Ordered list of install candidates, main package first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    candidates: Vec<InstallCandidate>,
}

impl InstallPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: InstallCandidate) {
        self.candidates.push(candidate);
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstallCandidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.candidates.iter().any(|c| c.name == name)
    }

    /// Package names in plan order
    pub fn names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a InstallPlan {
    type Item = &'a InstallCandidate;
    type IntoIter = std::slice::Iter<'a, InstallCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Copy a package file into the archive cache
///
/// The destination must not exist yet; an existing file fails with
/// `Error::CopyConflict` and is left untouched.
pub fn stage_package_file(file: &Path, cache_dir: &Path) -> Result<PathBuf> {
    let file_name = file
        .file_name()
        .ok_or_else(|| Error::InvalidName(file.display().to_string()))?;
    let dest = cache_dir.join(file_name);

    let mut output = match OpenOptions::new().write(true).create_new(true).open(&dest) {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::CopyConflict(dest.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut input = fs::File::open(file)?;
    io::copy(&mut input, &mut output)?;
    debug!("Staged {} into {}", file.display(), cache_dir.display());
    Ok(dest)
}

/// Mark the bundle's main package and its bundled dependencies
///
/// The main package is marked when the backend reports it not installed
/// or installed at a version older than the bundle's; its payload file
/// stays in the tree. Each dependency group of the main package is walked
/// candidate by candidate; every matching payload file whose package is
/// not installed is marked and copied into the backend's cache directory.
/// A file reached through several groups is handled once per call. Copy
/// conflicts abort the call, leaving earlier marks and copies in place.
pub fn mark_install<B>(backend: &mut B, main: &BundlePath, tree: &ExtractedTree) -> Result<InstallPlan>
where
    B: PackageBackend + ?Sized,
{
    let main_name = main.package_name()?;
    let main_version = main.package_version()?;
    let main_info = backend.lookup(&main_name)?;
    let payload = tree.payload_files()?;

    let mut plan = InstallPlan::new();

    let upgrade = main_info.installed
        && backend.compare_versions(&main_info.current_version, &main_version) == Ordering::Less;

    if main_info.installed && !upgrade {
        debug!("{} is already installed", main_name);
    } else {
        backend.mark_install(&main_name)?;
        let package_file = payload
            .iter()
            .find(|f| file_name_prefix(&f.file_name) == main_name)
            .map(|f| f.path.clone());
        plan.push(InstallCandidate {
            name: main_name.clone(),
            version: main_version,
            package_file,
            role: CandidateRole::Main,
        });
    }

    let cache_dir = backend.cache_dir()?;
    let mut visited: Vec<&str> = Vec::new();

    for group in &main_info.dependency_groups {
        for candidate in &group.alternatives {
            for file in payload
                .iter()
                .filter(|f| file_name_prefix(&f.file_name) == candidate.as_str())
            {
                if visited.contains(&file.file_name.as_str()) {
                    debug!("{} already handled in this call", file.file_name);
                    continue;
                }
                visited.push(&file.file_name);

                let stem = file.stem();
                let (name, version) = split_package_name(&stem)?;
                if name == main_name {
                    continue;
                }

                let info = backend.lookup(name)?;
                if info.installed {
                    debug!("{} is already installed", name);
                    continue;
                }

                backend.mark_install(name)?;
                stage_package_file(&file.path, &cache_dir)?;
                plan.push(InstallCandidate {
                    name: name.to_string(),
                    version: version.to_string(),
                    package_file: Some(file.path.clone()),
                    role: CandidateRole::Dependency,
                });
            }
        }
    }

    info!(
        "Planned {} package(s) from {}",
        plan.len(),
        main.bundle_name()
    );
    Ok(plan)
}

/// Commit every pending change the backend still recognizes
pub fn commit_install<B>(backend: &mut B, plan: &InstallPlan, progress: &dyn ProgressTracker) -> Result<()>
where
    B: PackageBackend + ?Sized,
{
    let names: Vec<String> = backend
        .pending_changes()
        .into_iter()
        .filter(|pkg| backend.contains(&pkg.name))
        .map(|pkg| pkg.name)
        .collect();

    for candidate in plan {
        if !names.contains(&candidate.name) {
            warn!("{} is not pending in the backend", candidate);
        }
    }

    if names.is_empty() {
        info!("Nothing to install");
        progress.finish_with_message("Nothing to install");
        return Ok(());
    }

    info!("Committing {}", names.join(", "));
    backend.commit(&names, progress)
}
