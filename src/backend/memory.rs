// src/backend/memory.rs

//! In-process package backend
//!
//! Holds a package index in memory and records commits instead of
//! touching the system. Used by tests and for planning without apt.

use super::{DependencyGroup, PackageBackend, PackageInfo};
use crate::error::{Error, Result};
use crate::progress::{CommitPhase, ProgressTracker};
use crate::version::compare_versions;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
struct MemoryPackage {
    info: PackageInfo,
    marked: bool,
}

/// Package backend backed by an in-memory index
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    packages: BTreeMap<String, MemoryPackage>,
    /// Names in the order they were marked
    marked_order: Vec<String>,
    cache_dir: PathBuf,
    commits: Vec<Vec<String>>,
}

impl MemoryBackend {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            packages: BTreeMap::new(),
            marked_order: Vec::new(),
            cache_dir: cache_dir.into(),
            commits: Vec::new(),
        }
    }

    /// Add a package that is installed at `version`
    pub fn with_installed(self, name: &str, version: &str) -> Self {
        self.with_package(name, version, true, Vec::new())
    }

    /// Add a package that is known at `version` but not installed
    pub fn with_available(self, name: &str, version: &str) -> Self {
        self.with_package(name, version, false, Vec::new())
    }

    /// Add or replace a package entry
    pub fn with_package(
        mut self,
        name: &str,
        version: &str,
        installed: bool,
        dependency_groups: Vec<DependencyGroup>,
    ) -> Self {
        self.packages.insert(
            name.to_string(),
            MemoryPackage {
                info: PackageInfo {
                    name: name.to_string(),
                    current_version: version.to_string(),
                    installed,
                    dependency_groups,
                },
                marked: false,
            },
        );
        self
    }

    /// Replace the dependency groups of an existing package
    pub fn with_dependencies(mut self, name: &str, groups: Vec<DependencyGroup>) -> Self {
        if let Some(pkg) = self.packages.get_mut(name) {
            pkg.info.dependency_groups = groups;
        }
        self
    }

    pub fn is_marked(&self, name: &str) -> bool {
        self.packages.get(name).is_some_and(|p| p.marked)
    }

    /// Package name lists passed to each `commit` call
    pub fn committed(&self) -> &[Vec<String>] {
        &self.commits
    }
}

impl PackageBackend for MemoryBackend {
    fn lookup(&self, name: &str) -> Result<PackageInfo> {
        self.packages
            .get(name)
            .map(|p| p.info.clone())
            .ok_or_else(|| Error::Lookup(name.to_string()))
    }

    fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    fn compare_versions(&self, a: &str, b: &str) -> Ordering {
        compare_versions(a, b)
    }

    fn mark_install(&mut self, name: &str) -> Result<()> {
        let pkg = self
            .packages
            .get_mut(name)
            .ok_or_else(|| Error::Lookup(name.to_string()))?;

        if !pkg.marked {
            pkg.marked = true;
            self.marked_order.push(name.to_string());
        }
        debug!("Marked {} for install", name);
        Ok(())
    }

    fn cache_dir(&self) -> Result<PathBuf> {
        Ok(self.cache_dir.clone())
    }

    fn pending_changes(&self) -> Vec<PackageInfo> {
        self.marked_order
            .iter()
            .filter_map(|name| self.packages.get(name))
            .filter(|p| p.marked)
            .map(|p| p.info.clone())
            .collect()
    }

    fn commit(&mut self, names: &[String], progress: &dyn ProgressTracker) -> Result<()> {
        let total = names.len() as u64;
        progress.begin_phase(CommitPhase::Install, total);

        for (i, name) in names.iter().enumerate() {
            let pkg = self
                .packages
                .get_mut(name)
                .ok_or_else(|| Error::Lookup(name.clone()))?;
            progress.set_message(&format!("Installing {}", name));
            pkg.info.installed = true;
            pkg.marked = false;
            progress.set_position(i as u64 + 1);
        }

        self.marked_order.retain(|n| !names.contains(n));
        self.commits.push(names.to_vec());
        progress.finish_with_message(&format!("Installed {} packages", total));
        Ok(())
    }
}
