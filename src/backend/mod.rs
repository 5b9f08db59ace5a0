// src/backend/mod.rs

//! The package backend consumed by the install pipeline
//!
//! The backend owns the package index, version ordering, install intent,
//! the archive cache directory, and the commit transaction. It is always
//! passed in explicitly; nothing here holds global state.

pub mod apt;
pub mod memory;

pub use apt::AptBackend;
pub use memory::MemoryBackend;

use crate::error::Result;
use crate::progress::ProgressTracker;
use std::cmp::Ordering;
use std::path::PathBuf;

/// Alternative package names, any one of which satisfies a dependency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGroup {
    pub alternatives: Vec<String>,
}

impl DependencyGroup {
    pub fn new<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alternatives: alternatives.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.alternatives.iter().any(|a| a == name)
    }
}

/// Backend view of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    /// Version the backend currently knows for this name
    pub current_version: String,
    pub installed: bool,
    /// Dependency groups of the candidate version, in declaration order
    pub dependency_groups: Vec<DependencyGroup>,
}

/// Package manager operations used by the pipeline
pub trait PackageBackend {
    /// Look up a package; unknown names fail with `Error::Lookup`
    fn lookup(&self, name: &str) -> Result<PackageInfo>;

    /// Whether the name is present in the active package index
    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Order two version strings under the backend's versioning rules
    fn compare_versions(&self, a: &str, b: &str) -> Ordering;

    /// Record the intent to install a package
    fn mark_install(&mut self, name: &str) -> Result<()>;

    /// Directory the backend reads package files from before fetching
    fn cache_dir(&self) -> Result<PathBuf>;

    /// Every package currently marked for a change
    fn pending_changes(&self) -> Vec<PackageInfo>;

    /// Fetch and install the named packages
    fn commit(&mut self, names: &[String], progress: &dyn ProgressTracker) -> Result<()>;
}

/// Parse a `Depends:` style field into dependency groups
///
/// `a (>= 1.0) | b, c:any` becomes `[[a, b], [c]]`.
pub fn parse_dependency_field(field: &str) -> Vec<DependencyGroup> {
    field
        .split(',')
        .map(|group| {
            DependencyGroup::new(group.split('|').filter_map(|alt| {
                let name = alt.split_whitespace().next()?;
                let name = name.split('(').next().unwrap_or(name);
                let name = name.split(':').next().unwrap_or(name);
                (!name.is_empty()).then(|| name.to_string())
            }))
        })
        .filter(|group| !group.alternatives.is_empty())
        .collect()
}
