// src/reconcile.rs

//! Version reconciliation between a bundle and the package backend

use crate::backend::PackageBackend;
use crate::bundle::{file_name_prefix, split_package_name, BundlePath, ExtractedTree};
use crate::error::Result;
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// How a declared version relates to the one the backend knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionVerdict {
    /// The bundle carries a later version
    Newer,
    /// The bundle carries an earlier version
    Older,
    Same,
}

impl fmt::Display for VersionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Newer => write!(f, "newer"),
            Self::Older => write!(f, "older"),
            Self::Same => write!(f, "same"),
        }
    }
}

/// Verdict for one bundle or payload name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    pub bundle_name: String,
    pub verdict: VersionVerdict,
}

impl fmt::Display for VersionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.bundle_name, self.verdict)
    }
}

/// Compare the version encoded in `bundle_name` against the backend
///
/// `bundle_name` is `<name>_<version>[_...]` without an extension.
/// Unknown package names fail with `Error::Lookup`.
pub fn check_version<B>(backend: &B, bundle_name: &str) -> Result<VersionCheck>
where
    B: PackageBackend + ?Sized,
{
    let (name, declared) = split_package_name(bundle_name)?;
    let known = backend.lookup(name)?.current_version;

    let verdict = match backend.compare_versions(&known, declared) {
        Ordering::Less => VersionVerdict::Newer,
        Ordering::Greater => VersionVerdict::Older,
        Ordering::Equal => VersionVerdict::Same,
    };

    debug!("{}: backend has {}, bundle has {} ({})", name, known, declared, verdict);
    Ok(VersionCheck {
        bundle_name: bundle_name.to_string(),
        verdict,
    })
}

/// Check every payload file reachable from the main package's dependencies
///
/// Walks dependency groups, then candidates in each group, then matching
/// files in `data/`. A file reachable through several candidates or
/// groups is reported once per path.
pub fn check_version_all<B>(
    backend: &B,
    main: &BundlePath,
    tree: &ExtractedTree,
) -> Result<Vec<VersionCheck>>
where
    B: PackageBackend + ?Sized,
{
    let main_name = main.package_name()?;
    let main_info = backend.lookup(&main_name)?;
    let payload = tree.payload_files()?;

    let mut checks = Vec::new();
    for group in &main_info.dependency_groups {
        for candidate in &group.alternatives {
            for file in payload
                .iter()
                .filter(|f| file_name_prefix(&f.file_name) == candidate.as_str())
            {
                checks.push(check_version(backend, &file.stem())?);
            }
        }
    }

    Ok(checks)
}
