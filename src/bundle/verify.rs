// src/bundle/verify.rs

//! Integrity verification of extracted payload files against the manifest

use super::archive::ExtractedTree;
use super::manifest::ChecksumManifest;
use super::BundlePath;
use crate::error::Result;
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Per-file verification result, keyed by payload file name
///
/// Manifest entries with no matching file under `data/` have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumReport {
    results: BTreeMap<String, bool>,
}

impl ChecksumReport {
    pub fn get(&self, file_name: &str) -> Option<bool> {
        self.results.get(file_name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.results.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// True if every reported file matched (vacuously true when empty)
    pub fn all_passed(&self) -> bool {
        self.results.values().all(|ok| *ok)
    }

    /// File names whose digest did not match
    pub fn failures(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Compute the lowercase hex MD5 of a file
pub fn compute_md5(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Check the payload of an extracted bundle against its manifest
///
/// The manifest is read from the bundle archive itself. Mismatches are
/// reported as `false`, not as errors.
pub fn check_sums(path: impl AsRef<Path>, tree: &ExtractedTree) -> Result<ChecksumReport> {
    let bundle = BundlePath::new(path.as_ref())?;
    let manifest = ChecksumManifest::read(&bundle)?;
    let payload = tree.payload_files()?;

    let mut report = ChecksumReport::default();

    for entry in manifest.entries() {
        for file in &payload {
            if file.file_name != entry.file_name {
                continue;
            }

            let actual = compute_md5(&file.path)?;
            let ok = actual == entry.md5;
            if ok {
                debug!("Checksum OK: {}", file.file_name);
            } else {
                warn!(
                    "Checksum mismatch for {}: manifest {}, actual {}",
                    file.file_name, entry.md5, actual
                );
            }
            report.results.insert(entry.file_name.clone(), ok);
        }
    }

    info!(
        "Verified {} of {} manifest entries for {}",
        report.len(),
        manifest.len(),
        bundle.bundle_name()
    );
    Ok(report)
}
