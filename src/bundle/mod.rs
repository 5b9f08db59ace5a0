// src/bundle/mod.rs

//! The `.on` bundle format
//!
//! A bundle is a bzip2-compressed tar archive laid out as:
//!
//! ```text
//! <name>_<version>/blank.info       tag-section metadata
//! <name>_<version>/blank.manifest   "<file> : <md5>" lines
//! <name>_<version>/data/*           payload .deb files
//! ```
//!
//! The bundle file itself is named `<name>_<version>.on`.

pub mod archive;
pub mod builder;
pub mod manifest;
pub mod metadata;
pub mod verify;

pub use archive::{extract, extract_to, read_member, read_metadata, ExtractedTree, PayloadFile};
pub use builder::BundleBuilder;
pub use manifest::{ChecksumManifest, ManifestEntry};
pub use metadata::TagSection;
pub use verify::{check_sums, ChecksumReport};

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// File extension of a bundle, without the dot
pub const BUNDLE_EXTENSION: &str = "on";

/// Metadata member inside the bundle's top-level directory
pub const INFO_MEMBER: &str = "blank.info";

/// Checksum manifest member inside the bundle's top-level directory
pub const MANIFEST_MEMBER: &str = "blank.manifest";

/// Payload directory inside the bundle's top-level directory
pub const DATA_DIR: &str = "data";

/// Check whether a path names a bundle
///
/// Pure function of the extension; the file is never touched.
pub fn is_valid(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext == BUNDLE_EXTENSION)
}

/// Split an extensionless package or bundle name into (name, version)
///
/// Segment 0 of the `_` split is the name and segment 1 the version; any
/// further segments (architecture) are ignored. Names that themselves
/// contain `_` split at the wrong place.
pub fn split_package_name(stem: &str) -> Result<(&str, &str)> {
    let mut parts = stem.split('_');
    match (parts.next(), parts.next()) {
        (Some(name), Some(version)) if !name.is_empty() && !version.is_empty() => {
            Ok((name, version))
        }
        _ => Err(Error::InvalidName(stem.to_string())),
    }
}

/// Name prefix of a payload file: everything before the first `_`
pub fn file_name_prefix(file_name: &str) -> &str {
    file_name.split('_').next().unwrap_or(file_name)
}

/// A path to a `.on` bundle with its derived names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePath {
    path: PathBuf,
}

impl BundlePath {
    /// Wrap a path, rejecting anything without the bundle extension
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !is_valid(&path) {
            return Err(Error::InvalidBundle(path.display().to_string()));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base file name without the `.on` extension, e.g. `foo_2.0`
    pub fn bundle_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Package name derived from the bundle name
    pub fn package_name(&self) -> Result<String> {
        let stem = self.bundle_name();
        split_package_name(&stem).map(|(name, _)| name.to_string())
    }

    /// Package version derived from the bundle name
    pub fn package_version(&self) -> Result<String> {
        let stem = self.bundle_name();
        split_package_name(&stem).map(|(_, version)| version.to_string())
    }

    /// Path of a member inside the archive, e.g. `foo_2.0/blank.info`
    pub fn member_path(&self, member: &str) -> PathBuf {
        Path::new(&self.bundle_name()).join(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_extension() {
        assert!(is_valid("foo_2.0.on"));
        assert!(is_valid("/tmp/bundles/foo_2.0.on"));
        assert!(!is_valid("foo_2.0.deb"));
        assert!(!is_valid("foo_2.0.on.bak"));
        assert!(!is_valid("foo_2.0.ON"));
        assert!(!is_valid("foo_on"));
        assert!(!is_valid(""));
    }

    #[test]
    fn test_is_valid_does_no_io() {
        // Nonexistent paths are judged by name only
        assert!(is_valid("/nonexistent/dir/bar_1.0.on"));
    }

    #[test]
    fn test_bundle_path_names() {
        let bundle = BundlePath::new("/var/tmp/foo_2.0.on").unwrap();
        assert_eq!(bundle.bundle_name(), "foo_2.0");
        assert_eq!(bundle.package_name().unwrap(), "foo");
        assert_eq!(bundle.package_version().unwrap(), "2.0");
        assert_eq!(
            bundle.member_path(INFO_MEMBER),
            PathBuf::from("foo_2.0/blank.info")
        );
    }

    #[test]
    fn test_bundle_path_rejects_other_extensions() {
        let err = BundlePath::new("foo_2.0.tar.bz2").unwrap_err();
        assert!(matches!(err, Error::InvalidBundle(_)));
    }

    #[test]
    fn test_split_package_name() {
        assert_eq!(split_package_name("foo_2.0").unwrap(), ("foo", "2.0"));
        assert_eq!(
            split_package_name("bar_1.0-1_amd64").unwrap(),
            ("bar", "1.0-1")
        );
        assert!(split_package_name("foo").is_err());
        assert!(split_package_name("foo_").is_err());
    }

    #[test]
    fn test_split_underscore_in_name_is_ambiguous() {
        // "lib_foo" is not recoverable; the split point stays at the first underscore
        assert_eq!(
            split_package_name("lib_foo_1.0").unwrap(),
            ("lib", "foo")
        );
    }

    #[test]
    fn test_file_name_prefix() {
        assert_eq!(file_name_prefix("bar_1.0.deb"), "bar");
        assert_eq!(file_name_prefix("bar.deb"), "bar.deb");
    }
}
