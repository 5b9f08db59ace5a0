// src/bundle/manifest.rs

//! The `blank.manifest` checksum listing
//!
//! One entry per line: `<filename> : <hex md5>`.

use super::archive::read_member;
use super::{BundlePath, MANIFEST_MEMBER};
use crate::error::{Error, Result};
use std::fmt;
use tracing::debug;

/// Separator between file name and digest
pub const MANIFEST_SEPARATOR: &str = " : ";

/// One line of the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file_name: String,
    /// Lowercase hex MD5
    pub md5: String,
}

/// All manifest entries in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<ManifestEntry>,
}

impl ChecksumManifest {
    /// Parse manifest text, skipping lines without the separator
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .filter_map(|line| match line.split_once(MANIFEST_SEPARATOR) {
                Some((name, digest)) => Some(ManifestEntry {
                    file_name: name.to_string(),
                    md5: digest.trim().to_ascii_lowercase(),
                }),
                None => {
                    if !line.trim().is_empty() {
                        debug!("Skipping malformed manifest line: {:?}", line);
                    }
                    None
                }
            })
            .collect();

        Self { entries }
    }

    /// Read and parse the manifest member of a bundle
    pub fn read(bundle: &BundlePath) -> Result<Self> {
        let content = read_member(bundle, MANIFEST_MEMBER)
            .map_err(|e| Error::ManifestRead(format!("{}: {}", bundle.path().display(), e)))?
            .ok_or_else(|| {
                Error::ManifestRead(format!(
                    "{} has no {}",
                    bundle.path().display(),
                    bundle.member_path(MANIFEST_MEMBER).display()
                ))
            })?;

        Ok(Self::parse(&String::from_utf8_lossy(&content)))
    }

    pub fn push(&mut self, file_name: impl Into<String>, md5: impl Into<String>) {
        self.entries.push(ManifestEntry {
            file_name: file_name.into(),
            md5: md5.into(),
        });
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ChecksumManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}{}{}", entry.file_name, MANIFEST_SEPARATOR, entry.md5)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let manifest = ChecksumManifest::parse(
            "foo_2.0.deb : 6f5902ac237024bdd0c176cb93063dc4\n\
             bar_1.0.deb : D41D8CD98F00B204E9800998ECF8427E\n",
        );

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries()[0].file_name, "foo_2.0.deb");
        assert_eq!(
            manifest.entries()[1].md5,
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_parse_skips_blank_and_malformed() {
        let manifest = ChecksumManifest::parse(
            "\nfoo_2.0.deb : abc\nnot a manifest line\nbar.deb:abc\n\n",
        );
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_parse_trailing_whitespace() {
        let manifest = ChecksumManifest::parse("foo.deb : abc123 \r\n");
        assert_eq!(manifest.entries()[0].md5, "abc123");
    }

    #[test]
    fn test_display_format() {
        let mut manifest = ChecksumManifest::default();
        manifest.push("foo_2.0.deb", "00ff");
        assert_eq!(manifest.to_string(), "foo_2.0.deb : 00ff\n");
        assert_eq!(ChecksumManifest::parse(&manifest.to_string()), manifest);
    }
}
