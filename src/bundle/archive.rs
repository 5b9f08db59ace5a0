// src/bundle/archive.rs

//! Reading `.on` bundles: extraction, member lookup, and metadata
//!
//! Bundles always use bzip2; there is no format detection. Member reads
//! stream the compressed archive directly and do not depend on a prior
//! extraction.

use super::metadata::TagSection;
use super::{file_name_prefix, BundlePath, DATA_DIR, INFO_MEMBER};
use crate::error::{Error, Result};
use bzip2::read::BzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};

/// Open a bundle as a tar stream over its bzip2 decoder
fn open_archive(path: &Path) -> io::Result<Archive<BzDecoder<File>>> {
    let file = File::open(path)?;
    Ok(Archive::new(BzDecoder::new(file)))
}

/// Drop `.` components so `./foo/blank.info` and `foo/blank.info` compare equal
fn normalize_member(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Extract a bundle into the system temporary directory
pub fn extract(path: impl AsRef<Path>) -> Result<ExtractedTree> {
    extract_to(path, std::env::temp_dir())
}

/// Extract a bundle under `root`
///
/// Returns `<root>/<bundle name>`, which must not exist beforehand. The
/// archive must carry its payload under a top-level directory named after
/// the bundle. Partial output is left in place on failure; the caller owns
/// cleanup.
pub fn extract_to(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<ExtractedTree> {
    let bundle = BundlePath::new(path.as_ref())?;
    let root = root.as_ref();
    let bundle_name = bundle.bundle_name();
    let target = root.join(&bundle_name);

    if target.exists() {
        return Err(Error::Extraction(format!(
            "{} already exists; remove it before extracting {}",
            target.display(),
            bundle.path().display()
        )));
    }

    info!("Extracting {} into {}", bundle.path().display(), root.display());

    let extraction_error = |e: io::Error| {
        Error::Extraction(format!(
            "extracting {} failed: {}",
            bundle.path().display(),
            e
        ))
    };

    let mut archive = open_archive(bundle.path()).map_err(|e| {
        Error::Extraction(format!("cannot open {}: {}", bundle.path().display(), e))
    })?;
    fs::create_dir_all(root).map_err(extraction_error)?;

    let mut has_bundle_root = false;
    for entry in archive.entries().map_err(extraction_error)? {
        let mut entry = entry.map_err(extraction_error)?;
        let entry_path = normalize_member(&entry.path().map_err(extraction_error)?);
        if entry_path.starts_with(&bundle_name) {
            has_bundle_root = true;
        }
        if !entry.unpack_in(root).map_err(extraction_error)? {
            debug!("Skipped member outside {}: {}", root.display(), entry_path.display());
        }
    }

    if !has_bundle_root {
        return Err(Error::Extraction(format!(
            "{} does not contain a {}/ directory",
            bundle.path().display(),
            bundle_name
        )));
    }

    debug!("Extracted tree at {}", target.display());
    Ok(ExtractedTree::from_path(target))
}

/// Read one member of the bundle's top-level directory into memory
///
/// Returns `Ok(None)` when the archive has no such member.
pub fn read_member(bundle: &BundlePath, member: &str) -> io::Result<Option<Vec<u8>>> {
    let target = bundle.member_path(member);
    let mut archive = open_archive(bundle.path())?;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = normalize_member(&entry.path()?);

        if entry_path == target {
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            return Ok(Some(content));
        }
    }

    Ok(None)
}

/// Read and parse the bundle's `blank.info`
pub fn read_metadata(path: impl AsRef<Path>) -> Result<TagSection> {
    let bundle = BundlePath::new(path.as_ref())?;

    let content = read_member(&bundle, INFO_MEMBER)
        .map_err(|e| Error::InfoRead(format!("{}: {}", bundle.path().display(), e)))?
        .ok_or_else(|| {
            Error::InfoRead(format!(
                "{} has no {}",
                bundle.path().display(),
                bundle.member_path(INFO_MEMBER).display()
            ))
        })?;

    Ok(TagSection::parse(&String::from_utf8_lossy(&content)))
}

/// A payload file found under `data/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFile {
    pub file_name: String,
    pub path: PathBuf,
}

impl PayloadFile {
    /// File name without its package extension, e.g. `bar_1.0_amd64`
    pub fn stem(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone())
    }
}

/// Directory produced by extracting a bundle
///
/// Never removed automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTree {
    path: PathBuf,
}

impl ExtractedTree {
    /// Refer to an already extracted bundle directory
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path.join(DATA_DIR)
    }

    /// Regular files under `data/`, ordered by file name
    pub fn payload_files(&self) -> Result<Vec<PayloadFile>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(self.data_dir())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            files.push(PayloadFile {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    /// Payload files whose name prefix equals `package`
    pub fn files_for_package(&self, package: &str) -> Result<Vec<PayloadFile>> {
        Ok(self
            .payload_files()?
            .into_iter()
            .filter(|f| file_name_prefix(&f.file_name) == package)
            .collect())
    }

    /// Delete the tree from disk
    pub fn remove(self) -> Result<()> {
        debug!("Removing extracted tree {}", self.path.display());
        fs::remove_dir_all(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleBuilder;
    use tempfile::TempDir;

    fn sample_bundle(dir: &Path) -> PathBuf {
        BundleBuilder::new("foo", "2.0")
            .info("Package", "foo")
            .info("Description", "Foo bundle")
            .payload_bytes("foo_2.0.deb", b"foo payload".to_vec())
            .payload_bytes("bar_1.0.deb", b"bar payload".to_vec())
            .write(dir)
            .unwrap()
    }

    #[test]
    fn test_extract_to_layout() {
        let temp = TempDir::new().unwrap();
        let bundle = sample_bundle(temp.path());
        let out = temp.path().join("out");

        let tree = extract_to(&bundle, &out).unwrap();
        assert_eq!(tree.path(), out.join("foo_2.0"));
        assert!(tree.path().join("blank.info").is_file());
        assert!(tree.path().join("blank.manifest").is_file());

        let names: Vec<_> = tree
            .payload_files()
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["bar_1.0.deb", "foo_2.0.deb"]);
    }

    #[test]
    fn test_extract_rejects_invalid_extension() {
        let err = extract_to("/nonexistent/foo_2.0.tar", "/nonexistent").unwrap_err();
        assert!(matches!(err, Error::InvalidBundle(_)));
    }

    #[test]
    fn test_extract_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = extract_to(temp.path().join("nope_1.0.on"), temp.path()).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_extract_garbage_file() {
        let temp = TempDir::new().unwrap();
        let bogus = temp.path().join("bogus_1.0.on");
        fs::write(&bogus, b"definitely not bzip2").unwrap();

        let err = extract_to(&bogus, temp.path().join("out")).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_extract_renamed_bundle_fails_identity() {
        let temp = TempDir::new().unwrap();
        let bundle = sample_bundle(temp.path());
        let renamed = temp.path().join("other_3.0.on");
        fs::rename(&bundle, &renamed).unwrap();

        let err = extract_to(&renamed, temp.path().join("out")).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_extract_into_existing_tree_fails() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let first_dir = temp.path().join("first");
        fs::create_dir_all(&first_dir).unwrap();
        let first = BundleBuilder::new("foo", "2.0")
            .payload_bytes("bar_1.0.deb", b"stale".to_vec())
            .write(&first_dir)
            .unwrap();
        extract_to(&first, &out).unwrap();

        let second = BundleBuilder::new("foo", "2.0")
            .payload_bytes("foo_2.0.deb", b"fresh".to_vec())
            .write(temp.path())
            .unwrap();
        let err = extract_to(&second, &out).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));

        // The earlier tree is untouched and nothing was merged into it
        let tree = ExtractedTree::from_path(out.join("foo_2.0"));
        let names: Vec<_> = tree
            .payload_files()
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["bar_1.0.deb"]);
    }

    #[test]
    fn test_extract_renamed_bundle_beside_genuine_tree() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let genuine_dir = temp.path().join("genuine");
        fs::create_dir_all(&genuine_dir).unwrap();
        let genuine = BundleBuilder::new("other", "3.0").write(&genuine_dir).unwrap();
        extract_to(&genuine, &out).unwrap();

        let renamed = temp.path().join("other_3.0.on");
        fs::rename(sample_bundle(temp.path()), &renamed).unwrap();

        let err = extract_to(&renamed, &out).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(!out.join("foo_2.0").exists());
    }

    #[test]
    fn test_read_metadata() {
        let temp = TempDir::new().unwrap();
        let bundle = sample_bundle(temp.path());

        let info = read_metadata(&bundle).unwrap();
        assert_eq!(info.get("Package"), Some("foo"));
        assert_eq!(info.get("description"), Some("Foo bundle"));
    }

    #[test]
    fn test_read_metadata_missing_member() {
        let temp = TempDir::new().unwrap();
        let bundle = BundleBuilder::new("foo", "2.0")
            .without_info()
            .write(temp.path())
            .unwrap();

        let err = read_metadata(&bundle).unwrap_err();
        assert!(matches!(err, Error::InfoRead(_)));
    }

    #[test]
    fn test_read_metadata_unreadable_archive() {
        let temp = TempDir::new().unwrap();
        let err = read_metadata(temp.path().join("missing_1.0.on")).unwrap_err();
        assert!(matches!(err, Error::InfoRead(_)));
    }

    #[test]
    fn test_files_for_package() {
        let temp = TempDir::new().unwrap();
        let bundle = sample_bundle(temp.path());
        let tree = extract_to(&bundle, temp.path().join("out")).unwrap();

        let bar = tree.files_for_package("bar").unwrap();
        assert_eq!(bar.len(), 1);
        assert_eq!(bar[0].stem(), "bar_1.0");
        assert!(tree.files_for_package("baz").unwrap().is_empty());
    }

    #[test]
    fn test_remove_tree() {
        let temp = TempDir::new().unwrap();
        let bundle = sample_bundle(temp.path());
        let tree = extract_to(&bundle, temp.path().join("out")).unwrap();
        let path = tree.path().to_path_buf();

        tree.remove().unwrap();
        assert!(!path.exists());
    }
}
