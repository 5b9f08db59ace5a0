// src/bundle/builder.rs

//! Creating `.on` bundles
//!
//! Writes `<dir>/<name>_<version>.on` with the info section, a manifest
//! computed from the payload, and the payload files under `data/`.

use super::manifest::ChecksumManifest;
use super::metadata::TagSection;
use super::{BUNDLE_EXTENSION, DATA_DIR, INFO_MEMBER, MANIFEST_MEMBER};
use crate::error::{Error, Result};
use bzip2::write::BzEncoder;
use bzip2::Compression;
use md5::{Digest, Md5};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{Builder as TarBuilder, EntryType, Header};
use tracing::info;

/// Builder for a bundle archive
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    name: String,
    version: String,
    info: TagSection,
    payload: Vec<(String, Vec<u8>)>,
    extra_manifest: Vec<(String, String)>,
    include_info: bool,
    include_manifest: bool,
}

impl BundleBuilder {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            info: TagSection::default(),
            payload: Vec::new(),
            extra_manifest: Vec::new(),
            include_info: true,
            include_manifest: true,
        }
    }

    /// `<name>_<version>`, the bundle's top-level directory
    pub fn bundle_name(&self) -> String {
        format!("{}_{}", self.name, self.version)
    }

    /// Add a field to `blank.info`
    pub fn info(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.insert(field, value);
        self
    }

    /// Add a payload file from memory
    pub fn payload_bytes(mut self, file_name: impl Into<String>, content: Vec<u8>) -> Self {
        self.payload.push((file_name.into(), content));
        self
    }

    /// Add a payload file from disk, keeping its file name
    pub fn payload_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::Build(format!("{} has no file name", path.display())))?
            .to_string_lossy()
            .into_owned();
        let content = fs::read(path)
            .map_err(|e| Error::Build(format!("cannot read {}: {}", path.display(), e)))?;
        self.payload.push((file_name, content));
        Ok(self)
    }

    /// Add a manifest line that does not correspond to any payload file
    pub fn manifest_entry(mut self, file_name: impl Into<String>, md5: impl Into<String>) -> Self {
        self.extra_manifest.push((file_name.into(), md5.into()));
        self
    }

    /// Omit `blank.info` from the archive
    pub fn without_info(mut self) -> Self {
        self.include_info = false;
        self
    }

    /// Omit `blank.manifest` from the archive
    pub fn without_manifest(mut self) -> Self {
        self.include_manifest = false;
        self
    }

    /// Manifest for the current payload
    pub fn manifest(&self) -> ChecksumManifest {
        let mut manifest = ChecksumManifest::default();
        for (file_name, content) in &self.payload {
            manifest.push(file_name.clone(), format!("{:x}", Md5::digest(content)));
        }
        for (file_name, md5) in &self.extra_manifest {
            manifest.push(file_name.clone(), md5.clone());
        }
        manifest
    }

    /// Write the bundle into `dir` and return its path
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let base = self.bundle_name();
        if self.name.is_empty() || self.version.is_empty() || self.name.contains('_') {
            return Err(Error::Build(format!("invalid bundle name '{}'", base)));
        }

        let output = dir
            .as_ref()
            .join(format!("{}.{}", base, BUNDLE_EXTENSION));
        info!(
            "Building bundle {} with {} payload files",
            output.display(),
            self.payload.len()
        );

        self.write_archive(&output, &base)
            .map_err(|e| Error::Build(format!("writing {}: {}", output.display(), e)))?;

        Ok(output)
    }

    fn write_archive(&self, output: &Path, base: &str) -> std::io::Result<()> {
        let file = File::create(output)?;
        let encoder = BzEncoder::new(file, Compression::best());
        let mut archive = TarBuilder::new(encoder);

        let root = Path::new(base);
        append_dir(&mut archive, root)?;

        if self.include_info {
            append_file(&mut archive, &root.join(INFO_MEMBER), self.info.to_string().as_bytes())?;
        }
        if self.include_manifest {
            append_file(
                &mut archive,
                &root.join(MANIFEST_MEMBER),
                self.manifest().to_string().as_bytes(),
            )?;
        }

        let data = root.join(DATA_DIR);
        append_dir(&mut archive, &data)?;
        for (file_name, content) in &self.payload {
            append_file(&mut archive, &data.join(file_name), content)?;
        }

        let encoder = archive.into_inner()?;
        let mut file = encoder.finish()?;
        file.flush()?;

        Ok(())
    }
}

fn append_dir<W: Write>(archive: &mut TarBuilder<W>, path: &Path) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_mode(0o755);
    header.set_size(0);
    header.set_mtime(0);
    archive.append_data(&mut header, path, std::io::empty())
}

fn append_file<W: Write>(
    archive: &mut TarBuilder<W>,
    path: &Path,
    content: &[u8],
) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(0o644);
    header.set_size(content.len() as u64);
    header.set_mtime(0);
    archive.append_data(&mut header, path, content)
}
