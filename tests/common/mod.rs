// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use onbundle::{BundleBuilder, DependencyGroup, ExtractedTree, MemoryBackend};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch layout for one test: bundle output, extraction root, apt cache.
///
/// Keep the struct alive to prevent cleanup.
pub struct Workspace {
    pub temp: TempDir,
    pub bundles: PathBuf,
    pub extract_root: PathBuf,
    pub cache: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let bundles = temp.path().join("bundles");
        let extract_root = temp.path().join("extract");
        let cache = temp.path().join("cache");
        for dir in [&bundles, &extract_root, &cache] {
            std::fs::create_dir_all(dir).unwrap();
        }

        Self {
            temp,
            bundles,
            extract_root,
            cache,
        }
    }

    /// Write a bundle and extract it, returning (bundle path, tree)
    pub fn build_and_extract(&self, builder: BundleBuilder) -> (PathBuf, ExtractedTree) {
        let bundle = builder.write(&self.bundles).unwrap();
        let tree = onbundle::extract_to(&bundle, &self.extract_root).unwrap();
        (bundle, tree)
    }

    pub fn cached(&self, file_name: &str) -> bool {
        self.cache.join(file_name).exists()
    }
}

/// `foo_2.0.on` carrying `foo_2.0.deb` and its dependency `bar_1.0.deb`
pub fn foo_bundle() -> BundleBuilder {
    BundleBuilder::new("foo", "2.0")
        .info("Package", "foo")
        .info("Version", "2.0")
        .info("Description", "Foo with bundled dependencies")
        .payload_bytes("foo_2.0.deb", b"!<arch>\nfoo package".to_vec())
        .payload_bytes("bar_1.0.deb", b"!<arch>\nbar package".to_vec())
}

/// Backend where foo 1.0 is installed, depends on bar, and bar is absent
pub fn foo_backend(cache: &Path) -> MemoryBackend {
    MemoryBackend::new(cache)
        .with_package("foo", "1.0", true, vec![DependencyGroup::new(["bar"])])
        .with_available("bar", "1.0")
}
