// src/commands/verify.rs

use anyhow::{Context, Result};
use onbundle::{BundlePath, ChecksumReport, Config, ExtractedTree};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Extract a bundle under the configured temp root
///
/// A failed extraction removes the partial tree it created. A tree that
/// was already there is left alone.
pub(crate) fn extract(bundle: &Path, config: &Config) -> Result<ExtractedTree> {
    let target = config
        .temp_root()
        .join(BundlePath::new(bundle)?.bundle_name());
    let existed = target.exists();

    onbundle::extract_to(bundle, config.temp_root()).map_err(|e| {
        if !existed && target.exists() {
            if let Err(rm) = fs::remove_dir_all(&target) {
                warn!("Failed to remove partial tree {}: {}", target.display(), rm);
            }
        }
        anyhow::Error::new(e).context(format!("Failed to extract {}", bundle.display()))
    })
}

/// Remove the extracted tree unless asked to keep it
pub(crate) fn cleanup(tree: ExtractedTree, keep: bool) {
    if keep {
        println!("Extracted tree kept at {}", tree.path().display());
        return;
    }
    let path = tree.path().to_path_buf();
    if let Err(e) = tree.remove() {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

pub(crate) fn print_report(report: &ChecksumReport) {
    for (file, ok) in report.iter() {
        println!("  {} {}", if ok { "[ok]    " } else { "[FAILED]" }, file);
    }
}

/// Check payload MD5 sums against the manifest
pub fn cmd_verify(bundle: &Path, keep: bool, config: &Config) -> Result<()> {
    let tree = extract(bundle, config)?;

    let report = onbundle::check_sums(bundle, &tree);
    cleanup(tree, keep);
    let report = report.with_context(|| format!("Failed to verify {}", bundle.display()))?;

    println!("Checksums for {} ({} files):", bundle.display(), report.len());
    print_report(&report);

    if !report.all_passed() {
        anyhow::bail!("{} file(s) failed verification", report.failures().len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::write::BzEncoder;
    use bzip2::Compression;
    use tar::{Builder, EntryType, Header};
    use tempfile::TempDir;

    fn append(archive: &mut Builder<BzEncoder<fs::File>>, path: &str, kind: EntryType, data: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_entry_type(kind);
        header.set_mode(0o644);
        header.set_size(data.len() as u64);
        archive.append_data(&mut header, path, data).unwrap();
    }

    #[test]
    fn test_failed_extraction_removes_partial_tree() {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("foo_2.0.on");

        // data is a regular file, so the payload entry after it cannot unpack
        let file = fs::File::create(&bundle).unwrap();
        let mut archive = Builder::new(BzEncoder::new(file, Compression::best()));
        append(&mut archive, "foo_2.0/blank.info", EntryType::Regular, b"Package: foo\n");
        append(&mut archive, "foo_2.0/data", EntryType::Regular, b"");
        append(&mut archive, "foo_2.0/data/foo_2.0.deb", EntryType::Regular, b"payload");
        archive.into_inner().unwrap().finish().unwrap();

        let config = Config {
            temp_dir: Some(temp.path().join("extract")),
            ..Config::default()
        };

        assert!(extract(&bundle, &config).is_err());
        assert!(!temp.path().join("extract/foo_2.0").exists());
    }

    #[test]
    fn test_failed_extraction_keeps_existing_tree() {
        let temp = TempDir::new().unwrap();
        let bundle = onbundle::BundleBuilder::new("foo", "2.0").write(temp.path()).unwrap();
        let existing = temp.path().join("extract/foo_2.0");
        fs::create_dir_all(&existing).unwrap();

        let config = Config {
            temp_dir: Some(temp.path().join("extract")),
            ..Config::default()
        };

        assert!(extract(&bundle, &config).is_err());
        assert!(existing.is_dir());
    }
}
