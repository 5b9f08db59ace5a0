// src/commands/check.rs

use super::verify::{cleanup, extract};
use anyhow::{Context, Result};
use onbundle::{AptBackend, BundlePath, Config};
use std::path::Path;

/// Print version verdicts for the bundle and optionally its dependencies
pub fn cmd_check(bundle: &Path, all: bool, config: &Config) -> Result<()> {
    let path = BundlePath::new(bundle)?;
    let backend = AptBackend::from_config(config);

    let check = onbundle::check_version(&backend, &path.bundle_name())
        .with_context(|| format!("Failed to check {}", path.bundle_name()))?;
    println!("{}", check);

    if all {
        let tree = extract(bundle, config)?;
        let checks = onbundle::check_version_all(&backend, &path, &tree);
        cleanup(tree, config.install.keep_extracted);

        for check in checks.context("Failed to check bundled dependencies")? {
            println!("  {}", check);
        }
    }

    Ok(())
}
