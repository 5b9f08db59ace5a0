// src/commands/install.rs

use super::progress::CliProgress;
use super::verify::{cleanup, extract, print_report};
use anyhow::{Context, Result};
use onbundle::{AptBackend, BundlePath, Config, ExtractedTree, VersionVerdict};
use std::path::Path;
use tracing::{info, warn};

/// Flags of the install command
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    pub force: bool,
    pub simulate: bool,
    pub keep: bool,
}

/// Install a bundle through apt
pub fn cmd_install(bundle: &Path, options: InstallOptions, config: &Config) -> Result<()> {
    let path = BundlePath::new(bundle)?;
    let keep = options.keep || config.install.keep_extracted;

    let mut config = config.clone();
    if options.simulate {
        config.apt.simulate = true;
    }

    let tree = extract(bundle, &config)?;
    let result = install_tree(&path, &tree, options, &config);
    cleanup(tree, keep);
    result
}

fn install_tree(
    path: &BundlePath,
    tree: &ExtractedTree,
    options: InstallOptions,
    config: &Config,
) -> Result<()> {
    let report = onbundle::check_sums(path.path(), tree)
        .with_context(|| format!("Failed to verify {}", path.bundle_name()))?;

    if !report.all_passed() {
        print_report(&report);
        let failed = report.failures().join(", ");
        if config.install.require_checksums && !options.force {
            anyhow::bail!("Checksum verification failed for: {} (use --force to override)", failed);
        }
        warn!("Continuing despite checksum failures: {}", failed);
    }

    let mut backend = AptBackend::from_config(config);

    let check = onbundle::check_version(&backend, &path.bundle_name())?;
    println!("{}", check);
    if check.verdict != VersionVerdict::Newer {
        info!("{} is not newer than the known version", path.bundle_name());
    }
    for check in onbundle::check_version_all(&backend, path, tree)? {
        println!("  {}", check);
    }

    let plan = onbundle::mark_install(&mut backend, path, tree)
        .with_context(|| format!("Failed to plan {}", path.bundle_name()))?;

    if plan.is_empty() {
        println!("Nothing to install; all packages are already installed.");
        return Ok(());
    }

    println!("Packages to install ({}):", plan.len());
    for candidate in &plan {
        println!("  {}", candidate);
    }

    let progress = CliProgress::new(&format!("Installing {}", path.bundle_name()));
    onbundle::commit_install(&mut backend, &plan, &progress).context("Install failed")?;

    if config.apt.simulate {
        println!("Simulation complete; no changes were made.");
    } else {
        println!("Installed {}", path.bundle_name());
    }
    Ok(())
}
