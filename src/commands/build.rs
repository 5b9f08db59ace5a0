// src/commands/build.rs

use anyhow::{Context, Result};
use onbundle::BundleBuilder;
use std::path::{Path, PathBuf};

/// Create `<output>/<name>_<version>.on` from package files
pub fn cmd_build(
    name: &str,
    version: &str,
    packages: &[PathBuf],
    info: &[String],
    output: &Path,
) -> Result<()> {
    let mut builder = BundleBuilder::new(name, version)
        .info("Package", name)
        .info("Version", version);

    for field in info {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid --info '{}', expected FIELD=VALUE", field))?;
        builder = builder.info(key.trim(), value.trim());
    }

    for package in packages {
        builder = builder
            .payload_file(package)
            .with_context(|| format!("Failed to add {}", package.display()))?;
    }

    let path = builder.write(output)?;
    println!("Created {}", path.display());
    for entry in builder.manifest().entries() {
        println!("  {} : {}", entry.file_name, entry.md5);
    }

    Ok(())
}
