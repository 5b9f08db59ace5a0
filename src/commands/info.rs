// src/commands/info.rs

use anyhow::{Context, Result};
use std::path::Path;

/// Print the bundle's `blank.info` fields
pub fn cmd_info(bundle: &Path) -> Result<()> {
    let metadata = onbundle::read_metadata(bundle)
        .with_context(|| format!("Failed to read metadata from {}", bundle.display()))?;

    if metadata.is_empty() {
        println!("{}: no metadata fields", bundle.display());
        return Ok(());
    }

    for (field, value) in metadata.iter() {
        let mut lines = value.lines();
        println!("{}: {}", field, lines.next().unwrap_or(""));
        for line in lines {
            println!(" {}", line);
        }
    }

    Ok(())
}
