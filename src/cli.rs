// src/cli.rs
//! CLI definitions for onbundle
//!
//! Command implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "onbundle")]
#[command(version)]
#[command(about = "Install .on package bundles on top of apt", long_about = None)]
pub struct Cli {
    /// Configuration file (default: /etc/onbundle/config.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the metadata of a bundle
    Info {
        /// Path to the .on bundle
        bundle: PathBuf,
    },

    /// Verify payload checksums against the bundle manifest
    Verify {
        /// Path to the .on bundle
        bundle: PathBuf,

        /// Keep the extracted tree
        #[arg(long)]
        keep: bool,
    },

    /// Compare bundle versions with what the package manager knows
    Check {
        /// Path to the .on bundle
        bundle: PathBuf,

        /// Also check bundled dependencies
        #[arg(short, long)]
        all: bool,
    },

    /// Install a bundle and its bundled dependencies
    Install {
        /// Path to the .on bundle
        bundle: PathBuf,

        /// Install even if checksums fail
        #[arg(long)]
        force: bool,

        /// Plan and simulate without changing the system
        #[arg(long)]
        simulate: bool,

        /// Keep the extracted tree
        #[arg(long)]
        keep: bool,
    },

    /// Create a bundle from .deb files
    Build {
        /// Package name
        name: String,

        /// Package version
        version: String,

        /// Payload package files
        #[arg(required = true)]
        packages: Vec<PathBuf>,

        /// Extra blank.info field (repeatable)
        #[arg(long = "info", value_name = "FIELD=VALUE")]
        info: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}
