// src/commands/mod.rs
//! Command handlers for the onbundle CLI

mod build;
mod check;
mod info;
mod install;
pub mod progress;
mod verify;

pub use build::cmd_build;
pub use check::cmd_check;
pub use info::cmd_info;
pub use install::{cmd_install, InstallOptions};
pub use verify::cmd_verify;
