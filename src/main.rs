// src/main.rs

use anyhow::Result;
use clap::Parser;
use onbundle::Config;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { bundle } => commands::cmd_info(&bundle),
        Commands::Verify { bundle, keep } => commands::cmd_verify(&bundle, keep, &config),
        Commands::Check { bundle, all } => commands::cmd_check(&bundle, all, &config),
        Commands::Install {
            bundle,
            force,
            simulate,
            keep,
        } => commands::cmd_install(
            &bundle,
            commands::InstallOptions {
                force,
                simulate,
                keep,
            },
            &config,
        ),
        Commands::Build {
            name,
            version,
            packages,
            info,
            output,
        } => commands::cmd_build(&name, &version, &packages, &info, &output),
    }
}
