// src/backend/apt.rs

//! Package backend driving the system apt/dpkg tools
//!
//! Queries go through `apt-cache` and `apt-config`; the commit runs
//! `apt-get install` with `APT::Status-Fd` so progress can be forwarded
//! to a `ProgressTracker`. Install intent lives in this process until the
//! commit, the same way apt's own in-memory cache holds it.

use super::{parse_dependency_field, PackageBackend, PackageInfo};
use crate::bundle::TagSection;
use crate::config::{AptConfig, Config};
use crate::error::{Error, Result};
use crate::progress::{CommitPhase, ProgressTracker};
use crate::version::{compare_versions, DebVersion};
use std::cmp::Ordering;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tracing::{debug, info, warn};

/// Installed and candidate versions from `apt-cache policy`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyInfo {
    pub installed: Option<String>,
    pub candidate: Option<String>,
}

/// One parsed `APT::Status-Fd` line
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLine {
    Download { percent: f64, message: String },
    Install { package: String, percent: f64, message: String },
    Error { package: String, message: String },
}

/// Backend for Debian-family systems
#[derive(Debug, Clone)]
pub struct AptBackend {
    config: AptConfig,
    cache_dir: Option<PathBuf>,
    marked: Vec<String>,
}

impl AptBackend {
    pub fn new(config: AptConfig) -> Self {
        Self {
            config,
            cache_dir: None,
            marked: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut backend = Self::new(config.apt.clone());
        backend.cache_dir = config.cache_dir.clone();
        backend
    }

    /// Use a fixed archive cache instead of asking apt-config
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Run a query tool with a stable locale
    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        debug!("Running {} {}", program, args.join(" "));
        Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|e| Error::Backend(format!("Failed to run {}: {}. Is apt installed?", program, e)))
    }

    fn policy(&self, name: &str) -> Result<PolicyInfo> {
        let output = self.run(&self.config.apt_cache, &["policy", name])?;
        if !output.status.success() {
            return Err(Error::Backend(format!(
                "apt-cache policy failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        parse_policy(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| Error::Lookup(name.to_string()))
    }

    fn show(&self, name: &str) -> Result<Vec<TagSection>> {
        let output = self.run(&self.config.apt_cache, &["show", name])?;
        if !output.status.success() {
            return Err(Error::Lookup(name.to_string()));
        }
        Ok(TagSection::parse_all(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl PackageBackend for AptBackend {
    fn lookup(&self, name: &str) -> Result<PackageInfo> {
        let policy = self.policy(name)?;
        let stanzas = self.show(name)?;
        package_info(name, &policy, &stanzas)
    }

    fn compare_versions(&self, a: &str, b: &str) -> Ordering {
        compare_versions(a, b)
    }

    fn mark_install(&mut self, name: &str) -> Result<()> {
        if !self.marked.iter().any(|n| n == name) {
            self.marked.push(name.to_string());
        }
        debug!("Marked {} for install", name);
        Ok(())
    }

    fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }

        let output = self.run(
            &self.config.apt_config,
            &["shell", "CACHE", "Dir::Cache::Archives/d"],
        )?;
        if !output.status.success() {
            return Err(Error::Backend(format!(
                "apt-config failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        parse_cache_dir(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| Error::Backend("Dir::Cache::Archives is not set".to_string()))
    }

    fn pending_changes(&self) -> Vec<PackageInfo> {
        self.marked
            .iter()
            .filter_map(|name| match self.lookup(name) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("Dropping marked package {}: {}", name, e);
                    None
                }
            })
            .collect()
    }

    fn commit(&mut self, names: &[String], progress: &dyn ProgressTracker) -> Result<()> {
        if names.is_empty() {
            progress.finish_with_message("Nothing to install");
            return Ok(());
        }

        let mut args = vec!["-o".to_string(), "APT::Status-Fd=1".to_string(), "install".to_string()];
        if self.config.assume_yes {
            args.push("-y".to_string());
        }
        if self.config.simulate {
            args.push("-s".to_string());
        }
        args.extend(names.iter().cloned());

        info!("Running {} {}", self.config.apt_get, args.join(" "));

        let mut child = Command::new(&self.config.apt_get)
            .args(&args)
            .env("LC_ALL", "C")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Backend(format!("Failed to run {}: {}", self.config.apt_get, e)))?;

        // stderr is drained on its own thread; status lines arrive on stdout
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut bytes);
            }
            String::from_utf8_lossy(&bytes).into_owned()
        });

        progress.begin_phase(CommitPhase::Fetch, 100);
        let read_result = match child.stdout.take() {
            Some(stdout) => forward_status(BufReader::new(stdout), progress),
            None => Ok(()),
        };

        // The child is always reaped, even when its output could not be read
        let status = child.wait();
        let stderr_text = stderr_reader.join().unwrap_or_default();

        let status = match (status, read_result) {
            (Ok(status), Ok(())) => status,
            (Err(e), _) | (Ok(_), Err(e)) => {
                let message = format!("{} install: {}", self.config.apt_get, e);
                progress.finish_with_error(&message);
                return Err(Error::Backend(message));
            }
        };

        if !status.success() {
            let message = format!("{} install failed ({}): {}", self.config.apt_get, status, stderr_text.trim());
            progress.finish_with_error(&message);
            return Err(Error::Backend(message));
        }

        self.marked.retain(|n| !names.contains(n));
        progress.finish_with_message(&format!("Installed {} packages", names.len()));
        Ok(())
    }
}

/// Build a `PackageInfo` from policy output and `apt-cache show` stanzas
///
/// The current version is the highest version apt knows. Dependency
/// groups come from the candidate's stanza (`Pre-Depends`, then
/// `Depends`), falling back to the highest version's stanza.
pub fn package_info(name: &str, policy: &PolicyInfo, stanzas: &[TagSection]) -> Result<PackageInfo> {
    let versions: Vec<(&TagSection, DebVersion)> = stanzas
        .iter()
        .filter(|s| s.get("Package") == Some(name))
        .filter_map(|s| {
            let version = DebVersion::parse(s.get("Version")?).ok()?;
            Some((s, version))
        })
        .collect();

    let (highest_stanza, highest) = versions
        .iter()
        .max_by(|a, b| a.1.cmp(&b.1))
        .ok_or_else(|| Error::Lookup(name.to_string()))?;

    let dep_stanza = policy
        .candidate
        .as_deref()
        .and_then(|candidate| {
            versions
                .iter()
                .find(|(s, _)| s.get("Version") == Some(candidate))
                .map(|(s, _)| *s)
        })
        .unwrap_or(*highest_stanza);

    let mut dependency_groups = Vec::new();
    for field in ["Pre-Depends", "Depends"] {
        if let Some(value) = dep_stanza.get(field) {
            dependency_groups.extend(parse_dependency_field(value));
        }
    }

    Ok(PackageInfo {
        name: name.to_string(),
        current_version: highest_stanza
            .get("Version")
            .map(str::to_string)
            .unwrap_or_else(|| highest.to_string()),
        installed: policy.installed.is_some(),
        dependency_groups,
    })
}

/// Parse `apt-cache policy <name>`; `None` when apt does not know the name
pub fn parse_policy(output: &str) -> Option<PolicyInfo> {
    let mut info = PolicyInfo::default();
    let mut found = false;

    for line in output.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("Installed:") {
            found = true;
            info.installed = version_or_none(value);
        } else if let Some(value) = line.strip_prefix("Candidate:") {
            found = true;
            info.candidate = version_or_none(value);
        }
    }

    found.then_some(info)
}

fn version_or_none(value: &str) -> Option<String> {
    let value = value.trim();
    (value != "(none)" && !value.is_empty()).then(|| value.to_string())
}

/// Parse `apt-config shell CACHE Dir::Cache::Archives/d`
pub fn parse_cache_dir(output: &str) -> Option<PathBuf> {
    output.lines().find_map(|line| {
        let value = line.trim().strip_prefix("CACHE=")?;
        let value = value.trim_matches(|c| c == '\'' || c == '"');
        (!value.is_empty()).then(|| PathBuf::from(value))
    })
}

/// Parse one `APT::Status-Fd` line
///
/// Formats: `dlstatus:<item>:<percent>:<msg>`,
/// `pmstatus:<pkg>:<percent>:<msg>`, `pmerror:<pkg>:<percent>:<msg>`.
/// Package names may carry an `:arch` suffix, so the percent field is
/// located as the first numeric field after the tag.
pub fn parse_status_line(line: &str) -> Option<StatusLine> {
    let (tag, rest) = line.split_once(':')?;
    let fields: Vec<&str> = rest.split(':').collect();

    let pct_index = fields
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, f)| f.trim().parse::<f64>().is_ok())
        .map(|(i, _)| i)?;

    let subject = fields[..pct_index].join(":");
    let percent = fields[pct_index].trim().parse::<f64>().ok()?;
    let message = fields[pct_index + 1..].join(":");

    match tag {
        "dlstatus" => Some(StatusLine::Download { percent, message }),
        "pmstatus" => Some(StatusLine::Install {
            package: subject,
            percent,
            message,
        }),
        "pmerror" => Some(StatusLine::Error {
            package: subject,
            message,
        }),
        _ => None,
    }
}

/// Forward every status line from apt to the tracker
///
/// Lines are split on raw bytes and decoded lossily; maintainer scripts
/// may print text that is not UTF-8.
fn forward_status<R: BufRead>(mut reader: R, progress: &dyn ProgressTracker) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        report_status_line(line.trim_end_matches(['\n', '\r']), progress);
    }
}

/// Forward a status line to the tracker, switching phases as apt does
fn report_status_line(line: &str, progress: &dyn ProgressTracker) {
    match parse_status_line(line) {
        Some(StatusLine::Download { percent, message }) => {
            progress.set_message(&message);
            progress.set_position(percent as u64);
        }
        Some(StatusLine::Install {
            package,
            percent,
            message,
        }) => {
            if progress.phase() != CommitPhase::Install {
                progress.begin_phase(CommitPhase::Install, 100);
            }
            progress.set_message(&format!("{}: {}", package, message));
            progress.set_position(percent as u64);
        }
        Some(StatusLine::Error { package, message }) => {
            warn!("apt reported an error for {}: {}", package, message);
        }
        None => debug!("apt: {}", line),
    }
}
