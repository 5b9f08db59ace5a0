// src/version/mod.rs

//! Debian package version parsing and ordering
//!
//! Implements the dpkg ordering rules for `[epoch:]upstream[-revision]`
//! versions. Comparison is never lexical: digit runs compare numerically,
//! letters sort before other symbols, and `~` sorts before everything,
//! including the end of the string.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// A parsed Debian version with epoch, upstream version, and revision
#[derive(Debug, Clone)]
pub struct DebVersion {
    pub epoch: u64,
    pub upstream: String,
    pub revision: Option<String>,
}

impl DebVersion {
    /// Parse a Debian version string
    ///
    /// Format: [epoch:]upstream[-revision]
    /// Examples:
    /// - "1.2.3" → epoch=0, upstream="1.2.3", revision=None
    /// - "2:1.2.3" → epoch=2, upstream="1.2.3", revision=None
    /// - "1.2-3-1ubuntu2" → epoch=0, upstream="1.2-3", revision=Some("1ubuntu2")
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) => {
                let epoch = if e.is_empty() {
                    0
                } else {
                    e.parse::<u64>().map_err(|err| {
                        Error::InvalidName(format!("invalid epoch in version '{}': {}", s, err))
                    })?
                };
                (epoch, r)
            }
            None => (0, s),
        };

        // The revision is everything after the last hyphen
        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((u, r)) => (u.to_string(), Some(r.to_string())),
            None => (rest.to_string(), None),
        };

        if upstream.is_empty() {
            return Err(Error::InvalidName(format!(
                "empty upstream version in '{}'",
                s
            )));
        }

        Ok(Self {
            epoch,
            upstream,
            revision,
        })
    }

    /// Compare two Debian versions
    pub fn compare(&self, other: &DebVersion) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match verrevcmp(&self.upstream, &other.upstream) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // A missing revision orders like an empty one
        verrevcmp(
            self.revision.as_deref().unwrap_or(""),
            other.revision.as_deref().unwrap_or(""),
        )
    }
}

/// Compare two version strings with dpkg semantics
///
/// Strings that do not parse as versions are compared with the raw
/// dpkg fragment algorithm so the ordering stays total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (DebVersion::parse(a), DebVersion::parse(b)) {
        (Ok(va), Ok(vb)) => va.compare(&vb),
        _ => verrevcmp(a, b),
    }
}

/// Sort weight of a non-digit character
fn order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(b'~') => -1,
        Some(c) => c as i32 + 256,
    }
}

fn is_digit_at(s: &[u8], i: usize) -> bool {
    s.get(i).is_some_and(|c| c.is_ascii_digit())
}

/// dpkg's fragment comparison over alternating non-digit and digit runs
fn verrevcmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() || j < b.len() {
        while (i < a.len() && !is_digit_at(a, i)) || (j < b.len() && !is_digit_at(b, j)) {
            let ac = order(a.get(i).copied());
            let bc = order(b.get(j).copied());
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = 0i32;
        while is_digit_at(a, i) && is_digit_at(b, j) {
            if first_diff == 0 {
                first_diff = a[i] as i32 - b[j] as i32;
            }
            i += 1;
            j += 1;
        }

        // The longer digit run is the larger number
        if is_digit_at(a, i) {
            return Ordering::Greater;
        }
        if is_digit_at(b, j) {
            return Ordering::Less;
        }
        if first_diff != 0 {
            return first_diff.cmp(&0);
        }
    }

    Ordering::Equal
}

impl fmt::Display for DebVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.upstream)?;
        if let Some(ref revision) = self.revision {
            write!(f, "-{}", revision)?;
        }
        Ok(())
    }
}

impl PartialEq for DebVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for DebVersion {}

impl Ord for DebVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for DebVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
