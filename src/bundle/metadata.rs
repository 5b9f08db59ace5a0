// src/bundle/metadata.rs

//! Tag-section parsing for `blank.info` and dpkg-style stanzas
//!
//! Format is RFC822-like: `Field: value` lines, continuation lines start
//! with a space or tab, and a blank line ends the section.

use std::fmt;

/// An ordered set of `Field: value` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSection {
    fields: Vec<(String, String)>,
}

impl TagSection {
    /// Parse the first section of `content`
    pub fn parse(content: &str) -> Self {
        Self::parse_all(content).into_iter().next().unwrap_or_default()
    }

    /// Parse every blank-line separated section of `content`
    pub fn parse_all(content: &str) -> Vec<Self> {
        let mut sections = Vec::new();
        let mut current = TagSection::default();

        for line in content.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    sections.push(std::mem::take(&mut current));
                }
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                // Continuation of the previous field
                if let Some((_, value)) = current.fields.last_mut() {
                    value.push('\n');
                    value.push_str(line.trim_end());
                }
                continue;
            }

            if current.is_empty() && line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                current
                    .fields
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        if !current.is_empty() {
            sections.push(current);
        }

        sections
    }

    /// Look up a field, ignoring case in the field name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Append a field, keeping declaration order
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.push((field.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for TagSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.fields {
            let mut lines = value.split('\n');
            writeln!(f, "{}: {}", key, lines.next().unwrap_or(""))?;
            for cont in lines {
                writeln!(f, " {}", cont.trim_start())?;
            }
        }
        Ok(())
    }
}
