//! NotePath - vault-relative note locations
//!
//! Paths address notes and directories inside the vault, relative to its root.
//!
//! # Examples
//! - `AI/Memory/Contexts/Shared/Terraform.md`
//! - `/AI/Memory/Conversations/Claude/20240301-0930-Planning.md`
//! - `` (empty) - the vault root itself
//!
//! # Key Points
//! - A leading `/` is accepted and stripped
//! - `.` and empty segments are dropped, `..` is rejected outright
//! - Nothing resolved from a `NotePath` can land above the vault root

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File extensions recognized as notes
pub const NOTE_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Errors produced while parsing a path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path escapes the vault root: {0}")]
    Traversal(String),

    #[error("invalid path segment {segment:?} in {path}")]
    InvalidSegment { path: String, segment: String },
}

/// A vault-relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotePath {
    /// Path segments (e.g., ["AI", "Memory", "Contexts", "Note.md"])
    segments: Vec<String>,
}

impl NotePath {
    /// Parse a path string
    ///
    /// # Examples
    /// ```
    /// use smf::core::path::NotePath;
    ///
    /// let path = NotePath::parse("AI/Memory/Contexts/Note.md").unwrap();
    /// assert_eq!(path.segments().len(), 4);
    /// assert!(NotePath::parse("../../etc/passwd").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();

        for segment in s.trim().split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(PathError::Traversal(s.to_string())),
                _ => {
                    Self::validate_segment(s, segment)?;
                    segments.push(segment.to_string());
                }
            }
        }

        Ok(Self { segments })
    }

    fn validate_segment(path: &str, segment: &str) -> Result<(), PathError> {
        // Backslashes would be separators on Windows and could smuggle `..`
        let invalid = segment.contains('\\') || segment.contains('\0');

        if invalid {
            return Err(PathError::InvalidSegment {
                path: path.to_string(),
                segment: segment.to_string(),
            });
        }

        Ok(())
    }

    /// Get path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this is the vault root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment (file or directory name)
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// File name without its extension
    pub fn stem(&self) -> Option<&str> {
        let name = self.name()?;
        Some(name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name))
    }

    /// Lowercased extension of the last segment
    pub fn extension(&self) -> Option<String> {
        let name = self.name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the path names a note (recognized text extension)
    pub fn is_note(&self) -> bool {
        self.extension()
            .map(|ext| NOTE_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Parent path (`None` for the root)
    pub fn parent(&self) -> Option<NotePath> {
        if self.segments.is_empty() {
            return None;
        }

        Some(NotePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Check if this path is `prefix` or lies below it
    pub fn starts_with(&self, prefix: &NotePath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && self
                .segments
                .iter()
                .zip(prefix.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// Segments below `prefix`, if this path lies under it
    pub fn strip_prefix(&self, prefix: &NotePath) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.segments[prefix.segments.len()..])
        } else {
            None
        }
    }

    /// Resolve against a filesystem root
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut full = root.to_path_buf();
        for segment in &self.segments {
            full.push(segment);
        }
        full
    }
}

impl fmt::Display for NotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}
