//! Vault - filesystem-backed note storage
//!
//! A vault is an ordinary directory tree of markdown files. Every operation is
//! synchronous filesystem I/O with no caching.
//!
//! # Layout
//!
//! ```text
//! <vault root>/
//! └── AI/Memory/                 searched by `search`
//!     ├── Contexts/<category>/
//!     ├── Conversations/<agent>/
//!     ├── System_Prompts/<category>/
//!     └── Projects/
//! ```
//!
//! Bulk scans skip files and directories they cannot read. Single-target
//! operations surface their errors.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::frontmatter;
use super::path::{NotePath, PathError, NOTE_EXTENSIONS};

/// Subtree scanned by `search`
pub const MEMORY_DIR: &str = "AI/Memory";
pub const CONTEXTS_DIR: &str = "AI/Memory/Contexts";
pub const CONVERSATIONS_DIR: &str = "AI/Memory/Conversations";
pub const PROMPTS_DIR: &str = "AI/Memory/System_Prompts";
pub const PROJECTS_DIR: &str = "AI/Memory/Projects";

/// Vault errors
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Not a note (expected .md, .markdown or .txt): {0}")]
    NotANote(String),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, VaultError>;

/// File metadata reported alongside note content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMetadata {
    pub size: u64,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl NoteMetadata {
    fn from_fs(meta: &fs::Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

/// A note read from the vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub path: String,
    pub content: String,
    pub metadata: NoteMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<frontmatter::Frontmatter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
}

/// Note counts per memory category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStats {
    pub contexts: usize,
    pub conversations: usize,
    pub system_prompts: usize,
    pub projects: usize,
}

/// Handle on a vault root
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    /// Open a vault; the root must be an existing directory
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root)
            .map_err(|_| VaultError::NotADirectory(root.to_path_buf()))?;

        if !canonical.is_dir() {
            return Err(VaultError::NotADirectory(root.to_path_buf()));
        }

        Ok(Self { root: canonical })
    }

    /// Canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a note
    ///
    /// Any path that is invalid, escapes the root, is missing or is not a
    /// note reports `NotFound`.
    pub fn read(&self, path: &str) -> Result<Note> {
        let not_found = || VaultError::NotFound(path.to_string());

        let note_path = NotePath::parse(path).map_err(|_| not_found())?;
        if !note_path.is_note() {
            return Err(not_found());
        }

        let full = self.resolve_existing(&note_path).ok_or_else(not_found)?;
        let meta = fs::metadata(&full).map_err(|_| not_found())?;
        if !meta.is_file() {
            return Err(not_found());
        }

        let content = fs::read_to_string(&full).map_err(|source| VaultError::Io {
            path: note_path.to_string(),
            source,
        })?;
        let (frontmatter, _) = frontmatter::split(&content);

        Ok(Note {
            path: note_path.to_string(),
            metadata: NoteMetadata::from_fs(&meta),
            frontmatter,
            content,
        })
    }

    /// Write a note, creating parent directories and overwriting any
    /// existing content
    pub fn write(&self, path: &str, content: &str) -> Result<NoteMetadata> {
        let note_path = NotePath::parse(path)?;
        if !note_path.is_note() {
            return Err(VaultError::NotANote(path.to_string()));
        }

        let full = note_path.to_fs_path(&self.root);
        let io_err = |source| VaultError::Io {
            path: note_path.to_string(),
            source,
        };
        let escapes = || VaultError::from(PathError::Traversal(path.to_string()));

        if let Some(parent) = full.parent() {
            // Nothing is created until the existing part of the path is inside
            let anchor = parent
                .ancestors()
                .find(|p| fs::symlink_metadata(p).is_ok())
                .unwrap_or(self.root.as_path());
            if !self.contains(anchor) {
                return Err(escapes());
            }

            fs::create_dir_all(parent).map_err(io_err)?;
            if !self.contains(parent) {
                return Err(escapes());
            }
        }

        // Dangling symlinks fail to canonicalize and are refused too
        if fs::symlink_metadata(&full).is_ok() && !self.contains(&full) {
            return Err(escapes());
        }

        fs::write(&full, content).map_err(io_err)?;
        let meta = fs::metadata(&full).map_err(io_err)?;

        Ok(NoteMetadata::from_fs(&meta))
    }

    /// List a directory (non-recursive, sorted by name, dot-files hidden)
    pub fn list(&self, dir: &str) -> Result<Vec<DirEntry>> {
        let not_found = || VaultError::NotFound(dir.to_string());

        let dir_path = NotePath::parse(dir).map_err(|_| not_found())?;
        let full = self.resolve_existing(&dir_path).ok_or_else(not_found)?;
        if !full.is_dir() {
            return Err(not_found());
        }

        let mut entries = Vec::new();
        for (name, file_type) in read_dir_sorted(&full).map_err(|source| VaultError::Io {
            path: dir_path.to_string(),
            source,
        })? {
            if name.starts_with('.') {
                continue;
            }

            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            let path = if dir_path.is_root() {
                name.clone()
            } else {
                format!("{}/{}", dir_path, name)
            };

            entries.push(DirEntry { path, name, kind });
        }

        Ok(entries)
    }

    /// Search the memory subtree with a pattern from [`compile_query`]
    ///
    /// A note matches when the pattern matches its file name or its content.
    pub fn search(&self, pattern: &Regex) -> Result<Vec<String>> {
        self.search_under(MEMORY_DIR, pattern)
    }

    /// Search an arbitrary subtree with a precompiled pattern
    pub fn search_under(&self, subdir: &str, pattern: &Regex) -> Result<Vec<String>> {
        let mut matches = Vec::new();

        for path in self.notes_under(subdir)? {
            let name = path.rsplit('/').next().unwrap_or(&path);
            if pattern.is_match(name) {
                matches.push(path);
                continue;
            }

            let full = self.root.join(&path);
            match fs::read_to_string(&full) {
                Ok(content) if pattern.is_match(&content) => matches.push(path),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable note {}: {}", path, e),
            }
        }

        Ok(matches)
    }

    /// All notes below a subtree, depth-first in lexicographic order
    ///
    /// A missing subtree, or one that resolves outside the root, yields an
    /// empty list.
    pub fn notes_under(&self, subdir: &str) -> Result<Vec<String>> {
        let start = NotePath::parse(subdir)?;

        let mut out = Vec::new();
        match self.resolve_existing(&start) {
            Some(full) if full.is_dir() => collect_notes(&full, &start.to_string(), &mut out),
            _ => {}
        }
        Ok(out)
    }

    /// Note counts per memory category
    pub fn stats(&self) -> Result<VaultStats> {
        Ok(VaultStats {
            contexts: self.notes_under(CONTEXTS_DIR)?.len(),
            conversations: self.notes_under(CONVERSATIONS_DIR)?.len(),
            system_prompts: self.notes_under(PROMPTS_DIR)?.len(),
            projects: self.notes_under(PROJECTS_DIR)?.len(),
        })
    }

    /// Resolve a path that must already exist, refusing anything whose
    /// canonical form lies outside the root
    fn resolve_existing(&self, path: &NotePath) -> Option<PathBuf> {
        let full = path.to_fs_path(&self.root);
        let canonical = fs::canonicalize(&full).ok()?;
        canonical.starts_with(&self.root).then_some(canonical)
    }

    fn contains(&self, path: &Path) -> bool {
        fs::canonicalize(path)
            .map(|p| p.starts_with(&self.root))
            .unwrap_or(false)
    }
}

/// Compile a user query the way every scan interprets it
pub fn compile_query(query: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(query).case_insensitive(true).build()?)
}

fn read_dir_sorted(dir: &Path) -> io::Result<Vec<(String, fs::FileType)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        entries.push((entry.file_name().to_string_lossy().into_owned(), file_type));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn collect_notes(dir: &Path, rel: &str, out: &mut Vec<String>) {
    let entries = match read_dir_sorted(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return;
        }
    };

    for (name, file_type) in entries {
        let child_rel = if rel.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", rel, name)
        };

        // Symlinks are neither dirs nor files here, so scans never leave the root
        if file_type.is_dir() {
            collect_notes(&dir.join(&name), &child_rel, out);
        } else if file_type.is_file() && has_note_extension(&name) {
            out.push(child_rel);
        }
    }
}

fn has_note_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            NOTE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn vault() -> Result<(TempDir, Vault)> {
        let dir = TempDir::new()?;
        let vault = Vault::open(dir.path())?;
        Ok((dir, vault))
    }

    #[test]
    fn test_open_requires_directory() -> Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("file.md");
        fs::write(&file, "x")?;

        assert!(matches!(Vault::open(&file), Err(VaultError::NotADirectory(_))));
        assert!(matches!(
            Vault::open(dir.path().join("missing")),
            Err(VaultError::NotADirectory(_))
        ));
        Ok(())
    }

    #[test]
    fn test_write_then_read_round_trip() -> Result<()> {
        let (_dir, vault) = vault()?;
        let content = "# Hello\n\nUnicode: żółw 🐢\n";

        vault.write("AI/Memory/Contexts/Test/Note.md", content)?;
        let note = vault.read("AI/Memory/Contexts/Test/Note.md")?;

        assert_eq!(note.content, content);
        assert_eq!(note.path, "AI/Memory/Contexts/Test/Note.md");
        assert_eq!(note.metadata.size, content.len() as u64);
        assert!(note.metadata.modified.is_some());
        Ok(())
    }

    #[test]
    fn test_write_overwrites() -> Result<()> {
        let (_dir, vault) = vault()?;
        vault.write("a.md", "first")?;
        vault.write("/a.md", "second")?;
        assert_eq!(vault.read("a.md")?.content, "second");
        Ok(())
    }

    #[test]
    fn test_write_rejects_non_notes_and_traversal() -> Result<()> {
        let (_dir, vault) = vault()?;
        assert!(matches!(vault.write("image.png", "x"), Err(VaultError::NotANote(_))));
        assert!(matches!(
            vault.write("../escape.md", "x"),
            Err(VaultError::InvalidPath(_))
        ));
        Ok(())
    }

    #[test]
    fn test_read_missing_and_non_note() -> Result<()> {
        let (dir, vault) = vault()?;
        fs::write(dir.path().join("data.json"), "{}")?;

        assert!(matches!(vault.read("nope.md"), Err(VaultError::NotFound(_))));
        assert!(matches!(vault.read("data.json"), Err(VaultError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_read_traversal_is_not_found() -> Result<()> {
        let outer = TempDir::new()?;
        let root = outer.path().join("vault");
        fs::create_dir_all(&root)?;
        fs::write(outer.path().join("secret.md"), "top secret")?;

        let vault = Vault::open(&root)?;
        assert!(matches!(vault.read("../secret.md"), Err(VaultError::NotFound(_))));
        assert!(matches!(vault.read("../../etc/passwd"), Err(VaultError::NotFound(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_read_through_escaping_symlink_is_not_found() -> Result<()> {
        let outer = TempDir::new()?;
        let root = outer.path().join("vault");
        fs::create_dir_all(&root)?;
        fs::write(outer.path().join("secret.md"), "top secret")?;
        std::os::unix::fs::symlink(outer.path().join("secret.md"), root.join("link.md"))?;

        let vault = Vault::open(&root)?;
        assert!(matches!(vault.read("link.md"), Err(VaultError::NotFound(_))));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_dangling_symlink_is_refused() -> Result<()> {
        let outer = TempDir::new()?;
        let root = outer.path().join("vault");
        fs::create_dir_all(&root)?;
        let target = outer.path().join("pwned.md");
        std::os::unix::fs::symlink(&target, root.join("link.md"))?;

        let vault = Vault::open(&root)?;
        assert!(matches!(
            vault.write("link.md", "escaped"),
            Err(VaultError::InvalidPath(PathError::Traversal(_)))
        ));
        assert!(!target.exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_escaping_symlink_is_refused() -> Result<()> {
        let outer = TempDir::new()?;
        let root = outer.path().join("vault");
        fs::create_dir_all(&root)?;
        let target = outer.path().join("secret.md");
        fs::write(&target, "top secret")?;
        std::os::unix::fs::symlink(&target, root.join("link.md"))?;

        let vault = Vault::open(&root)?;
        assert!(vault.write("link.md", "overwritten").is_err());
        assert_eq!(fs::read_to_string(&target)?, "top secret");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_write_under_escaping_dir_symlink_creates_nothing_outside() -> Result<()> {
        let outer = TempDir::new()?;
        let root = outer.path().join("vault");
        let elsewhere = outer.path().join("elsewhere");
        fs::create_dir_all(&root)?;
        fs::create_dir_all(&elsewhere)?;
        std::os::unix::fs::symlink(&elsewhere, root.join("AI"))?;

        let vault = Vault::open(&root)?;
        assert!(vault.write("AI/deep/nested/x.md", "x").is_err());
        assert!(!elsewhere.join("deep").exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_scans_do_not_follow_symlinked_subtree() -> Result<()> {
        let outer = TempDir::new()?;
        let root = outer.path().join("vault");
        let elsewhere = outer.path().join("elsewhere");
        fs::create_dir_all(root.join("AI"))?;
        fs::create_dir_all(elsewhere.join("Contexts/Shared"))?;
        fs::write(elsewhere.join("secret.md"), "hunter2")?;
        fs::write(elsewhere.join("Contexts/Shared/c.md"), "x")?;
        std::os::unix::fs::symlink(&elsewhere, root.join("AI/Memory"))?;

        let vault = Vault::open(&root)?;
        assert!(vault.search(&compile_query("hunter2")?)?.is_empty());
        assert!(vault.notes_under(CONTEXTS_DIR)?.is_empty());
        assert_eq!(vault.stats()?, VaultStats::default());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_subtree_inside_root_is_scanned() -> Result<()> {
        let (dir, vault) = vault()?;
        vault.write("Archive/Memory/Contexts/Shared/c.md", "inside")?;
        fs::create_dir_all(dir.path().join("AI"))?;
        std::os::unix::fs::symlink(
            dir.path().join("Archive/Memory"),
            dir.path().join("AI/Memory"),
        )?;

        let hits = vault.search(&compile_query("inside")?)?;
        assert_eq!(hits, vec!["AI/Memory/Contexts/Shared/c.md"]);
        Ok(())
    }

    #[test]
    fn test_list_directory() -> Result<()> {
        let (_dir, vault) = vault()?;
        vault.write("AI/Memory/b.md", "b")?;
        vault.write("AI/Memory/a.md", "a")?;
        vault.write("AI/Memory/Contexts/c.md", "c")?;
        fs::write(vault.root().join("AI/Memory/.hidden"), "h")?;

        let entries = vault.list("AI/Memory")?;
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Contexts", "a.md", "b.md"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[0].path, "AI/Memory/Contexts");
        assert_eq!(entries[1].kind, EntryKind::File);

        let root = vault.list("")?;
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].path, "AI");
        Ok(())
    }

    #[test]
    fn test_list_missing_directory() -> Result<()> {
        let (_dir, vault) = vault()?;
        assert!(matches!(vault.list("does/not/exist"), Err(VaultError::NotFound(_))));
        assert!(matches!(vault.list("../.."), Err(VaultError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_search_matches_name_or_content_case_insensitive() -> Result<()> {
        let (_dir, vault) = vault()?;
        vault.write("AI/Memory/Contexts/Test/Note.md", "# Hello")?;
        vault.write("AI/Memory/Contexts/Test/hello-world.md", "nothing here")?;
        vault.write("AI/Memory/Contexts/Test/Other.md", "unrelated")?;
        // Outside the memory subtree
        vault.write("Elsewhere/Hello.md", "# Hello")?;

        let results = vault.search(&compile_query("HELLO")?)?;
        assert_eq!(
            results,
            vec![
                "AI/Memory/Contexts/Test/Note.md".to_string(),
                "AI/Memory/Contexts/Test/hello-world.md".to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_search_regex_and_order() -> Result<()> {
        let (_dir, vault) = vault()?;
        vault.write("AI/Memory/z/1.md", "timeout=30")?;
        vault.write("AI/Memory/a/2.md", "timeout=60")?;
        vault.write("AI/Memory/m.md", "timeout=90")?;

        let first = vault.search(&compile_query(r"timeout=\d0")?)?;
        let second = vault.search(&compile_query(r"timeout=\d0")?)?;
        assert_eq!(first, second);
        assert_eq!(first, vec!["AI/Memory/a/2.md", "AI/Memory/m.md", "AI/Memory/z/1.md"]);
        Ok(())
    }

    #[test]
    fn test_invalid_pattern() -> Result<()> {
        assert!(matches!(compile_query("(unclosed"), Err(VaultError::InvalidPattern(_))));
        Ok(())
    }

    #[test]
    fn test_search_without_memory_dir_is_empty() -> Result<()> {
        let (_dir, vault) = vault()?;
        assert!(vault.search(&compile_query("anything")?)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_search_ignores_non_notes() -> Result<()> {
        let (_dir, vault) = vault()?;
        fs::create_dir_all(vault.root().join(MEMORY_DIR))?;
        fs::write(vault.root().join(MEMORY_DIR).join("data.json"), "needle")?;
        vault.write("AI/Memory/n.md", "needle")?;

        assert_eq!(vault.search(&compile_query("needle")?)?, vec!["AI/Memory/n.md"]);
        Ok(())
    }

    #[test]
    fn test_search_skips_unreadable_files() -> Result<()> {
        let (_dir, vault) = vault()?;
        vault.write("AI/Memory/good.md", "needle")?;
        // Invalid UTF-8 cannot be read as text and must be skipped, not fatal
        fs::write(vault.root().join("AI/Memory/bad.md"), [0xff, 0xfe, 0x00])?;

        assert_eq!(vault.search(&compile_query("needle")?)?, vec!["AI/Memory/good.md"]);
        Ok(())
    }

    #[test]
    fn test_stats() -> Result<()> {
        let (_dir, vault) = vault()?;
        vault.write("AI/Memory/Contexts/Shared/a.md", "a")?;
        vault.write("AI/Memory/Contexts/Shared/b.md", "b")?;
        vault.write("AI/Memory/Conversations/Claude/20240101-x.md", "c")?;
        vault.write("AI/Memory/System_Prompts/Shared/p.md", "p")?;

        let stats = vault.stats()?;
        assert_eq!(
            stats,
            VaultStats {
                contexts: 2,
                conversations: 1,
                system_prompts: 1,
                projects: 0,
            }
        );
        Ok(())
    }

    #[test]
    fn test_read_exposes_frontmatter() -> Result<()> {
        let (_dir, vault) = vault()?;
        vault.write("p.md", "---\ntitle: \"Prompt\"\n---\nBody")?;
        let note = vault.read("p.md")?;
        let fm = note.frontmatter.expect("frontmatter");
        assert_eq!(fm.get("title"), Some("Prompt"));
        Ok(())
    }
}
