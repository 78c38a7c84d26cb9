//! Library index over a root storage location.
//!
//! # Responsibility
//! - Enumerate persisted notes and collections under the library root.
//! - Assign collision-free names for newly created entries.
//!
//! # Invariants
//! - `refresh` fully replaces the item list; stale entries never survive a
//!   rescan.
//! - Item order is deterministic: collections before files, names ascending.
//! - `available_name` probes the live directory, so its answer is correct
//!   even before the next `refresh`.
//!
//! # See also
//! - docs/architecture/persistence.md

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Extension carried by persisted note files.
pub const NOTE_FILE_EXTENSION: &str = "sk";

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Library enumeration/creation failure.
#[derive(Debug)]
pub enum LibraryError {
    /// A collection with the requested name already exists.
    AlreadyExists(String),
    /// Underlying filesystem failure.
    Io(std::io::Error),
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists(name) => write!(f, "collection already exists: `{name}`"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LibraryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyExists(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Classification of one enumerated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryItemKind {
    /// A persisted note file.
    File,
    /// A named grouping directory with no document content of its own.
    Collection,
}

/// One enumerated library entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Entry name as shown to the user (file stem for notes).
    pub name: String,
    pub kind: LibraryItemKind,
}

/// Index of persisted notes/collections under one root location.
///
/// The library owns the enumerated item list only; opened note files are
/// owned by the session layer above it.
#[derive(Debug)]
pub struct Library {
    base_path: PathBuf,
    items: Vec<LibraryItem>,
}

impl Library {
    /// Library over `base_path`. No scan happens until `initialize` or
    /// `refresh` is called.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            items: Vec::new(),
        }
    }

    /// Creates the root location when missing, then scans it.
    pub fn initialize(&mut self) -> LibraryResult<()> {
        std::fs::create_dir_all(&self.base_path)?;
        self.refresh()
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Items from the most recent scan.
    pub fn items(&self) -> &[LibraryItem] {
        &self.items
    }

    /// Rescans the root and replaces the item list.
    ///
    /// Safe to call after any external mutation; the previous list is
    /// discarded wholesale.
    pub fn refresh(&mut self) -> LibraryResult<()> {
        let started_at = Instant::now();
        let mut items = Vec::new();

        let entries = match std::fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(err) => {
                error!(
                    "event=library_refresh module=library status=error root={} error={}",
                    self.base_path.display(),
                    err
                );
                return Err(err.into());
            }
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                items.push(LibraryItem {
                    path,
                    name,
                    kind: LibraryItemKind::Collection,
                });
            } else if path.extension().and_then(|ext| ext.to_str()) == Some(NOTE_FILE_EXTENSION) {
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                items.push(LibraryItem {
                    path,
                    name,
                    kind: LibraryItemKind::File,
                });
            }
        }

        items.sort_by(|a, b| {
            let rank = |item: &LibraryItem| match item.kind {
                LibraryItemKind::Collection => 0u8,
                LibraryItemKind::File => 1u8,
            };
            rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
        });

        self.items = items;
        info!(
            "event=library_refresh module=library status=ok root={} items={} duration_ms={}",
            self.base_path.display(),
            self.items.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// First free name among `base`, `base_2`, `base_3`, ... in `dir`.
    ///
    /// Collisions are rare (note stems derive from UUIDs), so a linear probe
    /// is deliberate; the answer is deterministic for a given directory
    /// snapshot and never a name that snapshot already contains.
    pub fn available_name(&self, dir: &Path, base: &str, extension: Option<&str>) -> String {
        if !dir.join(join_extension(base, extension)).exists() {
            return base.to_string();
        }
        let mut counter = 2u32;
        loop {
            let candidate = format!("{base}_{counter}");
            if !dir.join(join_extension(&candidate, extension)).exists() {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Creates a new empty collection directory under the root.
    ///
    /// The item list is not refreshed implicitly; callers refresh once their
    /// batch of mutations is done.
    pub fn create_collection(&self, name: &str) -> LibraryResult<PathBuf> {
        let path = self.base_path.join(name);
        match std::fs::create_dir(&path) {
            Ok(()) => {
                info!(
                    "event=collection_create module=library status=ok name={}",
                    name
                );
                Ok(path)
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(LibraryError::AlreadyExists(name.to_string()))
            }
            Err(err) => {
                error!(
                    "event=collection_create module=library status=error name={} error={}",
                    name, err
                );
                Err(err.into())
            }
        }
    }
}

fn join_extension(name: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::join_extension;

    #[test]
    fn join_extension_handles_both_shapes() {
        assert_eq!(join_extension("note", Some("sk")), "note.sk");
        assert_eq!(join_extension("group", None), "group");
    }
}
