//! Editing session: open-document bookkeeping and save/load orchestration.
//!
//! # Responsibility
//! - Track which note files are open and which one is active.
//! - Route every save/load through the host bridge, selecting the codec by
//!   container framing on load and always writing the archived format.
//!
//! # Invariants
//! - One path is never open twice: `open` returns the existing registration.
//! - A failed or cancelled save leaves the in-memory note unchanged and a
//!   never-saved file's `path` still `None`; the operation is retryable.
//! - On-disk replacement is atomic (temp write, then rename); a failed save
//!   never truncates the previous version.
//!
//! # See also
//! - docs/architecture/persistence.md

use crate::archive::{self, ArchiveError};
use crate::codec::{Codec, CodecError, LegacyCodec};
use crate::id::uuid_to_base32;
use crate::library::{Library, LibraryError, NOTE_FILE_EXTENSION};
use crate::model::head::NoteHead;
use crate::model::note::Note;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// Stable in-memory identifier for one open note file.
pub type NoteFileId = Uuid;

pub type SessionResult<T> = Result<T, SessionError>;

/// Save/load orchestration failure.
#[derive(Debug)]
pub enum SessionError {
    /// The user dismissed a path dialog; nothing was written or changed.
    Cancelled,
    /// Bridge read/write/dialog failure.
    Io(std::io::Error),
    /// Container packing/unpacking failure.
    Archive(ArchiveError),
    /// Legacy text decode failure.
    Codec(CodecError),
    /// Library bookkeeping failure during note creation.
    Library(LibraryError),
    /// The id does not name an open note file.
    UnknownNoteFile(NoteFileId),
    /// `save_active` was called with no active note file.
    NoActiveNote,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Archive(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Library(err) => write!(f, "{err}"),
            Self::UnknownNoteFile(id) => write!(f, "no open note file with id {id}"),
            Self::NoActiveNote => write!(f, "no active note file"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cancelled => None,
            Self::Io(err) => Some(err),
            Self::Archive(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Library(err) => Some(err),
            Self::UnknownNoteFile(_) => None,
            Self::NoActiveNote => None,
        }
    }
}

impl From<ArchiveError> for SessionError {
    fn from(value: ArchiveError) -> Self {
        Self::Archive(value)
    }
}

impl From<CodecError> for SessionError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<LibraryError> for SessionError {
    fn from(value: LibraryError) -> Self {
        Self::Library(value)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Host-provided file and dialog surface.
///
/// The core treats these as reliable primitives; any failure surfaces as an
/// `Io` session error. Dialog methods return `Ok(None)` when the user
/// dismisses the prompt.
pub trait Bridge {
    fn read_binary(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    fn write_binary(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;
    fn choose_save_path(&self) -> std::io::Result<Option<PathBuf>>;
    fn choose_open_path(&self) -> std::io::Result<Option<PathBuf>>;
}

/// Direct-filesystem bridge for hosts without a dialog surface.
///
/// Writes replace atomically: bytes land in a sibling temp file first, then
/// rename over the target, so a failed save never clobbers the previous
/// version.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsBridge;

impl Bridge for FsBridge {
    fn read_binary(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_binary(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, bytes)?;
        std::fs::rename(&temp, path).inspect_err(|_| {
            let _ = std::fs::remove_file(&temp);
        })
    }

    fn choose_save_path(&self) -> std::io::Result<Option<PathBuf>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no dialog surface attached",
        ))
    }

    fn choose_open_path(&self) -> std::io::Result<Option<PathBuf>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no dialog surface attached",
        ))
    }
}

/// One open note and where it lives on disk.
#[derive(Debug)]
pub struct NoteFile {
    /// Stable in-memory id used by tab/session bookkeeping. Not persisted.
    pub id: NoteFileId,
    /// `None` until the first successful save assigns a location.
    pub path: Option<PathBuf>,
    pub note: Note,
}

impl NoteFile {
    pub fn new(path: Option<PathBuf>, note: Note) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            note,
        }
    }
}

/// Registry of open note files and the active one.
///
/// Replaces process-global "current note" state: every operation takes the
/// session by reference and addresses notes by id.
pub struct Session<B: Bridge> {
    bridge: B,
    open_files: Vec<NoteFile>,
    active: Option<NoteFileId>,
}

impl<B: Bridge> Session<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            open_files: Vec::new(),
            active: None,
        }
    }

    /// Open note files in registration (tab) order.
    pub fn open_files(&self) -> &[NoteFile] {
        &self.open_files
    }

    /// The active note file, when any is open.
    pub fn active(&self) -> Option<&NoteFile> {
        self.active.and_then(|id| self.note_file(id))
    }

    pub fn note_file(&self, id: NoteFileId) -> Option<&NoteFile> {
        self.open_files.iter().find(|file| file.id == id)
    }

    /// Mutable access for editing the note of an open file.
    pub fn note_file_mut(&mut self, id: NoteFileId) -> Option<&mut NoteFile> {
        self.open_files.iter_mut().find(|file| file.id == id)
    }

    /// Id of the open file persisted at `path`, if any.
    pub fn find_by_path(&self, path: &Path) -> Option<NoteFileId> {
        self.open_files
            .iter()
            .find(|file| file.path.as_deref() == Some(path))
            .map(|file| file.id)
    }

    /// Registers an in-memory note file (e.g. the initial scratch note) and
    /// makes it active.
    pub fn adopt(&mut self, file: NoteFile) -> NoteFileId {
        let id = file.id;
        self.open_files.push(file);
        self.active = Some(id);
        id
    }

    /// Makes an open file active.
    pub fn activate(&mut self, id: NoteFileId) -> SessionResult<()> {
        if self.note_file(id).is_none() {
            return Err(SessionError::UnknownNoteFile(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Opens the note persisted at `path`, or returns the already-open
    /// registration for it. Either way the file becomes active.
    pub fn open(&mut self, path: &Path) -> SessionResult<NoteFileId> {
        if let Some(id) = self.find_by_path(path) {
            self.active = Some(id);
            return Ok(id);
        }

        let started_at = Instant::now();
        let bytes = self.bridge.read_binary(path).map_err(|err| {
            error!(
                "event=note_open module=session status=error path={} error={}",
                path.display(),
                err
            );
            SessionError::Io(err)
        })?;

        // Container framing picks the pipeline; content is never sniffed.
        let note = if archive::is_archive(&bytes) {
            archive::unpack(&bytes)?
        } else {
            let text = String::from_utf8(bytes).map_err(|_| {
                SessionError::Codec(CodecError::InvalidDocument(
                    "legacy note file is not UTF-8".to_string(),
                ))
            })?;
            LegacyCodec.decode(&text)?
        };

        info!(
            "event=note_open module=session status=ok path={} blocks={} duration_ms={}",
            path.display(),
            note.len(),
            started_at.elapsed().as_millis()
        );

        Ok(self.adopt(NoteFile::new(Some(path.to_path_buf()), note)))
    }

    /// Opens a note picked through the host's open dialog.
    pub fn open_via_dialog(&mut self) -> SessionResult<NoteFileId> {
        match self.bridge.choose_open_path()? {
            Some(path) => self.open(&path),
            None => Err(SessionError::Cancelled),
        }
    }

    /// Saves an open file, asking the bridge for a path on first save.
    ///
    /// The path is recorded only after the bytes are fully written, so any
    /// failure leaves a never-saved file with `path == None` and the note
    /// untouched.
    pub fn save(&mut self, id: NoteFileId) -> SessionResult<()> {
        let index = self
            .open_files
            .iter()
            .position(|file| file.id == id)
            .ok_or(SessionError::UnknownNoteFile(id))?;

        let target = match &self.open_files[index].path {
            Some(path) => path.clone(),
            None => match self.bridge.choose_save_path()? {
                Some(path) => path,
                None => return Err(SessionError::Cancelled),
            },
        };

        let started_at = Instant::now();
        let bytes = archive::pack(&self.open_files[index].note)?;
        self.bridge.write_binary(&target, &bytes).map_err(|err| {
            error!(
                "event=note_save module=session status=error path={} error={}",
                target.display(),
                err
            );
            SessionError::Io(err)
        })?;
        self.open_files[index].path = Some(target.clone());

        info!(
            "event=note_save module=session status=ok path={} bytes={} duration_ms={}",
            target.display(),
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Saves the active note file.
    pub fn save_active(&mut self) -> SessionResult<()> {
        match self.active {
            Some(id) => self.save(id),
            None => Err(SessionError::NoActiveNote),
        }
    }

    /// Creates, persists and opens a fresh note under the library root.
    ///
    /// The filename stem derives from a new UUID, so collisions are not
    /// probed for; the stem doubles as the initial title.
    pub fn new_note(&mut self, library: &mut Library) -> SessionResult<NoteFileId> {
        let stem = uuid_to_base32(Uuid::new_v4());
        let note = Note::new(NoteHead::with_title(stem.as_str()));
        self.persist_new(library, stem, note)
    }

    /// As `new_note`, but pre-seeding head metadata fetched by the host
    /// (title/description/image for notes created from a URL).
    pub fn new_note_from_meta(
        &mut self,
        library: &mut Library,
        title: &str,
        description: &str,
        image_url: &str,
    ) -> SessionResult<NoteFileId> {
        let stem = uuid_to_base32(Uuid::new_v4());
        let mut head = NoteHead::with_title(title);
        head.set("description", description);
        head.set("imageURL", image_url);
        self.persist_new(library, stem, Note::new(head))
    }

    fn persist_new(
        &mut self,
        library: &mut Library,
        stem: String,
        note: Note,
    ) -> SessionResult<NoteFileId> {
        let path = library
            .base_path()
            .join(format!("{stem}.{NOTE_FILE_EXTENSION}"));
        let bytes = archive::pack(&note)?;
        self.bridge.write_binary(&path, &bytes)?;
        library.refresh()?;

        info!(
            "event=note_create module=session status=ok path={}",
            path.display()
        );
        Ok(self.adopt(NoteFile::new(Some(path), note)))
    }

    /// Drops an open registration. The persisted file is untouched.
    ///
    /// When the closed file was active, activation falls back to the file
    /// before it in tab order, or to none for the first tab.
    pub fn close(&mut self, id: NoteFileId) -> SessionResult<()> {
        let index = self
            .open_files
            .iter()
            .position(|file| file.id == id)
            .ok_or(SessionError::UnknownNoteFile(id))?;

        let previous = (index > 0).then(|| self.open_files[index - 1].id);
        self.open_files.remove(index);
        if self.active == Some(id) {
            self.active = previous;
        }
        Ok(())
    }
}
