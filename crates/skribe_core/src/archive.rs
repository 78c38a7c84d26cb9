//! Archive packager: one note plus its resources in a single container.
//!
//! # Responsibility
//! - Pack a note into a ZIP container: the SKML text under a reserved entry
//!   name, then one entry per embedded resource keyed by filename.
//! - Unpack a container back into a note with its resource set attached.
//!
//! # Invariants
//! - The container directory never has two entries with one name; the note's
//!   `DuplicateFilename` check reserves the text entry name up front.
//! - A resource referenced by an image block but absent from the container is
//!   tolerated on unpack; only a missing or unreadable text entry is fatal.
//! - Containers are recognized by ZIP framing bytes, never by content
//!   sniffing.
//!
//! # See also
//! - docs/architecture/persistence.md

use crate::codec::{Codec, CodecError, SkmlCodec};
use crate::model::embedded::EmbeddedFile;
use crate::model::note::Note;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Cursor, Read, Write};
use std::time::Instant;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Reserved container entry holding the serialized note text.
pub const NOTE_ENTRY_NAME: &str = "note.skml";

/// ZIP local-file-header magic used for container framing detection.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Packing/unpacking failure.
#[derive(Debug)]
pub enum ArchiveError {
    /// The container is unreadable or its text entry is missing/broken.
    CorruptArchive(String),
    /// The text entry was readable but its document failed to decode.
    Codec(CodecError),
    /// Container transport failure.
    Zip(zip::result::ZipError),
    /// Byte-level I/O failure inside the container streams.
    Io(std::io::Error),
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CorruptArchive(message) => write!(f, "corrupt archive: {message}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Zip(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CorruptArchive(_) => None,
            Self::Codec(err) => Some(err),
            Self::Zip(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<CodecError> for ArchiveError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Zip(value)
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Whether `bytes` carry the container framing.
///
/// Legacy plain-text note files fail this check and take the legacy codec
/// path instead.
pub fn is_archive(bytes: &[u8]) -> bool {
    bytes.starts_with(&ZIP_MAGIC)
}

/// Packs a note and its resources into container bytes.
///
/// The text entry is always written first; resource entries follow in
/// registration order.
pub fn pack(note: &Note) -> ArchiveResult<Vec<u8>> {
    let started_at = Instant::now();
    let text = SkmlCodec.encode(note)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(NOTE_ENTRY_NAME, options)?;
    writer.write_all(text.as_bytes())?;

    for file in note.files() {
        writer.start_file(file.filename.as_str(), options)?;
        writer.write_all(&file.data)?;
    }

    let bytes = writer.finish()?.into_inner();
    debug!(
        "event=archive_pack module=archive status=ok entries={} bytes={} duration_ms={}",
        note.files().len() + 1,
        bytes.len(),
        started_at.elapsed().as_millis()
    );
    Ok(bytes)
}

/// Unpacks container bytes into a note with its resource set attached.
pub fn unpack(bytes: &[u8]) -> ArchiveResult<Note> {
    let started_at = Instant::now();
    let mut container = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| ArchiveError::CorruptArchive(format!("unreadable container: {err}")))?;

    let text = {
        let mut entry = container.by_name(NOTE_ENTRY_NAME).map_err(|_| {
            ArchiveError::CorruptArchive(format!("missing `{NOTE_ENTRY_NAME}` entry"))
        })?;
        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(|err| {
            ArchiveError::CorruptArchive(format!("unreadable `{NOTE_ENTRY_NAME}` entry: {err}"))
        })?;
        text
    };

    let mut note = SkmlCodec.decode(&text)?;

    for index in 0..container.len() {
        let mut entry = container.by_index(index)?;
        if entry.is_dir() || entry.name() == NOTE_ENTRY_NAME {
            continue;
        }
        let name = entry.name().to_string();
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        note.add_file(EmbeddedFile::new(name.clone(), data)).map_err(|_| {
            ArchiveError::CorruptArchive(format!("duplicate resource entry `{name}`"))
        })?;
    }

    info!(
        "event=archive_unpack module=archive status=ok blocks={} resources={} duration_ms={}",
        note.len(),
        note.files().len(),
        started_at.elapsed().as_millis()
    );
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::{is_archive, pack, unpack, ArchiveError, NOTE_ENTRY_NAME};
    use crate::model::block::Block;
    use crate::model::embedded::EmbeddedFile;
    use crate::model::head::NoteHead;
    use crate::model::note::Note;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn note_with_two_resources() -> Note {
        let mut note = Note::new(NoteHead::with_title("packed"));
        note.insert(0, Block::image("a.png")).unwrap();
        note.add_file(EmbeddedFile::new(
            "a.png",
            b"\x89PNG\r\n\x1a\x0adata".to_vec(),
        ))
        .unwrap();
        note.add_file(EmbeddedFile::new("b.bin", vec![9, 9, 9])).unwrap();
        note
    }

    #[test]
    fn pack_then_unpack_preserves_resources_bit_exactly() {
        let note = note_with_two_resources();
        let bytes = pack(&note).unwrap();
        assert!(is_archive(&bytes));

        let unpacked = unpack(&bytes).unwrap();
        assert_eq!(unpacked.files().len(), 2);
        let a = unpacked.file("a.png").unwrap();
        assert_eq!(a.data, b"\x89PNG\r\n\x1a\x0adata".to_vec());
        assert_eq!(a.media_type, "image/png");
        assert_eq!(unpacked.file("b.bin").unwrap().data, vec![9, 9, 9]);
    }

    #[test]
    fn unpack_tolerates_a_dangling_image_reference() {
        let mut note = Note::new(NoteHead::new());
        note.insert(0, Block::image("gone.png")).unwrap();

        let unpacked = unpack(&pack(&note).unwrap()).unwrap();
        assert_eq!(unpacked.len(), 1);
        assert!(unpacked.file("gone.png").is_none());
    }

    #[test]
    fn unpack_rejects_a_container_without_the_text_entry() {
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("stray.bin", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&[1, 2, 3]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            unpack(&bytes),
            Err(ArchiveError::CorruptArchive(_))
        ));
    }

    #[test]
    fn unpack_rejects_non_container_bytes() {
        assert!(matches!(
            unpack(b"<skml><head></head><body></body></skml>"),
            Err(ArchiveError::CorruptArchive(_))
        ));
    }

    #[test]
    fn plain_text_is_not_mistaken_for_a_container() {
        assert!(!is_archive(b"<xml><head></head><body></body></xml>"));
        assert!(!is_archive(b""));
    }

    #[test]
    fn the_text_entry_name_is_reserved_for_the_note() {
        let mut note = Note::new(NoteHead::new());
        let err = note
            .add_file(EmbeddedFile::new(NOTE_ENTRY_NAME, vec![0]))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::model::note::NoteError::DuplicateFilename(_)
        ));
    }
}
