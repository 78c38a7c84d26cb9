//! Core domain logic for Skribe structured notes.
//! This crate is the single source of truth for document invariants.

pub mod archive;
pub mod codec;
pub mod id;
pub mod library;
pub mod logging;
pub mod model;
pub mod session;

pub use archive::{is_archive, pack, unpack, ArchiveError, ArchiveResult, NOTE_ENTRY_NAME};
pub use codec::{Codec, CodecError, CodecResult, LegacyCodec, SkmlCodec};
pub use id::uuid_to_base32;
pub use library::{
    Library, LibraryError, LibraryItem, LibraryItemKind, LibraryResult, NOTE_FILE_EXTENSION,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::block::{Block, BlockId, BlockKind, ListItem};
pub use model::embedded::{sniff_media_type, EmbeddedFile};
pub use model::head::{NoteHead, PropertyValue};
pub use model::note::{Note, NoteError, NoteResult};
pub use session::{Bridge, FsBridge, NoteFile, NoteFileId, Session, SessionError, SessionResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
