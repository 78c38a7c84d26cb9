//! Note container and its index-addressed mutation API.
//!
//! # Responsibility
//! - Own the ordered block body, the metadata head and the resource set.
//! - Provide the only sanctioned mutation paths over the body.
//!
//! # Invariants
//! - Indices are validated on every call; a stale index from a lagging view
//!   yields `OutOfRange`, never a panic or silent clamp.
//! - Each mutation changes the addressed sequence length by exactly one.
//! - A failed `add_file` leaves the resource set untouched.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::archive::NOTE_ENTRY_NAME;
use crate::model::block::{Block, ListItem};
use crate::model::embedded::EmbeddedFile;
use crate::model::head::{NoteHead, PropertyValue};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type NoteResult<T> = Result<T, NoteError>;

/// Mutation failure over a note body or resource set.
#[derive(Debug, PartialEq, Eq)]
pub enum NoteError {
    /// Index does not address a valid slot in the targeted sequence.
    OutOfRange { index: usize, len: usize },
    /// A list-item operation addressed a block that is not a list.
    NotAList { index: usize },
    /// Resource name already registered (or reserved by the container).
    DuplicateFilename(String),
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::NotAList { index } => write!(f, "block at index {index} is not a list"),
            Self::DuplicateFilename(name) => write!(f, "duplicate embedded filename `{name}`"),
        }
    }
}

impl Error for NoteError {}

/// One structured note: metadata head, ordered block body, resource set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Key/value metadata. Its own API only upserts, so direct access is
    /// safe to expose.
    pub head: NoteHead,
    body: Vec<Block>,
    files: Vec<EmbeddedFile>,
}

impl Note {
    /// Empty note under the given head.
    pub fn new(head: NoteHead) -> Self {
        Self {
            head,
            body: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Rebuilds a note from decoded parts. Used by codecs; not a mutation
    /// path.
    pub fn from_parts(head: NoteHead, body: Vec<Block>) -> Self {
        Self {
            head,
            body,
            files: Vec::new(),
        }
    }

    /// Read view of the body.
    pub fn blocks(&self) -> &[Block] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Block at `index`, if occupied.
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.body.get(index)
    }

    /// Mutable block access for in-place content edits. Reordering still has
    /// to go through `insert`/`remove`.
    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.body.get_mut(index)
    }

    /// Inserts `block` before the element currently at `index`;
    /// `index == len` appends.
    pub fn insert(&mut self, index: usize, block: Block) -> NoteResult<()> {
        if index > self.body.len() {
            return Err(NoteError::OutOfRange {
                index,
                len: self.body.len(),
            });
        }
        self.body.insert(index, block);
        Ok(())
    }

    /// Deletes and returns the block at `index`.
    pub fn remove(&mut self, index: usize) -> NoteResult<Block> {
        if index >= self.body.len() {
            return Err(NoteError::OutOfRange {
                index,
                len: self.body.len(),
            });
        }
        Ok(self.body.remove(index))
    }

    /// Inserts `item` into the list block at `list_index`, before the item
    /// currently at `item_index`.
    pub fn insert_list_item(
        &mut self,
        list_index: usize,
        item_index: usize,
        item: ListItem,
    ) -> NoteResult<()> {
        let items = self.list_items_mut(list_index)?;
        if item_index > items.len() {
            return Err(NoteError::OutOfRange {
                index: item_index,
                len: items.len(),
            });
        }
        items.insert(item_index, item);
        Ok(())
    }

    /// Deletes and returns the item at `item_index` of the list block at
    /// `list_index`.
    pub fn remove_list_item(&mut self, list_index: usize, item_index: usize) -> NoteResult<ListItem> {
        let items = self.list_items_mut(list_index)?;
        if item_index >= items.len() {
            return Err(NoteError::OutOfRange {
                index: item_index,
                len: items.len(),
            });
        }
        Ok(items.remove(item_index))
    }

    fn list_items_mut(&mut self, list_index: usize) -> NoteResult<&mut Vec<ListItem>> {
        let len = self.body.len();
        let block = self
            .body
            .get_mut(list_index)
            .ok_or(NoteError::OutOfRange {
                index: list_index,
                len,
            })?;
        if !block.is_list() {
            return Err(NoteError::NotAList { index: list_index });
        }
        Ok(&mut block.items)
    }

    /// Registers an embedded resource under the note.
    ///
    /// Fails when the filename is already registered or collides with the
    /// container's reserved text entry; the caller must rename first.
    pub fn add_file(&mut self, file: EmbeddedFile) -> NoteResult<()> {
        if file.filename == NOTE_ENTRY_NAME || self.file(&file.filename).is_some() {
            return Err(NoteError::DuplicateFilename(file.filename));
        }
        self.files.push(file);
        Ok(())
    }

    /// Read view of the resource set.
    pub fn files(&self) -> &[EmbeddedFile] {
        &self.files
    }

    /// Name-based resource lookup, the render-time resolution for image
    /// blocks. `None` is a tolerated dangling reference.
    pub fn file(&self, filename: &str) -> Option<&EmbeddedFile> {
        self.files.iter().find(|file| file.filename == filename)
    }

    /// Unconditional head upsert; value content is not validated.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.head.set(key, value);
    }
}
