//! Structured-note domain model.
//!
//! # Responsibility
//! - Define the block-tree data shapes shared by codecs, archive and session.
//! - Own the index-addressed mutation API that all editing goes through.
//!
//! # Invariants
//! - Every block and list item carries a stable id assigned at creation.
//! - `modified >= created` for content stamped by this crate.
//! - Body order is the sole addressing mechanism; only `Note` reorders it.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod block;
pub mod embedded;
pub mod head;
pub mod note;
