//! Serialization codecs for the two on-disk text schemas.
//!
//! # Responsibility
//! - Define the `Codec` capability both schema generations implement.
//! - Share the low-level tree reading/writing helpers between them.
//!
//! # Invariants
//! - Encoding is a deterministic pure function of (head, body): stable key
//!   order is head insertion order, stable block order is body order, so
//!   save-load-save is byte-identical for an unmodified note.
//! - Decoding never returns a partial note; the first malformed timestamp or
//!   broken tree fails the whole document.
//! - Unknown body tags are skipped, not errors, so newer writers stay
//!   readable by older readers.
//!
//! # See also
//! - docs/architecture/persistence.md

use crate::model::block::now_ms;
use crate::model::note::Note;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod legacy;
pub mod skml;

pub use legacy::LegacyCodec;
pub use skml::SkmlCodec;

pub type CodecResult<T> = Result<T, CodecError>;

/// Decode/encode failure for either schema.
#[derive(Debug)]
pub enum CodecError {
    /// Structurally broken tree or unparseable timestamp. The document as a
    /// whole is rejected.
    InvalidDocument(String),
    /// XML transport failure from the underlying reader.
    Xml(quick_xml::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDocument(message) => write!(f, "invalid document: {message}"),
            Self::Xml(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDocument(_) => None,
            Self::Xml(err) => Some(err),
        }
    }
}

impl From<quick_xml::Error> for CodecError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value)
    }
}

/// Text serialization capability shared by both schema generations.
///
/// The loader selects an implementation by container framing; the saver
/// always uses the newer schema.
pub trait Codec {
    /// Serializes a note to schema text. Deterministic for identical input.
    fn encode(&self, note: &Note) -> CodecResult<String>;

    /// Parses schema text into a note. All-or-nothing: errors never yield a
    /// half-built note.
    fn decode(&self, text: &str) -> CodecResult<Note>;
}

// Shared writer helpers. Both schemas assemble their output directly; the
// element grammar is flat enough that an event writer would only obscure the
// byte-for-byte shape the round-trip tests pin down.

pub(crate) fn write_text(out: &mut String, text: &str) {
    out.push_str(&escape(text));
}

pub(crate) fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

pub(crate) fn write_timestamps(out: &mut String, created: i64, modified: i64) {
    write_attr(out, "created", &created.to_string());
    write_attr(out, "modified", &modified.to_string());
}

// Shared reader helpers over `quick_xml::Reader`.

pub(crate) fn tag_name(start: &BytesStart<'_>) -> CodecResult<String> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(|_| CodecError::InvalidDocument("non UTF-8 element name".to_string()))
}

/// Integer attribute, or `None` when absent. Present-but-malformed values
/// reject the document.
pub(crate) fn attr_i64(start: &BytesStart<'_>, name: &str) -> CodecResult<Option<i64>> {
    match attr_string(start, name)? {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| {
                CodecError::InvalidDocument(format!("attribute `{name}` is not an integer: `{raw}`"))
            }),
        None => Ok(None),
    }
}

/// Timestamp attribute with the documented default: absent means "now".
pub(crate) fn attr_timestamp(start: &BytesStart<'_>, name: &str) -> CodecResult<i64> {
    Ok(attr_i64(start, name)?.unwrap_or_else(now_ms))
}

pub(crate) fn attr_string(start: &BytesStart<'_>, name: &str) -> CodecResult<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| {
            CodecError::InvalidDocument(format!("malformed attribute: {err}"))
        })?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| CodecError::InvalidDocument(format!("bad attribute value: {err}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Collects the text content of the element just opened, up to its end tag.
///
/// Child elements are not part of this grammar inside content elements, so
/// encountering one rejects the document.
pub(crate) fn read_element_text(reader: &mut Reader<&[u8]>, element: &str) -> CodecResult<String> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(
                &t.unescape()
                    .map_err(|err| CodecError::InvalidDocument(format!("bad text content: {err}")))?,
            ),
            Event::CData(raw) => {
                let chunk = std::str::from_utf8(&raw).map_err(|_| {
                    CodecError::InvalidDocument(format!("non UTF-8 CDATA inside `{element}`"))
                })?;
                text.push_str(chunk);
            }
            Event::Comment(_) | Event::PI(_) => {}
            Event::End(_) => return Ok(text),
            Event::Start(child) => {
                let child = tag_name(&child)?;
                return Err(CodecError::InvalidDocument(format!(
                    "unexpected element `{child}` inside `{element}`"
                )));
            }
            Event::Empty(child) => {
                let child = tag_name(&child)?;
                return Err(CodecError::InvalidDocument(format!(
                    "unexpected element `{child}` inside `{element}`"
                )));
            }
            Event::Eof => {
                return Err(CodecError::InvalidDocument(format!(
                    "unterminated `{element}` element"
                )))
            }
            Event::Decl(_) | Event::DocType(_) => {
                return Err(CodecError::InvalidDocument(format!(
                    "unexpected markup inside `{element}`"
                )))
            }
        }
    }
}

/// Decodes the `head` element whose start tag was just consumed.
///
/// When `typed_timestamp_keys` is set (the revised schema), the well-known
/// `created`/`modified` keys are materialized as integers; all other values
/// stay text. Encoding always writes text, so this is a one-way asymmetry.
pub(crate) fn decode_head(
    reader: &mut Reader<&[u8]>,
    typed_timestamp_keys: bool,
) -> CodecResult<crate::model::head::NoteHead> {
    use crate::model::head::{NoteHead, HEAD_CREATED_KEY, HEAD_MODIFIED_KEY};

    let mut head = NoteHead::new();
    loop {
        let (key, value) = match reader.read_event()? {
            Event::Start(start) => {
                let key = tag_name(&start)?;
                let value = read_element_text(reader, &key)?;
                (key, value)
            }
            Event::Empty(start) => (tag_name(&start)?, String::new()),
            Event::End(_) => return Ok(head),
            Event::Text(_) | Event::CData(_) | Event::Comment(_) | Event::PI(_) => continue,
            Event::Eof => {
                return Err(CodecError::InvalidDocument(
                    "unterminated `head` element".to_string(),
                ))
            }
            other => {
                return Err(CodecError::InvalidDocument(format!(
                    "unexpected markup inside `head`: {other:?}"
                )))
            }
        };

        if typed_timestamp_keys && (key == HEAD_CREATED_KEY || key == HEAD_MODIFIED_KEY) {
            let parsed = value.trim().parse::<i64>().map_err(|_| {
                CodecError::InvalidDocument(format!(
                    "head property `{key}` is not an integer: `{value}`"
                ))
            })?;
            head.set(key, parsed);
        } else {
            head.set(key, value);
        }
    }
}

/// Skips the element just opened, including any nested children.
pub(crate) fn skip_element(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> CodecResult<()> {
    reader.read_to_end(start.name())?;
    Ok(())
}

/// Finds the document root and verifies its name matches the schema.
pub(crate) fn expect_root(reader: &mut Reader<&[u8]>, root: &str) -> CodecResult<()> {
    loop {
        match reader.read_event()? {
            Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Text(t) if is_blank(&t) => {}
            Event::Start(start) => {
                let name = tag_name(&start)?;
                if name != root {
                    return Err(CodecError::InvalidDocument(format!(
                        "expected root `{root}`, found `{name}`"
                    )));
                }
                return Ok(());
            }
            Event::Eof => {
                return Err(CodecError::InvalidDocument(format!(
                    "missing root `{root}` element"
                )))
            }
            other => {
                return Err(CodecError::InvalidDocument(format!(
                    "unexpected content before root: {other:?}"
                )))
            }
        }
    }
}

pub(crate) fn is_blank(text: &quick_xml::events::BytesText<'_>) -> bool {
    text.iter().all(|byte| byte.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use super::{attr_i64, write_attr, write_text};
    use quick_xml::events::BytesStart;

    #[test]
    fn write_text_escapes_markup_characters() {
        let mut out = String::new();
        write_text(&mut out, "a < b & c");
        assert_eq!(out, "a &lt; b &amp; c");
    }

    #[test]
    fn write_attr_quotes_and_escapes() {
        let mut out = String::new();
        write_attr(&mut out, "language", "c\"sharp\"");
        assert_eq!(out, " language=\"c&quot;sharp&quot;\"");
    }

    #[test]
    fn attr_i64_rejects_non_integer_values() {
        let mut start = BytesStart::new("p");
        start.push_attribute(("created", "soon"));
        assert!(attr_i64(&start, "created").is_err());
    }

    #[test]
    fn attr_i64_is_none_when_absent() {
        let start = BytesStart::new("p");
        assert_eq!(attr_i64(&start, "created").unwrap(), None);
    }
}
