//! Legacy `<xml>` schema, the format that predates list support.
//!
//! # Responsibility
//! - Read note files written before the revised schema existed.
//! - Re-encode list-free notes bit-compatibly with the old writer.
//!
//! # Invariants
//! - List blocks have no representation here and are dropped at encode time.
//!   This is documented lossy behavior carried over from the old writer, not
//!   an error path.
//! - Head values always decode as text; this schema has no typed keys.

use crate::codec::{
    attr_string, attr_timestamp, decode_head, expect_root, is_blank, read_element_text,
    skip_element, tag_name, write_attr, write_text, write_timestamps, Codec, CodecError,
    CodecResult,
};
use crate::model::block::{Block, BlockKind};
use crate::model::head::NoteHead;
use crate::model::note::Note;
use quick_xml::events::Event;
use quick_xml::Reader;

const ROOT_TAG: &str = "xml";

/// Codec for the legacy schema. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyCodec;

impl Codec for LegacyCodec {
    fn encode(&self, note: &Note) -> CodecResult<String> {
        let mut out = String::new();
        out.push_str("<xml><head>");
        for (key, value) in note.head.iter() {
            out.push('<');
            out.push_str(key);
            out.push('>');
            write_text(&mut out, &value.to_text());
            out.push_str("</");
            out.push_str(key);
            out.push('>');
        }
        out.push_str("</head><body>");
        for block in note.blocks() {
            // Lists are not representable in this schema; skipped.
            if block.is_list() {
                continue;
            }
            let tag = block.kind.tag_name();
            out.push('<');
            out.push_str(tag);
            write_timestamps(&mut out, block.created, block.modified);
            if let Some(language) = &block.language {
                write_attr(&mut out, "language", language);
            }
            if block.kind == BlockKind::HorizontalRule {
                out.push_str("/>");
                continue;
            }
            out.push('>');
            write_text(&mut out, &block.content);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        out.push_str("</body></xml>");
        Ok(out)
    }

    fn decode(&self, text: &str) -> CodecResult<Note> {
        let mut reader = Reader::from_str(text);
        expect_root(&mut reader, ROOT_TAG)?;

        let mut head: Option<NoteHead> = None;
        let mut body: Option<Vec<Block>> = None;
        loop {
            match reader.read_event()? {
                Event::Start(start) => match tag_name(&start)?.as_str() {
                    "head" if head.is_none() => head = Some(decode_head(&mut reader, false)?),
                    "body" if body.is_none() => body = Some(decode_body(&mut reader)?),
                    other => {
                        return Err(CodecError::InvalidDocument(format!(
                            "unexpected element `{other}` under root"
                        )))
                    }
                },
                Event::End(_) => break,
                Event::Text(text) if is_blank(&text) => {}
                Event::Comment(_) | Event::PI(_) => {}
                Event::Eof => {
                    return Err(CodecError::InvalidDocument(
                        "unterminated root element".to_string(),
                    ))
                }
                other => {
                    return Err(CodecError::InvalidDocument(format!(
                        "unexpected markup under root: {other:?}"
                    )))
                }
            }
        }

        match (head, body) {
            (Some(head), Some(body)) => Ok(Note::from_parts(head, body)),
            (None, _) => Err(CodecError::InvalidDocument("missing `head` element".to_string())),
            (_, None) => Err(CodecError::InvalidDocument("missing `body` element".to_string())),
        }
    }
}

fn decode_body(reader: &mut Reader<&[u8]>) -> CodecResult<Vec<Block>> {
    let mut body = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let tag = tag_name(&start)?;
                match BlockKind::from_tag(&tag) {
                    // List tags belong to the newer schema; to this reader
                    // they are unknown and skipped like any other.
                    Some(kind) if !kind.is_list() => {
                        let created = attr_timestamp(&start, "created")?;
                        let modified = attr_timestamp(&start, "modified")?;
                        let language = match kind {
                            BlockKind::Code => attr_string(&start, "language")?,
                            _ => None,
                        };
                        let content = read_element_text(reader, &tag)?;
                        body.push(Block::restored(
                            kind,
                            content,
                            language,
                            Vec::new(),
                            created,
                            modified,
                        ));
                    }
                    _ => skip_element(reader, &start)?,
                }
            }
            Event::Empty(start) => {
                let tag = tag_name(&start)?;
                match BlockKind::from_tag(&tag) {
                    Some(kind) if !kind.is_list() => {
                        let created = attr_timestamp(&start, "created")?;
                        let modified = attr_timestamp(&start, "modified")?;
                        let language = match kind {
                            BlockKind::Code => attr_string(&start, "language")?,
                            _ => None,
                        };
                        body.push(Block::restored(
                            kind,
                            String::new(),
                            language,
                            Vec::new(),
                            created,
                            modified,
                        ));
                    }
                    _ => {}
                }
            }
            Event::End(_) => return Ok(body),
            Event::Text(_) | Event::CData(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => {
                return Err(CodecError::InvalidDocument(
                    "unterminated `body` element".to_string(),
                ))
            }
            other => {
                return Err(CodecError::InvalidDocument(format!(
                    "unexpected markup inside `body`: {other:?}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LegacyCodec;
    use crate::codec::{Codec, CodecError};
    use crate::model::block::{Block, BlockKind, ListItem};
    use crate::model::head::NoteHead;
    use crate::model::note::Note;

    fn codec() -> LegacyCodec {
        LegacyCodec
    }

    #[test]
    fn encodes_the_documented_element_shapes() {
        let mut note = Note::new(NoteHead::with_title("untitled"));
        note.insert(
            0,
            Block::restored(BlockKind::Paragraph, "hello", None, Vec::new(), 1000, 1000),
        )
        .unwrap();
        note.insert(
            1,
            Block::restored(
                BlockKind::Code,
                "fn main() {}",
                Some("rust".to_string()),
                Vec::new(),
                1000,
                2000,
            ),
        )
        .unwrap();
        note.insert(
            2,
            Block::restored(BlockKind::HorizontalRule, "", None, Vec::new(), 3, 3),
        )
        .unwrap();

        let text = codec().encode(&note).unwrap();
        assert_eq!(
            text,
            "<xml><head><title>untitled</title></head><body>\
             <p created=\"1000\" modified=\"1000\">hello</p>\
             <code created=\"1000\" modified=\"2000\" language=\"rust\">fn main() {}</code>\
             <hr created=\"3\" modified=\"3\"/>\
             </body></xml>"
        );
    }

    #[test]
    fn encode_drops_list_blocks() {
        let mut note = Note::new(NoteHead::new());
        note.insert(0, Block::paragraph("kept")).unwrap();
        note.insert(1, Block::ordered_list(vec![ListItem::new("lost")]))
            .unwrap();

        let text = codec().encode(&note).unwrap();
        assert!(!text.contains("<ol"));
        assert!(!text.contains("<li"));
        assert!(text.contains(">kept</p>"));
    }

    #[test]
    fn decode_skips_list_tags_as_unknown() {
        let text = "<xml><head></head><body>\
                    <p created=\"1\" modified=\"1\">a</p>\
                    <ul created=\"1\" modified=\"1\"><li created=\"1\" modified=\"1\">x</li></ul>\
                    <p created=\"2\" modified=\"2\">b</p>\
                    </body></xml>";
        let note = codec().decode(text).unwrap();
        assert_eq!(note.len(), 2);
        assert_eq!(note.block(0).unwrap().content, "a");
        assert_eq!(note.block(1).unwrap().content, "b");
    }

    #[test]
    fn decode_rejects_malformed_timestamps() {
        let text = "<xml><head></head><body><p created=\"soon\" modified=\"1\">a</p></body></xml>";
        assert!(matches!(
            codec().decode(text),
            Err(CodecError::InvalidDocument(_))
        ));
    }

    #[test]
    fn decode_requires_head_and_body() {
        assert!(matches!(
            codec().decode("<xml><body></body></xml>"),
            Err(CodecError::InvalidDocument(_))
        ));
        assert!(matches!(
            codec().decode("<xml><head></head></xml>"),
            Err(CodecError::InvalidDocument(_))
        ));
    }

    #[test]
    fn head_values_stay_text_in_this_schema() {
        let text = "<xml><head><created>12345</created></head><body></body></xml>";
        let note = codec().decode(text).unwrap();
        assert_eq!(
            note.head.get("created"),
            Some(&crate::model::head::PropertyValue::Text("12345".to_string()))
        );
    }
}
