//! SKML, the revised `<skml>` schema with list support.
//!
//! # Responsibility
//! - Encode and decode the full block vocabulary, lists included.
//! - Materialize the well-known `created`/`modified` head keys as integers
//!   on decode.
//!
//! # Invariants
//! - Superset of the legacy element grammar: everything the old schema
//!   writes, this one reads identically.
//! - `ol`/`ul` elements contain only `li` children; unknown children inside
//!   a list are skipped like unknown body tags.

use crate::codec::{
    attr_string, attr_timestamp, decode_head, expect_root, is_blank, read_element_text,
    skip_element, tag_name, write_attr, write_text, write_timestamps, Codec, CodecError,
    CodecResult,
};
use crate::model::block::{Block, BlockKind, ListItem};
use crate::model::head::NoteHead;
use crate::model::note::Note;
use quick_xml::events::Event;
use quick_xml::Reader;

const ROOT_TAG: &str = "skml";

/// Codec for the revised schema. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkmlCodec;

impl Codec for SkmlCodec {
    fn encode(&self, note: &Note) -> CodecResult<String> {
        let mut out = String::new();
        out.push_str("<skml><head>");
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
            encode_block(&mut out, block);
        }
        out.push_str("</body></skml>");
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
                    "head" if head.is_none() => head = Some(decode_head(&mut reader, true)?),
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

fn encode_block(out: &mut String, block: &Block) {
    let tag = block.kind.tag_name();
    out.push('<');
    out.push_str(tag);
    write_timestamps(out, block.created, block.modified);
    if let Some(language) = &block.language {
        write_attr(out, "language", language);
    }

    if block.is_list() {
        out.push('>');
        for item in &block.items {
            out.push_str("<li");
            write_timestamps(out, item.created, item.modified);
            out.push('>');
            write_text(out, &item.content);
            out.push_str("</li>");
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        return;
    }

    if block.kind == BlockKind::HorizontalRule {
        out.push_str("/>");
        return;
    }

    out.push('>');
    write_text(out, &block.content);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn decode_body(reader: &mut Reader<&[u8]>) -> CodecResult<Vec<Block>> {
    let mut body = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let tag = tag_name(&start)?;
                match BlockKind::from_tag(&tag) {
                    Some(kind) if kind.is_list() => {
                        let created = attr_timestamp(&start, "created")?;
                        let modified = attr_timestamp(&start, "modified")?;
                        let items = decode_list_items(reader)?;
                        body.push(Block::restored(kind, "", None, items, created, modified));
                    }
                    Some(kind) => {
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
                    None => skip_element(reader, &start)?,
                }
            }
            Event::Empty(start) => {
                let tag = tag_name(&start)?;
                match BlockKind::from_tag(&tag) {
                    Some(kind) => {
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
                    None => {}
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

fn decode_list_items(reader: &mut Reader<&[u8]>) -> CodecResult<Vec<ListItem>> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if tag_name(&start)? == "li" {
                    let created = attr_timestamp(&start, "created")?;
                    let modified = attr_timestamp(&start, "modified")?;
                    let content = read_element_text(reader, "li")?;
                    items.push(ListItem::restored(content, created, modified));
                } else {
                    skip_element(reader, &start)?;
                }
            }
            Event::Empty(start) => {
                if tag_name(&start)? == "li" {
                    let created = attr_timestamp(&start, "created")?;
                    let modified = attr_timestamp(&start, "modified")?;
                    items.push(ListItem::restored("", created, modified));
                }
            }
            Event::End(_) => return Ok(items),
            Event::Text(_) | Event::CData(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => {
                return Err(CodecError::InvalidDocument(
                    "unterminated list element".to_string(),
                ))
            }
            other => {
                return Err(CodecError::InvalidDocument(format!(
                    "unexpected markup inside list: {other:?}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SkmlCodec;
    use crate::codec::{Codec, CodecError};
    use crate::model::block::{Block, BlockKind, ListItem};
    use crate::model::head::{NoteHead, PropertyValue};
    use crate::model::note::Note;

    fn codec() -> SkmlCodec {
        SkmlCodec
    }

    #[test]
    fn encodes_the_documented_scenario_exactly() {
        let mut note = Note::new(NoteHead::with_title("untitled"));
        note.insert(
            0,
            Block::restored(BlockKind::Paragraph, "hello", None, Vec::new(), 1000, 1000),
        )
        .unwrap();

        let text = codec().encode(&note).unwrap();
        assert_eq!(
            text,
            "<skml><head><title>untitled</title></head>\
             <body><p created=\"1000\" modified=\"1000\">hello</p></body></skml>"
        );
    }

    #[test]
    fn lists_encode_with_li_children_and_decode_back() {
        let items = vec![
            ListItem::restored("one", 10, 11),
            ListItem::restored("two", 20, 21),
        ];
        let mut list = Block::ordered_list(items);
        list.created = 5;
        list.modified = 6;

        let mut note = Note::new(NoteHead::new());
        note.insert(0, list).unwrap();

        let text = codec().encode(&note).unwrap();
        assert_eq!(
            text,
            "<skml><head></head><body>\
             <ol created=\"5\" modified=\"6\">\
             <li created=\"10\" modified=\"11\">one</li>\
             <li created=\"20\" modified=\"21\">two</li>\
             </ol></body></skml>"
        );

        let decoded = codec().decode(&text).unwrap();
        let block = decoded.block(0).unwrap();
        assert_eq!(block.kind, BlockKind::OrderedList);
        assert_eq!(block.items.len(), 2);
        assert_eq!(block.items[0].content, "one");
        assert_eq!(block.items[0].created, 10);
        assert_eq!(block.items[1].modified, 21);
    }

    #[test]
    fn head_timestamp_keys_decode_as_integers() {
        let text = "<skml><head><title>t</title><created>1700</created>\
                    <modified>1800</modified></head><body></body></skml>";
        let note = codec().decode(text).unwrap();
        assert_eq!(note.head.get("title"), Some(&PropertyValue::Text("t".to_string())));
        assert_eq!(note.head.get("created"), Some(&PropertyValue::Int(1700)));
        assert_eq!(note.head.get("modified"), Some(&PropertyValue::Int(1800)));
    }

    #[test]
    fn non_integer_head_timestamp_rejects_the_document() {
        let text = "<skml><head><created>yesterday</created></head><body></body></skml>";
        assert!(matches!(
            codec().decode(text),
            Err(CodecError::InvalidDocument(_))
        ));
    }

    #[test]
    fn unknown_body_tags_are_invisible_but_order_is_kept() {
        let text = "<skml><head></head><body>\
                    <p created=\"1\" modified=\"1\">first</p>\
                    <aside created=\"1\" modified=\"1\">new thing</aside>\
                    <p created=\"2\" modified=\"2\">second</p>\
                    </body></skml>";
        let note = codec().decode(text).unwrap();
        assert_eq!(note.len(), 2);
        assert_eq!(note.block(0).unwrap().content, "first");
        assert_eq!(note.block(1).unwrap().content, "second");
    }

    #[test]
    fn image_blocks_round_trip_their_filename() {
        let mut note = Note::new(NoteHead::new());
        let mut image = Block::image("chart.png");
        image.created = 7;
        image.modified = 7;
        note.insert(0, image).unwrap();

        let text = codec().encode(&note).unwrap();
        assert!(text.contains("<img created=\"7\" modified=\"7\">chart.png</img>"));

        let decoded = codec().decode(&text).unwrap();
        assert_eq!(decoded.block(0).unwrap().kind, BlockKind::Image);
        assert_eq!(decoded.block(0).unwrap().content, "chart.png");
    }

    #[test]
    fn missing_timestamp_attributes_default_to_now() {
        let text = "<skml><head></head><body><p>late</p></body></skml>";
        let note = codec().decode(text).unwrap();
        let block = note.block(0).unwrap();
        assert!(block.created > 0);
        assert_eq!(block.content, "late");
    }

    #[test]
    fn decode_rejects_the_wrong_root() {
        assert!(matches!(
            codec().decode("<xml><head></head><body></body></xml>"),
            Err(CodecError::InvalidDocument(_))
        ));
    }
}
