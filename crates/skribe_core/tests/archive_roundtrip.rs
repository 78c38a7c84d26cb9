use skribe_core::{
    is_archive, pack, unpack, ArchiveError, Block, EmbeddedFile, Note, NoteHead,
};

fn note_with_resources() -> Note {
    let mut note = Note::new(NoteHead::with_title("archived"));
    note.insert(0, Block::paragraph("see attachments")).unwrap();
    note.insert(1, Block::image("drawing.png")).unwrap();
    note.add_file(EmbeddedFile::new(
        "drawing.png",
        b"\x89PNG\r\n\x1a\x0a-----".to_vec(),
    ))
    .unwrap();
    note.add_file(EmbeddedFile::new("notes.bin", vec![0, 1, 2, 3, 255]))
        .unwrap();
    note
}

#[test]
fn pack_unpack_preserves_both_resources_bit_exactly() {
    let note = note_with_resources();
    let bytes = pack(&note).unwrap();
    let unpacked = unpack(&bytes).unwrap();

    assert_eq!(unpacked.files().len(), 2);

    let drawing = unpacked.file("drawing.png").unwrap();
    assert_eq!(drawing.data, b"\x89PNG\r\n\x1a\x0a-----".to_vec());
    assert_eq!(drawing.media_type, "image/png");

    let blob = unpacked.file("notes.bin").unwrap();
    assert_eq!(blob.data, vec![0, 1, 2, 3, 255]);
    assert_eq!(blob.media_type, "application/octet-stream");
}

#[test]
fn pack_unpack_preserves_the_document_itself() {
    let note = note_with_resources();
    let unpacked = unpack(&pack(&note).unwrap()).unwrap();

    assert_eq!(unpacked.head.title().as_deref(), Some("archived"));
    assert_eq!(unpacked.len(), 2);
    assert_eq!(unpacked.block(1).unwrap().content, "drawing.png");
}

#[test]
fn archives_are_recognized_by_framing_alone() {
    let bytes = pack(&note_with_resources()).unwrap();
    assert!(is_archive(&bytes));

    // The same document as bare text must not be mistaken for a container.
    assert!(!is_archive(b"<skml><head></head><body></body></skml>"));
}

#[test]
fn truncated_containers_are_rejected_not_half_read() {
    let bytes = pack(&note_with_resources()).unwrap();
    let truncated = &bytes[..bytes.len() / 2];
    assert!(matches!(
        unpack(truncated),
        Err(ArchiveError::CorruptArchive(_) | ArchiveError::Zip(_) | ArchiveError::Io(_))
    ));
}

#[test]
fn missing_resource_for_an_image_block_is_not_an_unpack_error() {
    let mut note = Note::new(NoteHead::with_title("dangling"));
    note.insert(0, Block::image("never-added.png")).unwrap();

    let unpacked = unpack(&pack(&note).unwrap()).unwrap();
    assert_eq!(unpacked.len(), 1);
    assert!(unpacked.file("never-added.png").is_none());
}
