use skribe_core::{Block, EmbeddedFile, ListItem, Note, NoteError, NoteHead};

fn note_with_blocks(count: usize) -> Note {
    let mut note = Note::new(NoteHead::with_title("mutations"));
    for index in 0..count {
        note.insert(index, Block::paragraph(format!("block {index}")))
            .unwrap();
    }
    note
}

#[test]
fn every_successful_mutation_changes_length_by_exactly_one() {
    let mut note = note_with_blocks(2);

    note.insert(1, Block::math("x")).unwrap();
    assert_eq!(note.len(), 3);

    note.remove(1).unwrap();
    assert_eq!(note.len(), 2);

    note.insert(2, Block::ordered_list(Vec::new())).unwrap();
    note.insert_list_item(2, 0, ListItem::new("only")).unwrap();
    assert_eq!(note.block(2).unwrap().items.len(), 1);

    note.remove_list_item(2, 0).unwrap();
    assert_eq!(note.block(2).unwrap().items.len(), 0);
}

#[test]
fn insert_then_remove_at_same_index_leaves_identity_untouched() {
    let mut note = note_with_blocks(3);
    let ids_before: Vec<_> = note.blocks().iter().map(|block| block.id).collect();

    note.insert(1, Block::blockquote("transient")).unwrap();
    note.remove(1).unwrap();

    let ids_after: Vec<_> = note.blocks().iter().map(|block| block.id).collect();
    assert_eq!(ids_before, ids_after);
}

#[test]
fn stale_indices_fail_without_mutating() {
    let mut note = note_with_blocks(1);

    assert!(matches!(
        note.insert(2, Block::paragraph("x")),
        Err(NoteError::OutOfRange { index: 2, len: 1 })
    ));
    assert!(matches!(
        note.remove(1),
        Err(NoteError::OutOfRange { index: 1, len: 1 })
    ));
    assert_eq!(note.len(), 1);
}

#[test]
fn list_operations_reject_non_list_targets() {
    let mut note = note_with_blocks(1);
    assert!(matches!(
        note.insert_list_item(0, 0, ListItem::new("x")),
        Err(NoteError::NotAList { index: 0 })
    ));
    assert!(matches!(
        note.remove_list_item(0, 0),
        Err(NoteError::NotAList { index: 0 })
    ));
}

#[test]
fn duplicate_filename_is_rejected_and_set_is_unchanged() {
    let mut note = note_with_blocks(0);
    note.add_file(EmbeddedFile::new("photo.png", vec![1])).unwrap();

    let err = note
        .add_file(EmbeddedFile::new("photo.png", vec![2]))
        .unwrap_err();
    assert_eq!(err, NoteError::DuplicateFilename("photo.png".to_string()));
    assert_eq!(note.files().len(), 1);
    assert_eq!(note.file("photo.png").unwrap().data, vec![1]);
}

#[test]
fn head_upserts_keep_insertion_order() {
    let mut note = note_with_blocks(0);
    note.set_property("description", "first");
    note.set_property("imageURL", "http://example/img.png");
    note.set_property("description", "second");

    let keys: Vec<&str> = note.head.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["title", "description", "imageURL"]);
}

#[test]
fn note_state_snapshots_serialize_as_json() {
    let mut note = note_with_blocks(1);
    note.add_file(EmbeddedFile::new("a.bin", vec![7, 7])).unwrap();

    let snapshot = serde_json::to_string(&note).unwrap();
    let restored: Note = serde_json::from_str(&snapshot).unwrap();

    assert_eq!(note, restored);
}
