use skribe_core::{Library, LibraryError, LibraryItemKind};
use std::fs;
use tempfile::TempDir;

fn library_in(dir: &TempDir) -> Library {
    let mut library = Library::new(dir.path());
    library.initialize().unwrap();
    library
}

#[test]
fn refresh_classifies_files_and_collections() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("alpha.sk"), b"x").unwrap();
    fs::write(dir.path().join("ignored.txt"), b"x").unwrap();
    fs::create_dir(dir.path().join("projects")).unwrap();

    let library = library_in(&dir);
    let items = library.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "projects");
    assert_eq!(items[0].kind, LibraryItemKind::Collection);
    assert_eq!(items[1].name, "alpha");
    assert_eq!(items[1].kind, LibraryItemKind::File);
}

#[test]
fn refresh_drops_stale_entries_after_external_deletes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gone.sk");
    fs::write(&path, b"x").unwrap();

    let mut library = library_in(&dir);
    assert_eq!(library.items().len(), 1);

    fs::remove_file(&path).unwrap();
    library.refresh().unwrap();
    assert!(library.items().is_empty());
}

#[test]
fn available_name_probes_past_every_taken_candidate() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.sk"), b"x").unwrap();
    fs::write(dir.path().join("a_2.sk"), b"x").unwrap();

    let library = library_in(&dir);
    let name = library.available_name(dir.path(), "a", Some("sk"));
    assert_eq!(name, "a_3");
}

#[test]
fn available_name_returns_the_base_when_free() {
    let dir = TempDir::new().unwrap();
    let library = library_in(&dir);
    assert_eq!(library.available_name(dir.path(), "fresh", Some("sk")), "fresh");
}

#[test]
fn available_name_works_without_an_extension() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("untitled_collection")).unwrap();

    let library = library_in(&dir);
    let name = library.available_name(dir.path(), "untitled_collection", None);
    assert_eq!(name, "untitled_collection_2");
}

#[test]
fn create_collection_rejects_existing_names() {
    let dir = TempDir::new().unwrap();
    let mut library = library_in(&dir);

    library.create_collection("inbox").unwrap();
    library.refresh().unwrap();
    assert_eq!(library.items()[0].kind, LibraryItemKind::Collection);

    let err = library.create_collection("inbox").unwrap_err();
    assert!(matches!(err, LibraryError::AlreadyExists(name) if name == "inbox"));
}
