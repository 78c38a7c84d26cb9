//! CLI inspection entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `skribe_core` linkage.
//! - Print the structure of a persisted note file for quick local checks.

use skribe_core::{is_archive, unpack, Codec, LegacyCodec, Note};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    match args.next() {
        None => {
            println!("skribe_core version={}", skribe_core::core_version());
            println!("usage: skribe_cli <note-file>");
            ExitCode::SUCCESS
        }
        Some(path) => match inspect(Path::new(&path)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn inspect(path: &Path) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|err| format!("cannot read {}: {err}", path.display()))?;

    let (format, note) = if is_archive(&bytes) {
        let note = unpack(&bytes).map_err(|err| err.to_string())?;
        ("skml-archive", note)
    } else {
        let text = String::from_utf8(bytes).map_err(|_| "legacy note file is not UTF-8".to_string())?;
        let note = LegacyCodec.decode(&text).map_err(|err| err.to_string())?;
        ("legacy-text", note)
    };

    print_summary(path, format, &note);
    Ok(())
}

fn print_summary(path: &Path, format: &str, note: &Note) {
    println!("file: {}", path.display());
    println!("format: {format}");
    println!(
        "title: {}",
        note.head.title().unwrap_or_else(|| "(none)".to_string())
    );
    println!("blocks: {}", note.len());
    for (index, block) in note.blocks().iter().enumerate() {
        println!(
            "  [{index}] {} created={} modified={}",
            block.kind.tag_name(),
            block.created,
            block.modified
        );
    }
    println!("resources: {}", note.files().len());
    for file in note.files() {
        println!("  {} {} ({} bytes)", file.filename, file.media_type, file.len());
    }
}
