//! Embedded binary resources.
//!
//! # Responsibility
//! - Represent the named binary files bundled with a note.
//! - Derive the media type from leading magic bytes, never from the filename.
//!
//! # Invariants
//! - Filenames are unique within one note's resource set (enforced by the
//!   note, not here).
//! - Image blocks reference resources by filename equality only; a missing
//!   resource is a render-time gap, not a model error.

use serde::{Deserialize, Serialize};

/// Fallback media type when no signature matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// One binary resource owned by a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedFile {
    /// Name the resource is addressed by, unique within the owning note.
    pub filename: String,
    /// Raw bytes, stored verbatim.
    pub data: Vec<u8>,
    /// Sniffed media type (`image/png`, ...), `application/octet-stream`
    /// when unrecognized.
    pub media_type: String,
}

impl EmbeddedFile {
    /// Wraps raw bytes, sniffing the media type from their signature.
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let media_type = sniff_media_type(&data).to_string();
        Self {
            filename: filename.into(),
            data,
            media_type,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Identifies a media type from leading magic bytes.
///
/// Covers the image formats the editing surface can embed; everything else
/// falls back to `application/octet-stream`. The filename extension is
/// deliberately ignored.
pub fn sniff_media_type(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if data.starts_with(b"\xff\xd8\xff") {
        return "image/jpeg";
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return "image/webp";
    }
    if data.starts_with(b"BM") {
        return "image/bmp";
    }
    OCTET_STREAM
}

#[cfg(test)]
mod tests {
    use super::{sniff_media_type, EmbeddedFile, OCTET_STREAM};

    #[test]
    fn sniffs_png_regardless_of_filename() {
        let data = b"\x89PNG\r\n\x1a\x0arest".to_vec();
        let file = EmbeddedFile::new("photo.jpg", data);
        assert_eq!(file.media_type, "image/png");
    }

    #[test]
    fn sniffs_jpeg_and_gif() {
        assert_eq!(sniff_media_type(b"\xff\xd8\xff\xe0"), "image/jpeg");
        assert_eq!(sniff_media_type(b"GIF89a...."), "image/gif");
    }

    #[test]
    fn sniffs_webp_container() {
        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(sniff_media_type(&data), "image/webp");
    }

    #[test]
    fn unknown_bytes_fall_back_to_octet_stream() {
        assert_eq!(sniff_media_type(b"hello"), OCTET_STREAM);
        assert_eq!(sniff_media_type(b""), OCTET_STREAM);
    }
}
