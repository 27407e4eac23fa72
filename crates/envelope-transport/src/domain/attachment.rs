//! Attachment descriptors and the attachment encoder
//!
//! ## Rules
//!
//! - A descriptor with an empty path or an empty file name is invalid.
//! - A source that cannot be read is invalid for this attempt; no retry.
//! - A payload larger than the configured cap is rejected whole, never
//!   truncated. A descriptor's own `max_size` tightens the cap, never
//!   loosens it.
//! - Empty in-memory payloads are valid.

use std::fs;
use std::path::{Path, PathBuf};

use shared_types::{Item, CONTENT_TYPE_OCTET_STREAM};

use crate::error::AttachmentError;

/// Where an attachment's bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Read from the filesystem at encode time.
    Path(PathBuf),
    /// Already in memory.
    Bytes(Vec<u8>),
}

/// A caller-owned attachment descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub source: AttachmentSource,
    pub filename: String,
    /// Falls back to `application/octet-stream`.
    pub content_type: Option<String>,
    /// Per-attachment cap; only applies when tighter than the adapter's.
    pub max_size: Option<u64>,
}

impl Attachment {
    /// Attachment read from `path`, named after the path's last component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source: AttachmentSource::Path(path),
            filename,
            content_type: None,
            max_size: None,
        }
    }

    /// Attachment backed by an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            source: AttachmentSource::Bytes(bytes),
            filename: filename.into(),
            content_type: None,
            max_size: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }
}

/// Validate an attachment, apply the size cap and produce its item.
pub fn encode(
    attachment: &Attachment,
    max_attachment_size: u64,
) -> Result<Item, AttachmentError> {
    let filename = attachment.filename.as_str();
    let max_attachment_size = attachment
        .max_size
        .map_or(max_attachment_size, |own| own.min(max_attachment_size));

    if let AttachmentSource::Path(path) = &attachment.source {
        if path.as_os_str().is_empty() {
            return Err(AttachmentError::invalid(filename, "empty path"));
        }
    }
    if filename.is_empty() {
        return Err(AttachmentError::invalid(filename, "empty filename"));
    }

    let payload = match &attachment.source {
        AttachmentSource::Bytes(bytes) => {
            check_size(filename, bytes.len() as u64, max_attachment_size)?;
            bytes.clone()
        }
        AttachmentSource::Path(path) => read_path(path, filename, max_attachment_size)?,
    };

    let content_type = attachment
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(CONTENT_TYPE_OCTET_STREAM);

    Ok(Item::attachment(filename, content_type, payload))
}

fn read_path(path: &Path, filename: &str, max: u64) -> Result<Vec<u8>, AttachmentError> {
    let metadata = fs::metadata(path)
        .map_err(|e| AttachmentError::invalid(filename, format!("{}: {e}", path.display())))?;
    if !metadata.is_file() {
        return Err(AttachmentError::invalid(
            filename,
            format!("{} is not a regular file", path.display()),
        ));
    }
    // Checked before reading so oversized files are never loaded.
    check_size(filename, metadata.len(), max)?;

    let bytes = fs::read(path)
        .map_err(|e| AttachmentError::invalid(filename, format!("{}: {e}", path.display())))?;
    // The file may have grown between stat and read.
    check_size(filename, bytes.len() as u64, max)?;
    Ok(bytes)
}

fn check_size(filename: &str, size: u64, max: u64) -> Result<(), AttachmentError> {
    if size > max {
        return Err(AttachmentError::TooLarge {
            filename: filename.to_string(),
            size,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ItemType;
    use std::io::Write;

    #[test]
    fn test_empty_path_is_invalid() {
        let result = encode(&Attachment::from_path(""), 1024);
        assert!(matches!(result, Err(AttachmentError::Invalid { .. })));
    }

    #[test]
    fn test_empty_filename_is_invalid() {
        let result = encode(&Attachment::from_bytes(vec![1], ""), 1024);
        assert!(matches!(
            result,
            Err(AttachmentError::Invalid { reason, .. }) if reason == "empty filename"
        ));
    }

    #[test]
    fn test_empty_bytes_are_valid() {
        let item = encode(&Attachment::from_bytes(Vec::new(), "test.txt"), 1024).unwrap();
        assert_eq!(item.header().length, 0);
        assert_eq!(item.header().filename.as_deref(), Some("test.txt"));
        assert_eq!(item.header().content_type, CONTENT_TYPE_OCTET_STREAM);
    }

    #[test]
    fn test_bytes_over_limit_are_rejected() {
        let result = encode(&Attachment::from_bytes(vec![0; 11], "big.bin"), 10);
        assert_eq!(
            result,
            Err(AttachmentError::TooLarge {
                filename: "big.bin".to_string(),
                size: 11,
                max: 10
            })
        );
    }

    #[test]
    fn test_bytes_at_limit_are_accepted() {
        let item = encode(&Attachment::from_bytes(vec![0; 10], "edge.bin"), 10).unwrap();
        assert_eq!(item.header().length, 10);
    }

    #[test]
    fn test_content_type_is_kept() {
        let attachment = Attachment::from_bytes(b"{}".to_vec(), "state.json")
            .with_content_type("application/json");
        let item = encode(&attachment, 1024).unwrap();
        assert_eq!(item.header().content_type, "application/json");
        assert_eq!(item.item_type(), &ItemType::Attachment);
    }

    #[test]
    fn test_reads_file_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"log line\n").unwrap();

        let attachment = Attachment::from_path(file.path());
        let item = encode(&attachment, 1024).unwrap();

        assert_eq!(item.payload(), b"log line\n");
        assert_eq!(item.header().length, 9);
        assert_eq!(
            item.header().filename.as_deref(),
            file.path().file_name().and_then(|n| n.to_str())
        );
    }

    #[test]
    fn test_file_over_limit_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();

        let result = encode(&Attachment::from_path(file.path()), 32);
        assert!(matches!(
            result,
            Err(AttachmentError::TooLarge { size: 64, max: 32, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let result = encode(&Attachment::from_path(dir.path().join("gone.log")), 1024);
        assert!(matches!(result, Err(AttachmentError::Invalid { .. })));
    }

    #[test]
    fn test_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let attachment = Attachment::from_path(dir.path()).with_filename("dir");
        let result = encode(&attachment, 1024);
        assert!(matches!(result, Err(AttachmentError::Invalid { .. })));
    }

    #[test]
    fn test_tighter_own_cap_wins() {
        let attachment = Attachment::from_bytes(vec![0; 10], "small.bin").with_max_size(8);
        assert!(matches!(
            encode(&attachment, 1024),
            Err(AttachmentError::TooLarge { size: 10, max: 8, .. })
        ));
    }

    #[test]
    fn test_looser_own_cap_is_ignored() {
        let attachment = Attachment::from_bytes(vec![0; 10], "big.bin").with_max_size(4096);
        assert!(matches!(
            encode(&attachment, 8),
            Err(AttachmentError::TooLarge { max: 8, .. })
        ));
        assert!(encode(&attachment.with_max_size(10), 1024).is_ok());
    }
}
