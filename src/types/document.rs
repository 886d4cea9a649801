use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Media type sent for uploaded case documents.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A case document uploaded when a session is initialized.
///
/// The backend extracts the document's text and hands it to its agents as
/// context, so the bytes must be a PDF the backend can parse.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    file_name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl Document {
    /// Creates a PDF document from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `bytes` is empty.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        Self::with_media_type(file_name, PDF_MEDIA_TYPE, bytes)
    }

    /// Creates a document with an explicit media type.
    pub fn with_media_type(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::validation(
                "document is empty",
                Some("pdf".to_string()),
            ));
        }
        Ok(Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        })
    }

    /// Reads a document from disk, naming it after the file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|err| {
            Error::io(format!("failed to read document {}", path.display()), err)
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        Self::new(file_name, bytes)
    }

    /// Returns the file name sent with the upload.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the media type sent with the upload.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns the document contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the size of the document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty documents are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
