//! Transient input state for one analysis request.

use mime::Mime;
use snafu::{ensure, ResultExt, Snafu};
use std::{fmt, path::Path};
use tracing::debug;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read '{path}'"))]
    ReadFile {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("'{path}' is {mime}; only video and image files are accepted"))]
    UnsupportedMedia { path: String, mime: Mime },

    #[snafu(display("'{path}' is {size} bytes; the limit is {limit}"))]
    TooLarge { path: String, size: u64, limit: usize },
}

/// Binary media the user picked, kept in memory until dispatch.
#[derive(Clone, PartialEq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub mime: Mime,
    pub name: Option<String>,
}

impl Attachment {
    pub fn new(bytes: impl Into<Vec<u8>>, mime: Mime) -> Self {
        Self {
            bytes: bytes.into(),
            mime,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read a file from disk, accepting only `video/*` and `image/*`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::load(path.as_ref(), None).await
    }

    /// Like [`Attachment::from_path`], but refuse files over `limit` bytes
    /// before reading them.
    pub async fn from_path_within(path: impl AsRef<Path>, limit: usize) -> Result<Self, Error> {
        Self::load(path.as_ref(), Some(limit)).await
    }

    async fn load(path: &Path, limit: Option<usize>) -> Result<Self, Error> {
        let shown = path.display().to_string();

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        ensure!(
            is_accepted(&mime),
            UnsupportedMediaSnafu {
                path: shown,
                mime
            }
        );

        let size = tokio::fs::metadata(path)
            .await
            .context(ReadFileSnafu { path: &shown })?
            .len();
        if let Some(limit) = limit {
            ensure!(
                size <= limit as u64,
                TooLargeSnafu {
                    path: shown,
                    size,
                    limit
                }
            );
        }

        let bytes = tokio::fs::read(path)
            .await
            .context(ReadFileSnafu { path: &shown })?;
        debug!(path = %shown, %mime, size, "attachment loaded");

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(shown);
        Ok(Self::new(bytes, mime).with_name(name))
    }
}

// Media bytes are not worth printing.
impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("mime", &self.mime)
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn is_accepted(mime: &Mime) -> bool {
    mime.type_() == mime::VIDEO || mime.type_() == mime::IMAGE
}

/// Snapshot of the collector taken at submission time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub attachment: Option<Attachment>,
    pub note: Option<String>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// The note, unless it is missing or blank.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.attachment.is_none() && self.note().is_none()
    }
}

/// Owns the attachment and note while the user edits them.
#[derive(Debug, Default)]
pub struct InputCollector {
    attachment: Option<Attachment>,
    note: String,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attachment(&mut self, attachment: Attachment) {
        self.attachment = Some(attachment);
    }

    pub async fn load_attachment(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let attachment = Attachment::from_path(path).await?;
        self.set_attachment(attachment);
        Ok(())
    }

    /// Load a file, refusing it up front when it exceeds `limit` bytes.
    pub async fn load_attachment_within(
        &mut self,
        path: impl AsRef<Path>,
        limit: usize,
    ) -> Result<(), Error> {
        let attachment = Attachment::from_path_within(path, limit).await?;
        self.set_attachment(attachment);
        Ok(())
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    pub fn clear(&mut self) {
        self.attachment = None;
        self.note.clear();
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn is_valid(&self) -> bool {
        self.attachment.is_some() || !self.note.trim().is_empty()
    }

    pub fn snapshot(&self) -> Request {
        Request {
            attachment: self.attachment.clone(),
            note: Some(self.note.clone()).filter(|n| !n.trim().is_empty()),
        }
    }
}
