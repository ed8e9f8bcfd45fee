//! Blob storage collaborator for uploaded media.
//!
//! # Responsibility
//! - Validate upload content types against a caller-provided allow-list.
//! - Persist bytes under a generated object key and report its public URL.
//!
//! # Invariants
//! - Object keys are `<folder>/<uuidv7><ext>`; caller file names never
//!   become path segments.

use crate::model::id::new_id;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const AVATAR_FOLDER: &str = "avatars";
pub const BLOG_COVER_FOLDER: &str = "blog-covers";

pub const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const MAX_EXTENSION_CHARS: usize = 10;

/// One file received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of a successful store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredBlob {
    /// Client-side file name, informational only.
    pub file_name: String,
    pub content_type: String,
    /// Storage key relative to the store root.
    pub key: String,
    pub public_url: String,
}

#[derive(Debug)]
pub enum MediaError {
    /// Content type or folder rejected before any write.
    Validation(String),
    Storage(std::io::Error),
}

impl MediaError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Storage(_) => 500,
        }
    }
}

impl Display for MediaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "invalid upload: {message}"),
            Self::Storage(err) => write!(f, "failed to store upload: {err}"),
        }
    }
}

impl Error for MediaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value)
    }
}

/// Stores uploaded blobs.
pub trait BlobStore {
    /// Stores `upload` under `folder`. An empty `allowed_types` accepts any type.
    fn store(
        &self,
        upload: &MediaUpload,
        folder: &str,
        allowed_types: &[&str],
    ) -> Result<StoredBlob, MediaError>;
}

/// Filesystem-backed `BlobStore`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobStore for LocalBlobStore {
    fn store(
        &self,
        upload: &MediaUpload,
        folder: &str,
        allowed_types: &[&str],
    ) -> Result<StoredBlob, MediaError> {
        if !allowed_types.is_empty() && !allowed_types.contains(&upload.content_type.as_str()) {
            warn!(
                "event=media_store module=media status=rejected folder={} content_type={}",
                folder, upload.content_type
            );
            return Err(MediaError::Validation(format!(
                "unsupported content type `{}`; allowed: {}",
                upload.content_type,
                allowed_types.join(", ")
            )));
        }
        validate_folder(folder)?;

        let key = format!("{folder}/{}{}", new_id(), file_extension(&upload.file_name));
        let target = self.root.join(&key);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &upload.bytes)?;

        info!(
            "event=media_store module=media status=ok key={} bytes={}",
            key,
            upload.bytes.len()
        );
        Ok(StoredBlob {
            file_name: upload.file_name.clone(),
            content_type: upload.content_type.clone(),
            public_url: format!("{}/{key}", self.public_base_url),
            key,
        })
    }
}

fn validate_folder(folder: &str) -> Result<(), MediaError> {
    let valid = !folder.is_empty()
        && folder
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(MediaError::Validation(format!("invalid folder `{folder}`")))
    }
}

/// Lowercased `.ext` of the client file name, or empty when unusable.
fn file_extension(file_name: &str) -> String {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return String::new();
    };
    if ext.is_empty()
        || ext.chars().count() > MAX_EXTENSION_CHARS
        || !ext.chars().all(|ch| ch.is_ascii_alphanumeric())
    {
        return String::new();
    }
    format!(".{}", ext.to_ascii_lowercase())
}
