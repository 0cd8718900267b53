/*!
 * Provider Types
 * Shared types for filesystem provider operations
 */

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Provider operation result
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider errors
///
/// Two tiers: `NotImplemented` is a configuration error (a backend left a
/// required capability query unimplemented) and should surface at
/// registration/development time. Everything else is a backend I/O failure.
/// Expected conditions (missing file, unsupported optional feature) are never
/// errors; they resolve as negative values (`None`, `false`, `Unavailable`).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderError {
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Read-only filesystem")]
    ReadOnly,

    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Not registered: {0}")]
    NotRegistered(String),
}

impl ProviderError {
    /// Configuration-tier error for a capability query the backend must override
    pub fn not_implemented(op: &str) -> Self {
        ProviderError::NotImplemented(op.to_string())
    }

    /// True for the configuration tier, false for runtime I/O failures
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ProviderError::NotImplemented(_))
    }
}

/// Backend category tag, immutable after construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsKind {
    Local,
    Snapshot,
    OverriddenContent,
}

impl fmt::Display for FsKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FsKind::Local => write!(f, "local"),
            FsKind::Snapshot => write!(f, "snapshot"),
            FsKind::OverriddenContent => write!(f, "overridden-content"),
        }
    }
}

/// File metadata returned by metadata queries
///
/// A missing path is represented as absence (`Ok(None)`), not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub modified: SystemTime,
    pub size: u64,
}

/// Result of a content read
///
/// Either decoded content with an encoding flag or an error description,
/// never both. `Unavailable` is a resolved value, not a failure: the default
/// backend uses it to signal "override required".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileContent {
    Text { content: String, is_encoded: bool },
    Unavailable { reason: String },
}

impl FileContent {
    pub fn text(content: impl Into<String>) -> Self {
        FileContent::Text {
            content: content.into(),
            is_encoded: false,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        FileContent::Unavailable {
            reason: reason.into(),
        }
    }

    /// Decode raw bytes: UTF-8 text stays plain, binary is base64 + flag
    pub fn from_bytes(data: Vec<u8>) -> Self {
        match String::from_utf8(data) {
            Ok(content) => FileContent::Text {
                content,
                is_encoded: false,
            },
            Err(e) => FileContent::Text {
                content: base64::engine::general_purpose::STANDARD.encode(e.into_bytes()),
                is_encoded: true,
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FileContent::Text { .. })
    }
}

/// Outcome of a rename operation, resolved exactly once per call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub success: bool,
    pub new_path: Option<PathBuf>,
}

impl RenameOutcome {
    pub fn renamed(new_path: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            new_path: Some(new_path.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            new_path: None,
        }
    }
}

/// Coarse resource classification used by the indexing consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Document,
    Script,
    Stylesheet,
    Image,
    Font,
    Other,
}

impl ResourceKind {
    /// Classify by file extension
    pub fn from_path(path: &Path) -> Self {
        match extension(path) {
            "html" | "htm" | "xml" | "md" | "txt" | "json" => ResourceKind::Document,
            "js" | "mjs" | "ts" | "jsx" | "tsx" | "rs" | "py" => ResourceKind::Script,
            "css" | "scss" | "less" => ResourceKind::Stylesheet,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" => ResourceKind::Image,
            "woff" | "woff2" | "ttf" | "otf" => ResourceKind::Font,
            _ => ResourceKind::Other,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::Document => write!(f, "document"),
            ResourceKind::Script => write!(f, "script"),
            ResourceKind::Stylesheet => write!(f, "stylesheet"),
            ResourceKind::Image => write!(f, "image"),
            ResourceKind::Font => write!(f, "font"),
            ResourceKind::Other => write!(f, "other"),
        }
    }
}

/// MIME type by file extension
pub fn mime_from_path(path: &Path) -> &'static str {
    match extension(path) {
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "md" => "text/markdown",
        "txt" => "text/plain",
        "json" => "application/json",
        "js" | "mjs" => "text/javascript",
        "ts" | "tsx" => "application/typescript",
        "jsx" => "text/jsx",
        "rs" => "text/x-rust",
        "py" => "text/x-python",
        "css" => "text/css",
        "scss" | "less" => "text/x-scss",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        _ => "application/octet-stream",
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}
