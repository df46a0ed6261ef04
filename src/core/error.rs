use crate::id128::Id128;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reasons a catalog source file is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A payload line appeared before any `-- <id>` header
    PayloadBeforeId,
    /// An entry header was followed by no payload text
    NoPayload,
    /// An explicit language tag was empty
    LanguageTooShort,
    /// An explicit language tag was longer than 31 bytes
    LanguageTooLong,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseErrorKind::PayloadBeforeId => "Got payload before ID",
            ParseErrorKind::NoPayload => "No payload text",
            ParseErrorKind::LanguageTooShort => "Language too short",
            ParseErrorKind::LanguageTooLong => "Language too long",
        };
        f.write_str(msg)
    }
}

/// Structural problems found in a database file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptKind {
    /// File shorter than the fixed header
    Truncated { len: u64 },
    /// Signature bytes do not match
    BadSignature,
    /// Incompatible flags this reader does not understand
    UnsupportedFlags(u32),
    /// Declared header smaller than this reader's header
    HeaderTooSmall(u64),
    /// Declared item record smaller than this reader's record
    RecordTooSmall(u64),
    /// Header declares zero items
    NoItems,
    /// Item array does not fit in the file
    ItemsOutOfBounds { needed: u64, len: u64 },
    /// Item offset points past the end of the file
    OffsetOutOfRange(u64),
    /// No NUL terminator before the end of the file
    Unterminated(u64),
    /// Payload bytes are not UTF-8
    InvalidUtf8(u64),
}

impl fmt::Display for CorruptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptKind::Truncated { len } => write!(f, "file too short for header ({} bytes)", len),
            CorruptKind::BadSignature => write!(f, "invalid signature"),
            CorruptKind::UnsupportedFlags(flags) => {
                write!(f, "unsupported incompatible flags 0x{:08x}", flags)
            }
            CorruptKind::HeaderTooSmall(size) => write!(f, "header size {} too small", size),
            CorruptKind::RecordTooSmall(size) => write!(f, "item record size {} too small", size),
            CorruptKind::NoItems => write!(f, "database holds no items"),
            CorruptKind::ItemsOutOfBounds { needed, len } => write!(
                f,
                "item array needs {} bytes but file has {}",
                needed, len
            ),
            CorruptKind::OffsetOutOfRange(offset) => {
                write!(f, "string offset {} out of range", offset)
            }
            CorruptKind::Unterminated(offset) => {
                write!(f, "string at offset {} is not terminated", offset)
            }
            CorruptKind::InvalidUtf8(offset) => {
                write!(f, "string at offset {} is not valid UTF-8", offset)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("[{}:{line}] {kind}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        kind: ParseErrorKind,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt catalog database: {0}")]
    Corrupt(CorruptKind),

    #[error("No catalog entry for {0}")]
    NotFound(Id128),

    #[error("Catalog database not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("Invalid 128-bit id: {0}")]
    InvalidId(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Attach a path to an I/O error
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Expected "nothing there" outcomes, as opposed to real failures
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound(_) | CatalogError::DatabaseNotFound(_)
        )
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, CatalogError::Corrupt(_))
    }
}

impl From<CorruptKind> for CatalogError {
    fn from(kind: CorruptKind) -> Self {
        CatalogError::Corrupt(kind)
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
