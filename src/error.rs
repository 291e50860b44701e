//! Centralized error handling for xnbcode.
//!
//! Every failure of a write or read session surfaces synchronously through
//! [`ContentError`]. There is no partial success: a failed write never
//! reaches its destination, and a failed read leaves any instance supplied
//! for in-place reuse in an unspecified, partially-mutated state that the
//! caller must discard.
//!
//! ## Error Categories
//!
//! - **Schema** ([`ContentError::Schema`], [`ContentError::UnknownType`]):
//!   no codec can be resolved for a type at write time, or a type-table entry
//!   names a type the reading catalog does not know.
//! - **Framing** ([`ContentError::Framing`]): the stream disagrees with what
//!   the codecs expect (bad flag byte, count, total size, truncation).
//! - **Corruption** ([`ContentError::Corruption`]): multi-dimensional index
//!   reconstruction did not terminate cleanly.
//! - **Compression**, **Reference**, **Io** and **Internal** cover the
//!   remaining failure domains.
//!
//! ## Usage
//!
//! ```rust
//! use xnbcode::{ContentError, TypeCatalog, Xnb};
//!
//! let catalog = TypeCatalog::new();
//! match Xnb::load_bytes::<String>(&catalog, b"not a container") {
//!     Ok(_) => unreachable!(),
//!     Err(ContentError::Framing(msg)) => println!("bad container: {msg}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for xnbcode operations.
pub type Result<T> = std::result::Result<T, ContentError>;

/// The master error enum covering all failure domains of a session.
///
/// This type is `Clone` so a batch compilation can hand the same failure to
/// several observers. I/O errors are wrapped in `Arc` for that reason.
#[derive(Debug, Clone)]
pub enum ContentError {
    /// Low-level I/O failure while reading or writing a container file.
    Io(Arc<io::Error>),

    /// A type cannot be written or bound.
    ///
    /// ## Common Causes
    ///
    /// - A transparent wrapper type was asked for its own type-table slot
    /// - The type-table entry version differs from the local codec version
    /// - A polymorphic value downcasts to a different type than requested
    Schema(String),

    /// A type-table entry names a type that the reading catalog has no codec
    /// for ("unknown content type"). The string is the descriptor on disk.
    UnknownType(String),

    /// The stream content disagrees with the framing the codecs expect.
    ///
    /// ## Common Causes
    ///
    /// - Truncated container or mismatching total-size header
    /// - A boolean flag byte other than 0 or 1
    /// - A null reference in a slot that cannot hold one
    /// - A type or shared-resource index outside its table
    /// - Invalid UTF-8 in a string
    Framing(String),

    /// A multi-dimensional array index did not decompose cleanly.
    Corruption(String),

    /// Compression or decompression failure.
    Compression(String),

    /// An external reference cannot be expressed relative to the container.
    Reference(String),

    /// Logic error inside the library (poisoned lock, phase misuse).
    ///
    /// This error should not occur in production and indicates a bug.
    Internal(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O Error: {e}"),
            Self::Schema(s) => write!(f, "Schema Error: {s}"),
            Self::UnknownType(s) => write!(f, "Unknown content type: {s}"),
            Self::Framing(s) => write!(f, "Framing Error: {s}"),
            Self::Corruption(s) => write!(f, "Corruption Error: {s}"),
            Self::Compression(s) => write!(f, "Compression Error: {s}"),
            Self::Reference(s) => write!(f, "External Reference Error: {s}"),
            Self::Internal(s) => write!(f, "Internal Logic Error: {s}"),
        }
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ContentError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl ContentError {
    /// Shorthand for the truncation error produced by every reader helper.
    pub(crate) fn truncated(wanted: usize, remaining: usize) -> Self {
        Self::Framing(format!(
            "unexpected end of stream: needed {wanted} bytes, {remaining} remaining"
        ))
    }
}
