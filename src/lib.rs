//! # xnbcode
//!
//! A binary content serialization protocol for compiled game assets: a
//! self-describing container with a per-file type table, polymorphic
//! null-safe object encoding, deferred shared resources, and optional LZ4
//! body compression.
//!
//! ## Overview
//!
//! A container is produced by one write session over an object graph. The
//! writer records every codec it uses into a type table, so the file names
//! the exact shapes it contains; the reader binds that table against its
//! own [`TypeCatalog`] before decoding a single payload byte.
//!
//! ### Key Features
//!
//! *   **Static codecs:** every serializable shape implements [`Content`],
//!     by hand or through `#[derive(Content)]`. No runtime reflection.
//! *   **Polymorphic slots:** reference-like values carry a 7-bit type index
//!     (0 = null); value-like values are written inline.
//! *   **Shared resources:** a [`SharedRef`] is serialized once per distinct
//!     allocation, after the main graph, and bound back by index, so
//!     forward and cyclic references are legal.
//! *   **Hot reload:** [`Xnb::load_into`] decodes into a live instance,
//!     mutating lists, dictionaries and records in place.
//! *   **All-or-nothing writes:** a container is assembled in memory and
//!     committed only when complete.
//!
//! ## File Format
//!
//! ```text
//! ["XNB"] [platform] [version 5] [flags] [total size u32]
//! [decompressed size u32, if compressed]
//! [type table] [shared count] [root object] [shared payloads]
//! ```
//!
//! See [`format`] for details.
//!
//! ## Usage
//!
//! ```rust
//! use xnbcode::{Content, TypeCatalog, Xnb};
//!
//! #[derive(Debug, Default, PartialEq, Content)]
//! #[content(value)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! #[derive(Debug, Default, PartialEq, Content)]
//! struct Level {
//!     name: String,
//!     spawns: Vec<Point>,
//! }
//!
//! let catalog = TypeCatalog::new();
//! let level = Level {
//!     name: "intro".into(),
//!     spawns: vec![Point { x: 1, y: 2 }],
//! };
//! let bytes = Xnb::serialize(&catalog, &level)?;
//! let back: Level = Xnb::load_bytes(&catalog, &bytes)?;
//! assert_eq!(back, level);
//! # Ok::<(), xnbcode::ContentError>(())
//! ```
//!
//! ### Safety and Error Handling
//!
//! * **No unsafe** except the read-only memory map in [`Xnb::load`].
//! * **No Panics:** No `unwrap()` or `panic!()` calls in the library
//!   (enforced by clippy lints).
//! * **Comprehensive Errors:** All failures correspond to a
//!   [`ContentError`] variant.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

// Lets derived code refer to `::xnbcode` from inside this crate's tests.
extern crate self as xnbcode;

// --- PUBLIC API MODULES ---
pub mod api;
pub mod batch;
pub mod catalog;
pub mod compression;
pub mod content;
pub mod error;
pub mod external;
pub mod format;
pub mod inspector;
pub mod math;
pub mod media;
pub mod model;
pub mod multi_array;
pub mod options;
pub mod reader;
pub mod shared;
pub mod time;
pub mod writer;

// --- INTERNAL IMPLEMENTATION MODULES (Hidden from Docs) ---
#[doc(hidden)]
pub mod io;

mod codecs;

// --- MACRO SUPPORT MODULES ---

/// Runtime utilities used by the derived code.
#[doc(hidden)]
pub mod rt;

// --- RE-EXPORTS ---

#[cfg(feature = "lz4_flex")]
pub use compression::Lz4Compressor;
pub use compression::{Compressor, NoCompression};

pub use api::Xnb;
pub use batch::{compile_batch, save_batch};
pub use catalog::{CatalogExtension, Codec, Registrar, TypeCatalog};
pub use content::{Content, ContentObject, DynContent, TypeDescriptor};
pub use error::{ContentError, Result};
pub use external::ExternalReference;
pub use format::{GraphicsProfile, TargetPlatform};
pub use inspector::{ContainerReport, XnbInspector};
pub use multi_array::MultiArray;
pub use options::XnbOptions;
pub use reader::ContentReader;
pub use shared::{SharedRef, SharedSlot};
pub use writer::ContentWriter;

// Re-export the derive macro so it is accessible as `xnbcode::Content`
pub use xnbcode_derive::Content;
