//! High-level entry points.
//!
//! [`Xnb`] wraps a write or read session for the common cases: compile a
//! root object to bytes or a file, load a root object back, reload into a
//! live instance, and inspect a container without decoding it. Every
//! function takes the [`TypeCatalog`] explicitly.

use crate::catalog::TypeCatalog;
use crate::content::Content;
use crate::error::Result;
use crate::inspector::{ContainerReport, XnbInspector};
use crate::options::XnbOptions;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// The main entry point for compiling and loading containers.
#[derive(Debug)]
pub struct Xnb;

impl Xnb {
    /// Starts an options builder.
    ///
    /// ```rust
    /// use xnbcode::{TargetPlatform, TypeCatalog, Xnb};
    ///
    /// let catalog = TypeCatalog::new();
    /// let bytes = Xnb::builder()
    ///     .platform(TargetPlatform::DesktopGL)
    ///     .compress(false)
    ///     .serialize(&catalog, &vec![1u8, 2, 3])?;
    /// assert_eq!(bytes[3], b'd');
    /// # Ok::<(), xnbcode::ContentError>(())
    /// ```
    pub fn builder() -> XnbOptions {
        XnbOptions::default()
    }

    /// Compiles `root` into container bytes with default options.
    pub fn serialize<T: Content>(catalog: &TypeCatalog, root: &T) -> Result<Vec<u8>> {
        XnbOptions::default().serialize(catalog, root)
    }

    /// Compiles `root` and writes the container to `out`.
    pub fn write<T: Content, W: Write>(catalog: &TypeCatalog, out: W, root: &T) -> Result<()> {
        XnbOptions::default().write(catalog, out, root)
    }

    /// Compiles `root` and saves the container to `path`.
    pub fn save<T: Content, P: AsRef<Path>>(catalog: &TypeCatalog, path: P, root: &T) -> Result<()> {
        XnbOptions::default().save(catalog, path, root)
    }

    /// Loads a root object from container bytes.
    pub fn load_bytes<T: Content>(catalog: &TypeCatalog, bytes: &[u8]) -> Result<T> {
        ContentReader::read(catalog, bytes)
    }

    /// Loads a root object from a container file.
    ///
    /// The file is memory-mapped; an uncompressed body is decoded straight
    /// from the mapping.
    pub fn load<T: Content, P: AsRef<Path>>(catalog: &TypeCatalog, path: P) -> Result<T> {
        let file = File::open(path)?;
        // The mapping is read-only and dropped before returning; the decoded
        // value owns all of its data.
        #[allow(unsafe_code)]
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::load_bytes(catalog, &mmap)
    }

    /// Decodes container bytes into an existing root instance.
    ///
    /// On failure `existing` may be partially updated and should be
    /// discarded.
    pub fn load_into<T: Content>(catalog: &TypeCatalog, bytes: &[u8], existing: &mut T) -> Result<()> {
        catalog.register::<T>()?;
        ContentReader::new(catalog, bytes)?.read_root_into(existing)
    }

    /// Reports the header and type table of container bytes.
    pub fn inspect_bytes(bytes: &[u8]) -> Result<ContainerReport> {
        XnbInspector::inspect_bytes(bytes)
    }

    /// Reports the header and type table of a container file.
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<ContainerReport> {
        XnbInspector::inspect(path)
    }
}

impl XnbOptions {
    /// Compiles `root` into container bytes with these options.
    pub fn serialize<T: Content>(&self, catalog: &TypeCatalog, root: &T) -> Result<Vec<u8>> {
        ContentWriter::compile(catalog, self, root)
    }

    /// Compiles `root` and writes the finished container to `out`.
    ///
    /// Nothing is written to `out` if compilation fails.
    pub fn write<T: Content, W: Write>(&self, catalog: &TypeCatalog, mut out: W, root: &T) -> Result<()> {
        let bytes = self.serialize(catalog, root)?;
        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    }

    /// Compiles `root` and saves it to `path`.
    ///
    /// The file is only created once the container is complete.
    pub fn save<T: Content, P: AsRef<Path>>(&self, catalog: &TypeCatalog, path: P, root: &T) -> Result<()> {
        let bytes = self.serialize(catalog, root)?;
        std::fs::write(path.as_ref(), &bytes)?;
        log::debug!("saved {} bytes to {}", bytes.len(), path.as_ref().display());
        Ok(())
    }
}
