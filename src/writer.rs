//! Serializes an object graph into a container.
//!
//! A [`ContentWriter`] is one write session. The root and everything
//! reachable from it is written into an in-memory body; shared resources
//! are collected along the way and appended after the main graph. Only once
//! the body is complete are the type table and header emitted, because the
//! table lists exactly the codecs the session used and the header records
//! the final size.
//!
//! ```text
//! Idle -> WritingMainGraph -> WritingSharedResources -> WritingTypeTable
//!      -> WritingHeader -> Finalized
//! ```
//!
//! No byte reaches the destination before [`ContentWriter::finish`] has
//! assembled the complete container, so a failing codec never leaves a
//! partial file behind.

use crate::catalog::{Codec, TypeCatalog};
use crate::compression::body_compressor;
use crate::content::{Content, DynContent, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::external;
use crate::format::{ContainerHeader, FORMAT_VERSION, Flags, HEADER_SIZE};
use crate::io;
use crate::options::XnbOptions;
use crate::shared::SharedRef;
use std::any::TypeId;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Where a write session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriterPhase {
    /// Nothing written yet.
    Idle,
    /// Writing the root object and everything reachable from it.
    WritingMainGraph,
    /// Draining the shared-resource queue.
    WritingSharedResources,
    /// Emitting the type table; no new types may be added.
    WritingTypeTable,
    /// Emitting the header.
    WritingHeader,
    /// The container is complete.
    Finalized,
}

/// One write session.
pub struct ContentWriter<'a> {
    catalog: &'a TypeCatalog,
    options: &'a XnbOptions,
    phase: WriterPhase,
    body: Vec<u8>,
    type_table: Vec<Arc<Codec>>,
    type_slots: HashMap<TypeId, usize>,
    shared: Vec<Arc<dyn DynContent>>,
    shared_slots: HashMap<usize, usize>,
}

impl<'a> ContentWriter<'a> {
    /// Starts a new session.
    pub fn new(catalog: &'a TypeCatalog, options: &'a XnbOptions) -> Self {
        Self {
            catalog,
            options,
            phase: WriterPhase::Idle,
            body: Vec::new(),
            type_table: Vec::new(),
            type_slots: HashMap::new(),
            shared: Vec::new(),
            shared_slots: HashMap::new(),
        }
    }

    /// Writes `root` and returns the complete container bytes.
    pub fn compile<T: Content>(
        catalog: &'a TypeCatalog,
        options: &'a XnbOptions,
        root: &T,
    ) -> Result<Vec<u8>> {
        let mut writer = Self::new(catalog, options);
        writer.write_root(root)?;
        writer.finish()
    }

    /// The catalog this session resolves codecs from.
    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    /// The session options.
    pub fn options(&self) -> &'a XnbOptions {
        self.options
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> WriterPhase {
        self.phase
    }

    /// Descriptors of the types used so far, in type-table order.
    pub fn type_table(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.type_table.iter().map(|c| c.descriptor())
    }

    /// Number of shared resources discovered so far.
    pub fn shared_count(&self) -> usize {
        self.shared.len()
    }

    // --- Primitive writes ---

    /// Writes one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.body.push(value);
    }

    /// Writes raw bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// Writes a boolean as one byte (0 or 1).
    pub fn write_bool(&mut self, value: bool) {
        self.body.push(u8::from(value));
    }

    /// Writes a signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `i16`.
    pub fn write_i16(&mut self, value: i16) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian IEEE-754 single.
    pub fn write_f32(&mut self, value: f32) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a little-endian IEEE-754 double.
    pub fn write_f64(&mut self, value: f64) {
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a character as its UTF-8 bytes.
    pub fn write_char(&mut self, value: char) {
        let mut buf = [0u8; 4];
        self.body
            .extend_from_slice(value.encode_utf8(&mut buf).as_bytes());
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        io::write_string(&mut self.body, value)
    }

    /// Writes a 7-bit variable-length integer.
    pub fn write_7bit_encoded(&mut self, value: u32) {
        io::write_7bit_encoded(&mut self.body, value);
    }

    /// Writes a collection length as a 7-bit integer.
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| {
            ContentError::Framing(format!("count {count} does not fit the 32-bit encoding"))
        })?;
        self.write_7bit_encoded(count);
        Ok(())
    }

    // --- Graph writes ---

    /// Writes a possibly-null object with its type index.
    ///
    /// `None` is written as index 0. Object slots ([`ContentObject`]) are
    /// dispatched on their runtime type.
    ///
    /// [`ContentObject`]: crate::ContentObject
    pub fn write_object<T: Content>(&mut self, value: Option<&T>) -> Result<()> {
        let Some(value) = value else {
            self.write_7bit_encoded(0);
            return Ok(());
        };
        if let Some(inner) = value.as_dyn() {
            return inner.write_dyn(self);
        }
        if T::TRANSPARENT {
            return value.write_content(self);
        }
        let codec = self.catalog.resolve::<T>()?;
        let slot = self.table_slot(codec)?;
        self.write_type_index(slot)?;
        value.write_content(self)
    }

    /// Writes a non-null member: inline for value types, framed otherwise.
    pub fn write_member<T: Content>(&mut self, value: &T) -> Result<()> {
        if T::VALUE_TYPE {
            value.write_content(self)
        } else {
            self.write_object(Some(value))
        }
    }

    /// Writes a shared-resource slot index and queues the payload.
    ///
    /// The payload is written once per distinct `Arc` after the main graph;
    /// every reference to it is a 1-based slot index, 0 meaning null.
    pub fn write_shared_resource<T: Content>(&mut self, slot: &SharedRef<T>) -> Result<()> {
        let Some(value) = slot.get() else {
            self.write_7bit_encoded(0);
            return Ok(());
        };
        let key = Arc::as_ptr(value) as *const () as usize;
        let index = match self.shared_slots.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.shared.len();
                self.shared_slots.insert(key, index);
                self.shared.push(Arc::clone(value) as Arc<dyn DynContent>);
                index
            }
        };
        self.write_count(index + 1)
    }

    /// Writes a reference to another container as a relative path string.
    ///
    /// The target must carry the container extension and lie under the
    /// configured content root. It is written without its extension,
    /// relative to the relocation path, using `/` separators. `None` is
    /// written as the empty string.
    pub fn write_external_reference(&mut self, target: Option<&Path>) -> Result<()> {
        let relative = match target {
            Some(path) => external::relative_reference(path, self.options)?,
            None => String::new(),
        };
        self.write_string(&relative)
    }

    fn write_type_index(&mut self, slot: usize) -> Result<()> {
        self.write_count(slot + 1)
    }

    /// Assigns a type-table slot to `codec`, adding its non-primitive
    /// dependencies transitively.
    fn table_slot(&mut self, codec: Arc<Codec>) -> Result<usize> {
        if let Some(&slot) = self.type_slots.get(&codec.type_id()) {
            return Ok(slot);
        }
        if self.phase >= WriterPhase::WritingTypeTable {
            return Err(ContentError::Internal(format!(
                "type {} discovered after the type table was frozen",
                codec.descriptor()
            )));
        }

        let slot = self.type_table.len();
        self.type_slots.insert(codec.type_id(), slot);
        self.type_table.push(Arc::clone(&codec));
        log::trace!("type slot {slot}: {}", codec.descriptor());

        for dep in codec.dependencies() {
            let dep_codec = self.catalog.by_type_id(*dep)?.ok_or_else(|| {
                ContentError::Internal(format!(
                    "dependency of {} missing from the catalog",
                    codec.rust_name()
                ))
            })?;
            if !dep_codec.is_primitive() {
                self.table_slot(dep_codec)?;
            }
        }
        Ok(slot)
    }

    // --- Session ---

    /// Writes the root object of the graph.
    pub fn write_root<T: Content>(&mut self, root: &T) -> Result<()> {
        if self.phase != WriterPhase::Idle {
            return Err(ContentError::Internal(format!(
                "root written in phase {:?}",
                self.phase
            )));
        }
        self.phase = WriterPhase::WritingMainGraph;
        self.write_object(Some(root))
    }

    fn write_shared_payloads(&mut self) -> Result<()> {
        self.phase = WriterPhase::WritingSharedResources;
        // Payloads may reference further shared resources, growing the queue.
        let mut next = 0;
        while let Some(value) = self.shared.get(next).cloned() {
            value.as_ref().write_dyn(self)?;
            next += 1;
        }
        Ok(())
    }

    fn assemble_body(&mut self) -> Result<Vec<u8>> {
        self.phase = WriterPhase::WritingTypeTable;
        let mut body = Vec::with_capacity(self.body.len() + 16 * self.type_table.len() + 8);
        let count = u32::try_from(self.type_table.len())
            .map_err(|_| ContentError::Framing("too many types".into()))?;
        io::write_7bit_encoded(&mut body, count);
        for codec in &self.type_table {
            let descriptor = codec.descriptor();
            io::write_string(&mut body, descriptor.written_name())?;
            body.extend_from_slice(&descriptor.version().to_le_bytes());
        }
        let shared = u32::try_from(self.shared.len())
            .map_err(|_| ContentError::Framing("too many shared resources".into()))?;
        io::write_7bit_encoded(&mut body, shared);
        body.extend_from_slice(&self.body);
        Ok(body)
    }

    fn compression_allowed(&self) -> bool {
        self.options.compress
            && self
                .type_table
                .iter()
                .all(|c| c.should_compress(self.options.platform))
    }

    /// Completes the session and returns the container bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.phase != WriterPhase::WritingMainGraph {
            return Err(ContentError::Internal(format!(
                "finish called in phase {:?}",
                self.phase
            )));
        }
        self.write_shared_payloads()?;
        let body = self.assemble_body()?;

        self.phase = WriterPhase::WritingHeader;
        let compress = self.compression_allowed();
        if self.options.compress && !compress {
            log::debug!("compression disabled by a type in the table");
        }

        let mut out;
        if compress {
            let packed = body_compressor()?.compress(&body)?;
            let decompressed = u32::try_from(body.len())
                .map_err(|_| ContentError::Framing("body exceeds 4 GiB".into()))?;
            out = Vec::with_capacity(HEADER_SIZE + 4 + packed.len());
            out.extend_from_slice(&[0u8; HEADER_SIZE]);
            out.extend_from_slice(&decompressed.to_le_bytes());
            out.extend_from_slice(&packed);
        } else {
            out = Vec::with_capacity(HEADER_SIZE + body.len());
            out.extend_from_slice(&[0u8; HEADER_SIZE]);
            out.extend_from_slice(&body);
        }

        let total_size = u32::try_from(out.len()).map_err(|_| {
            ContentError::Framing(format!("container of {} bytes exceeds 4 GiB", out.len()))
        })?;
        let header = ContainerHeader {
            platform: self.options.platform,
            version: FORMAT_VERSION,
            flags: Flags::new(self.options.profile, compress),
            total_size,
        };
        out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

        self.phase = WriterPhase::Finalized;
        log::debug!(
            "container complete: {} types, {} shared, {total_size} bytes{}",
            self.type_table.len(),
            self.shared.len(),
            if compress { " (lz4)" } else { "" }
        );
        Ok(out)
    }
}

impl std::fmt::Debug for ContentWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentWriter")
            .field("phase", &self.phase)
            .field("body_len", &self.body.len())
            .field("types", &self.type_table.len())
            .field("shared", &self.shared.len())
            .finish()
    }
}
