//! Deserializes an object graph from a container.
//!
//! Reading mirrors writing in two phases. The main graph is decoded first;
//! every shared-resource field met along the way is installed as an
//! unresolved [`SharedRef`] cell and recorded as a pending binding. After the
//! main graph, the shared payloads are decoded in slot order and every
//! binding is applied, so forward and cyclic references between shared
//! resources resolve without a second pass over the bytes.
//!
//! The type table is bound before the graph is touched: each entry must name
//! a codec in the [`TypeCatalog`] with the same version, otherwise the read
//! fails before any payload is decoded.

use crate::catalog::{Codec, TypeCatalog};
use crate::compression::body_compressor;
use crate::content::{Content, DynContent};
use crate::error::{ContentError, Result};
use crate::format::{ContainerHeader, DECOMPRESSED_SIZE_FIELD, HEADER_SIZE};
use crate::io::ByteCursor;
use crate::shared::SharedRef;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where a read session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderPhase {
    /// Decoding the root and everything reachable from it.
    ReadingMainGraph,
    /// Decoding shared payloads.
    ReadingSharedResources,
    /// Every pending binding has been applied.
    Resolved,
}

type BindFn = Box<dyn FnOnce(&mut SharedTable) -> Result<()>>;

/// Decoded shared payloads.
///
/// A payload is converted to a field's type on its first binding; later
/// bindings of the same slot and type receive the same `Arc`.
#[derive(Default)]
struct SharedTable {
    raw: Vec<Option<Box<dyn DynContent>>>,
    typed: HashMap<(usize, TypeId), Arc<dyn Any + Send + Sync>>,
}

impl SharedTable {
    fn resolve<T: Content>(&mut self, slot: usize) -> Result<Arc<T>> {
        let key = (slot, TypeId::of::<T>());
        if let Some(cached) = self.typed.get(&key) {
            return Arc::clone(cached).downcast::<T>().map_err(|_| {
                ContentError::Internal(format!("shared slot {slot} cached under the wrong type"))
            });
        }

        let raw = match self.raw.get_mut(slot) {
            Some(entry) => entry.take().ok_or_else(|| {
                ContentError::Schema(format!(
                    "shared resource {} is already bound to a field of another type than {}",
                    slot + 1,
                    std::any::type_name::<T>()
                ))
            })?,
            None => {
                return Err(ContentError::Internal(format!(
                    "shared slot {slot} never decoded"
                )));
            }
        };

        // Object slots wrap the decoded value; every other field type must
        // match it exactly.
        let value: Arc<T> = if raw.as_ref().is::<T>() {
            raw.into_any().downcast::<T>().map(Arc::from).map_err(|_| {
                ContentError::Internal(format!("shared slot {slot} failed to downcast"))
            })?
        } else {
            Arc::new(T::from_dyn(raw)?)
        };
        self.typed
            .insert(key, Arc::clone(&value) as Arc<dyn Any + Send + Sync>);
        Ok(value)
    }
}

/// A shared-resource field waiting for its payload.
pub struct PendingBinding {
    slot: usize,
    expected: &'static str,
    apply: BindFn,
}

impl PendingBinding {
    /// Zero-based shared-resource slot.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Rust type name the field expects.
    pub fn expected(&self) -> &'static str {
        self.expected
    }
}

impl fmt::Debug for PendingBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingBinding")
            .field("slot", &self.slot)
            .field("expected", &self.expected)
            .finish()
    }
}

/// One read session over a complete container.
pub struct ContentReader<'a> {
    catalog: &'a TypeCatalog,
    header: ContainerHeader,
    cursor: ByteCursor<'a>,
    phase: ReaderPhase,
    bound: Vec<Arc<Codec>>,
    shared_count: usize,
    shared: SharedTable,
    pending: Vec<PendingBinding>,
}

impl<'a> ContentReader<'a> {
    /// Validates the header, decompresses the body and binds the type table.
    ///
    /// `bytes` must be the whole container. Types the root may need should
    /// already be registered in `catalog`.
    pub fn new(catalog: &'a TypeCatalog, bytes: &'a [u8]) -> Result<Self> {
        let header = ContainerHeader::parse(bytes)?;
        let rest = &bytes[HEADER_SIZE..];

        let body: Cow<'a, [u8]> = if header.flags.is_compressed() {
            let field = rest.get(..DECOMPRESSED_SIZE_FIELD).ok_or_else(|| {
                ContentError::Framing("compressed container lacks its size field".into())
            })?;
            let decompressed_len =
                u32::from_le_bytes([field[0], field[1], field[2], field[3]]) as usize;
            let packed = &rest[DECOMPRESSED_SIZE_FIELD..];
            Cow::Owned(
                body_compressor()?
                    .decompress(packed, decompressed_len)?
                    .into_owned(),
            )
        } else {
            Cow::Borrowed(rest)
        };

        let mut reader = Self {
            catalog,
            header,
            cursor: ByteCursor::new(body),
            phase: ReaderPhase::ReadingMainGraph,
            bound: Vec::new(),
            shared_count: 0,
            shared: SharedTable::default(),
            pending: Vec::new(),
        };
        reader.bind_type_table()?;
        reader.shared_count = reader.read_count()?;
        log::debug!(
            "opened container for {}: {} types, {} shared",
            header.platform,
            reader.bound.len(),
            reader.shared_count
        );
        Ok(reader)
    }

    /// Reads a complete container whose root is a `T`.
    pub fn read<T: Content>(catalog: &'a TypeCatalog, bytes: &'a [u8]) -> Result<T> {
        catalog.register::<T>()?;
        Self::new(catalog, bytes)?.read_root()
    }

    fn bind_type_table(&mut self) -> Result<()> {
        let count = self.read_count()?;
        self.bound.reserve(count.min(self.cursor.remaining()));
        for index in 0..count {
            let name = self.cursor.read_string()?;
            let version = self.cursor.read_i32()?;
            let codec = self.catalog.by_name(&name)?.ok_or_else(|| {
                ContentError::UnknownType(format!("type table entry {index}: `{name}`"))
            })?;
            let expected = codec.descriptor().version();
            if expected != version {
                return Err(ContentError::Schema(format!(
                    "`{name}` has version {version} in the container but {expected} in the catalog"
                )));
            }
            log::trace!("bound type slot {index}: {name} -> {}", codec.rust_name());
            self.bound.push(codec);
        }
        Ok(())
    }

    /// The parsed header.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// The catalog types are bound against.
    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> ReaderPhase {
        self.phase
    }

    /// Codecs bound to the type table, in slot order.
    pub fn bound_types(&self) -> &[Arc<Codec>] {
        &self.bound
    }

    /// Number of shared resources declared by the container.
    pub fn shared_count(&self) -> usize {
        self.shared_count
    }

    /// Shared-resource fields still waiting for their payloads.
    pub fn pending_bindings(&self) -> &[PendingBinding] {
        &self.pending
    }

    /// Unread bytes in the body.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    // --- Primitive reads ---

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.cursor.read_u8()
    }

    /// Reads exactly `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.cursor.take(len)?.to_vec())
    }

    /// Reads a boolean; any byte other than 0 or 1 is a framing error.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.cursor.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ContentError::Framing(format!(
                "invalid boolean byte 0x{other:02x}"
            ))),
        }
    }

    /// Reads a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.cursor.take_array()?))
    }

    /// Reads a little-endian `i16`.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.cursor.take_array()?))
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.cursor.take_array()?))
    }

    /// Reads a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.cursor.read_i32()
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.cursor.read_u32()
    }

    /// Reads a little-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.cursor.take_array()?))
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.cursor.take_array()?))
    }

    /// Reads a little-endian single.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.cursor.take_array()?))
    }

    /// Reads a little-endian double.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.cursor.take_array()?))
    }

    /// Reads one UTF-8 encoded character.
    pub fn read_char(&mut self) -> Result<char> {
        let lead = self.cursor.read_u8()?;
        let width = match lead {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => {
                return Err(ContentError::Framing(format!(
                    "invalid UTF-8 lead byte 0x{lead:02x}"
                )));
            }
        };
        let mut buf = [lead, 0, 0, 0];
        buf[1..width].copy_from_slice(self.cursor.take(width - 1)?);
        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| ContentError::Framing("invalid UTF-8 character".into()))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        self.cursor.read_string()
    }

    /// Reads a 7-bit variable-length integer.
    pub fn read_7bit_encoded(&mut self) -> Result<u32> {
        self.cursor.read_7bit_encoded()
    }

    /// Reads a collection length.
    pub fn read_count(&mut self) -> Result<usize> {
        Ok(self.cursor.read_7bit_encoded()? as usize)
    }

    // --- Graph reads ---

    fn read_type_slot(&mut self) -> Result<Option<Arc<Codec>>> {
        let index = self.read_count()?;
        if index == 0 {
            return Ok(None);
        }
        self.bound.get(index - 1).cloned().map(Some).ok_or_else(|| {
            ContentError::Framing(format!(
                "type index {index} out of range (table has {} entries)",
                self.bound.len()
            ))
        })
    }

    /// Decodes with `T`'s own codec when the bound entry is `T` or shares
    /// its wire name, and through the erased codec otherwise.
    fn read_with_codec<T: Content>(&mut self, codec: &Codec) -> Result<T> {
        if codec.type_id() == TypeId::of::<T>()
            || (!T::TRANSPARENT
                && codec.descriptor().written_name() == T::descriptor().written_name())
        {
            T::read_content(self)
        } else {
            T::from_dyn(codec.decode(self)?)
        }
    }

    /// Reads a possibly-null object with its type index.
    pub fn read_object<T: Content>(&mut self) -> Result<Option<T>> {
        if T::TRANSPARENT && T::VALUE_TYPE {
            return T::read_content(self).map(Some);
        }
        match self.read_type_slot()? {
            Some(codec) => self.read_with_codec(&codec).map(Some),
            None => Ok(None),
        }
    }

    /// Reads a possibly-null object into `existing`, decoding in place when
    /// the stored type matches the current value.
    pub fn read_object_into<T: Content>(&mut self, existing: &mut Option<T>) -> Result<()> {
        let Some(codec) = self.read_type_slot()? else {
            *existing = None;
            return Ok(());
        };
        match existing {
            Some(value) if codec.type_id() == TypeId::of::<T>() => value.read_content_into(self),
            _ => {
                *existing = Some(self.read_with_codec(&codec)?);
                Ok(())
            }
        }
    }

    /// Reads a non-null member: inline for value types, framed otherwise.
    pub fn read_member<T: Content>(&mut self) -> Result<T> {
        if T::VALUE_TYPE {
            return T::read_content(self);
        }
        self.read_object()?.ok_or_else(|| {
            ContentError::Framing(format!(
                "null found where {} is required",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Reads a non-null member into an existing value.
    pub fn read_member_into<T: Content>(&mut self, existing: &mut T) -> Result<()> {
        if T::VALUE_TYPE {
            return existing.read_content_into(self);
        }
        self.read_framed_into(existing)
    }

    fn read_framed_into<T: Content>(&mut self, existing: &mut T) -> Result<()> {
        let codec = self.read_type_slot()?.ok_or_else(|| {
            ContentError::Framing(format!(
                "null found where {} is required",
                std::any::type_name::<T>()
            ))
        })?;
        if codec.type_id() == TypeId::of::<T>() {
            existing.read_content_into(self)
        } else {
            *existing = self.read_with_codec(&codec)?;
            Ok(())
        }
    }

    /// Reads a shared-resource slot index and defers binding until the
    /// shared payloads have been decoded.
    pub fn read_shared_resource<T: Content>(&mut self, slot: &mut SharedRef<T>) -> Result<()> {
        let index = self.read_count()?;
        *slot = SharedRef::empty();
        if index == 0 {
            return Ok(());
        }
        if index > self.shared_count {
            return Err(ContentError::Framing(format!(
                "shared resource index {index} out of range ({} declared)",
                self.shared_count
            )));
        }

        let cell = slot.binding_cell();
        let shared_slot = index - 1;
        self.pending.push(PendingBinding {
            slot: shared_slot,
            expected: std::any::type_name::<T>(),
            apply: Box::new(move |table| {
                let typed = table.resolve::<T>(shared_slot)?;
                cell.set(typed).map_err(|_| {
                    ContentError::Internal(format!("shared resource {index} bound twice"))
                })
            }),
        });
        Ok(())
    }

    // --- Session ---

    /// Reads the root object and completes the session.
    pub fn read_root<T: Content>(mut self) -> Result<T> {
        let root = self
            .read_object()?
            .ok_or_else(|| ContentError::Framing("container root is null".into()))?;
        self.complete()?;
        Ok(root)
    }

    /// Reads the root object into an existing instance and completes the
    /// session.
    pub fn read_root_into<T: Content>(mut self, existing: &mut T) -> Result<()> {
        if T::TRANSPARENT && T::VALUE_TYPE {
            existing.read_content_into(&mut self)?;
        } else {
            self.read_framed_into(existing)?;
        }
        self.complete()
    }

    /// Decodes the shared payloads and applies every pending binding.
    pub(crate) fn read_shared_resources(&mut self) -> Result<()> {
        self.phase = ReaderPhase::ReadingSharedResources;
        self.shared
            .raw
            .reserve(self.shared_count.min(self.cursor.remaining()));
        for slot in 0..self.shared_count {
            let codec = self.read_type_slot()?.ok_or_else(|| {
                ContentError::Framing(format!("shared resource {} is null", slot + 1))
            })?;
            let value = codec.decode(self)?;
            self.shared.raw.push(Some(value));
        }

        let pending = std::mem::take(&mut self.pending);
        log::trace!("resolving {} shared bindings", pending.len());
        for binding in pending {
            (binding.apply)(&mut self.shared)?;
        }
        self.phase = ReaderPhase::Resolved;
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        self.read_shared_resources()?;
        let trailing = self.cursor.remaining();
        if trailing != 0 {
            return Err(ContentError::Framing(format!(
                "{trailing} unread bytes after the last shared resource"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ContentReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentReader")
            .field("header", &self.header)
            .field("phase", &self.phase)
            .field("position", &self.cursor.position())
            .field("types", &self.bound.len())
            .field("shared_count", &self.shared_count)
            .field("pending", &self.pending.len())
            .finish()
    }
}
