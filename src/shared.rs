//! Shared resources: values referenced from many places in one graph but
//! serialized exactly once.
//!
//! The writer identifies a shared value by the address of its `Arc`, so two
//! [`SharedRef`]s cloned from the same allocation share one slot. On the read
//! side every shared field is installed as an unresolved cell during the main
//! graph pass and bound after all shared payloads have been decoded, which
//! makes forward and cyclic references between shared resources legal.

use crate::catalog::Registrar;
use crate::content::Content;
use crate::error::Result;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A possibly-null reference to a shared resource.
pub struct SharedRef<T> {
    cell: Arc<OnceLock<Arc<T>>>,
}

impl<T> SharedRef<T> {
    /// References an existing shared value.
    pub fn new(value: Arc<T>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(value);
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Wraps `value` in a fresh allocation.
    pub fn from_value(value: T) -> Self {
        Self::new(Arc::new(value))
    }

    /// A null reference (also the state of a slot awaiting resolution).
    pub fn empty() -> Self {
        Self {
            cell: Arc::new(OnceLock::new()),
        }
    }

    /// The referenced value, or `None` when null or not yet resolved.
    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    /// Returns true if the reference points at a value.
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns true if both references point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn binding_cell(&self) -> Arc<OnceLock<Arc<T>>> {
        Arc::clone(&self.cell)
    }
}

impl<T> Clone for SharedRef<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Default for SharedRef<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(v) => f.debug_tuple("SharedRef").field(v).finish(),
            None => f.write_str("SharedRef(null)"),
        }
    }
}

impl<T: PartialEq> PartialEq for SharedRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get().map(|v| &**v) == other.get().map(|v| &**v)
    }
}

impl<T> From<Arc<T>> for SharedRef<T> {
    fn from(value: Arc<T>) -> Self {
        Self::new(value)
    }
}

/// A field that is written through the shared-resource path.
///
/// Implemented for [`SharedRef`] and collections of it; used by fields marked
/// `#[content(shared)]`.
pub trait SharedSlot {
    /// Writes the slot index (or indices).
    fn write_shared(&self, writer: &mut ContentWriter<'_>) -> Result<()>;
    /// Reads the slot index (or indices) and registers pending bindings.
    fn read_shared(&mut self, reader: &mut ContentReader<'_>) -> Result<()>;
    /// Registers the codecs of the referenced types.
    fn register_shared(registrar: &mut Registrar<'_>);
}

impl<T: Content> SharedSlot for SharedRef<T> {
    fn write_shared(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_shared_resource(self)
    }

    fn read_shared(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        reader.read_shared_resource(self)
    }

    fn register_shared(registrar: &mut Registrar<'_>) {
        registrar.include::<T>();
    }
}

impl<T: Content> SharedSlot for Vec<SharedRef<T>> {
    fn write_shared(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_count(self.len())?;
        self.iter().try_for_each(|slot| writer.write_shared_resource(slot))
    }

    fn read_shared(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        let count = reader.read_count()?;
        self.clear();
        self.reserve(count.min(reader.remaining()));
        for _ in 0..count {
            let mut slot = SharedRef::empty();
            reader.read_shared_resource(&mut slot)?;
            self.push(slot);
        }
        Ok(())
    }

    fn register_shared(registrar: &mut Registrar<'_>) {
        registrar.include::<T>();
    }
}
