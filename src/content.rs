//! The `Content` trait and the type descriptors that identify codecs on disk.
//!
//! Every serializable shape implements [`Content`]: built-in primitives,
//! generic containers, and records produced by `#[derive(Content)]`. The
//! trait is static (one monomorphized codec per type); the
//! [`TypeCatalog`](crate::catalog::TypeCatalog) erases it into a
//! [`Codec`](crate::catalog::Codec) record for polymorphic dispatch.

use crate::catalog::Registrar;
use crate::error::{ContentError, Result};
use crate::format::TargetPlatform;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Identifies a serializable shape in a type table.
///
/// `name` is the logical name the local catalog indexes. When
/// `runtime_name` is set, that string is written instead so a different
/// reader-side type can bind to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: String,
    runtime_name: Option<String>,
    version: i32,
}

impl TypeDescriptor {
    /// A non-generic descriptor with version 0.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runtime_name: None,
            version: 0,
        }
    }

    /// A generic instantiation such as `List<Point>`.
    ///
    /// Arguments contribute their logical names to `name` and their written
    /// names to the runtime name, so an override on an element type flows
    /// through every container of it.
    pub fn generic(base: &str, args: &[TypeDescriptor]) -> Self {
        let join = |pick: fn(&TypeDescriptor) -> &str| {
            let parts: Vec<&str> = args.iter().map(pick).collect();
            format!("{base}<{}>", parts.join(","))
        };
        let name = join(TypeDescriptor::name);
        let written = join(TypeDescriptor::written_name);
        Self {
            runtime_name: (written != name).then_some(written),
            name,
            version: 0,
        }
    }

    /// Sets the type version written next to the descriptor.
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Sets the name written to disk in place of the logical name.
    pub fn with_runtime_name(mut self, runtime_name: impl Into<String>) -> Self {
        self.runtime_name = Some(runtime_name.into());
        self
    }

    /// The logical name the local catalog indexes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name that goes into the type table.
    pub fn written_name(&self) -> &str {
        self.runtime_name.as_deref().unwrap_or(&self.name)
    }

    /// The runtime-type override, if any.
    pub fn runtime_name(&self) -> Option<&str> {
        self.runtime_name.as_deref()
    }

    /// The type version.
    pub fn version(&self) -> i32 {
        self.version
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.runtime_name {
            Some(rt) => write!(f, "{} (as {rt}) v{}", self.name, self.version),
            None => write!(f, "{} v{}", self.name, self.version),
        }
    }
}

/// A type that can be written to and read from a container.
///
/// # Framing
/// Value-like types (`VALUE_TYPE = true`) are always present and are written
/// inline wherever they appear. Reference-like types are written through the
/// null-safe polymorphic encoding: a 7-bit type-table index plus one, with 0
/// meaning null, followed by the payload.
///
/// # Reuse
/// [`Content::read_content_into`] decodes into an existing instance. The
/// default replaces the value; collections and records override it to
/// mutate in place.
pub trait Content: Any + Send + Sync + Sized {
    /// Written inline, without the type-index wrapper.
    const VALUE_TYPE: bool = false;

    /// Built-in leaf codec. Primitives enter a session's type table only when
    /// written polymorphically, never as another codec's dependency.
    const PRIMITIVE: bool = false;

    /// Has no type-table entry of its own; registration forwards to the
    /// dependencies (e.g. `Option<String>`, [`ContentObject`]).
    const TRANSPARENT: bool = false;

    /// The descriptor identifying this type in a type table.
    fn descriptor() -> TypeDescriptor;

    /// Registers the codecs this codec calls into (elements, members, base).
    fn register_dependencies(_registrar: &mut Registrar<'_>) {}

    /// Whether a container holding this type may be compressed.
    ///
    /// Already-compressed payloads (encoded audio or video) return `false`,
    /// which disables compression for the whole container.
    fn should_compress(_platform: TargetPlatform) -> bool {
        true
    }

    /// Writes the payload (without any type-index framing).
    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()>;

    /// Reads a new instance.
    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self>;

    /// Reads into an existing instance.
    fn read_content_into(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        *self = Self::read_content(reader)?;
        Ok(())
    }

    /// The polymorphic value carried by an object slot, if this is one.
    fn as_dyn(&self) -> Option<&dyn DynContent> {
        None
    }

    /// Converts a polymorphically decoded value into `Self`.
    fn from_dyn(value: Box<dyn DynContent>) -> Result<Self> {
        let found = value.content_type_name();
        value
            .into_any()
            .downcast::<Self>()
            .map(|b| *b)
            .map_err(|_| {
                ContentError::Schema(format!(
                    "expected {} but the container holds {found}",
                    std::any::type_name::<Self>()
                ))
            })
    }
}

/// Object-safe view of any [`Content`] value.
pub trait DynContent: Any + Send + Sync {
    /// Borrow as `Any` for downcasting. Always call through the trait object,
    /// never on a `Box` or `Arc` directly.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed `Any` for owned downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    /// Convert into a shared `Any` for shared-resource downcasting.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// The Rust type name of the concrete value.
    fn content_type_name(&self) -> &'static str;

    /// The `TypeId` of the concrete value.
    fn content_type_id(&self) -> TypeId;

    /// Writes the concrete value through the writer's polymorphic path.
    fn write_dyn(&self, writer: &mut ContentWriter<'_>) -> Result<()>;
}

impl<T: Content> DynContent for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn content_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn content_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn write_dyn(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_object(Some(self))
    }
}

impl dyn DynContent {
    /// Downcasts to a concrete reference.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns true if the concrete value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.content_type_id() == TypeId::of::<T>()
    }
}

impl fmt::Debug for dyn DynContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DynContent({})", self.content_type_name())
    }
}

/// A fully polymorphic, non-null "object" slot.
///
/// Its runtime type is unknown at bind time, so it is always written as a
/// type index plus payload. Use `Option<ContentObject>` for a nullable slot.
pub struct ContentObject(Box<dyn DynContent>);

impl ContentObject {
    /// Wraps any content value.
    pub fn new<T: Content>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Wraps an already boxed value.
    pub fn from_boxed(value: Box<dyn DynContent>) -> Self {
        Self(value)
    }

    /// Borrow the inner value.
    pub fn get(&self) -> &dyn DynContent {
        self.0.as_ref()
    }

    /// Downcasts to a concrete reference.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().downcast_ref::<T>()
    }

    /// Downcasts into the concrete value.
    pub fn downcast<T: Content>(self) -> Option<T> {
        T::from_dyn(self.0).ok()
    }

    /// The Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.0.content_type_name()
    }
}

impl fmt::Debug for ContentObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentObject").field(&self.0).finish()
    }
}

impl Content for ContentObject {
    const TRANSPARENT: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("Object")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        self.0.as_ref().write_dyn(writer)
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        reader.read_member()
    }

    fn as_dyn(&self) -> Option<&dyn DynContent> {
        Some(self.0.as_ref())
    }

    fn from_dyn(value: Box<dyn DynContent>) -> Result<Self> {
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_descriptor_tracks_runtime_names() {
        let plain = TypeDescriptor::generic("List", &[TypeDescriptor::new("Point")]);
        assert_eq!(plain.name(), "List<Point>");
        assert_eq!(plain.runtime_name(), None);

        let texture = TypeDescriptor::new("TextureContent").with_runtime_name("Texture2D");
        let list = TypeDescriptor::generic("List", &[texture]);
        assert_eq!(list.name(), "List<TextureContent>");
        assert_eq!(list.written_name(), "List<Texture2D>");
    }

    #[test]
    fn object_slot_downcasts() {
        let obj = ContentObject::new(42i32);
        assert_eq!(obj.downcast_ref::<i32>(), Some(&42));
        assert!(obj.downcast_ref::<u8>().is_none());
        assert_eq!(obj.downcast::<i32>(), Some(42));
    }
}
