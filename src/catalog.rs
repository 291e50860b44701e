//! The process-wide type catalog.
//!
//! A [`TypeCatalog`] is constructed once and passed by reference into every
//! write and read session. It maps a Rust type to its erased [`Codec`] and a
//! logical descriptor name back to the codec, which is how the reader binds
//! type-table entries.
//!
//! Registration of a type recursively registers everything its codec calls
//! into (container elements, record members, base records). The whole
//! recursion runs under one write lock through a [`Registrar`], so concurrent
//! first use of the same generic instantiation from several sessions is
//! idempotent and no session ever observes a half-registered type.
//!
//! # Collisions
//! At most one codec exists per Rust type. When two types claim the same
//! logical name, the first one registered keeps the name and the collision is
//! logged.

use crate::codecs;
use crate::content::{Content, DynContent, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::format::TargetPlatform;
use crate::reader::ContentReader;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Decodes one value of the codec's type behind the polymorphic interface.
pub type DecodeFn = fn(&mut ContentReader<'_>) -> Result<Box<dyn DynContent>>;

/// The erased codec for one registered type.
pub struct Codec {
    type_id: TypeId,
    rust_name: &'static str,
    descriptor: TypeDescriptor,
    value_type: bool,
    primitive: bool,
    dependencies: Vec<TypeId>,
    should_compress: fn(TargetPlatform) -> bool,
    decode: DecodeFn,
}

fn decode_erased<T: Content>(reader: &mut ContentReader<'_>) -> Result<Box<dyn DynContent>> {
    Ok(Box::new(T::read_content(reader)?))
}

impl Codec {
    fn of<T: Content>(dependencies: Vec<TypeId>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
            descriptor: T::descriptor(),
            value_type: T::VALUE_TYPE,
            primitive: T::PRIMITIVE,
            dependencies,
            should_compress: T::should_compress,
            decode: decode_erased::<T>,
        }
    }

    /// The `TypeId` of the Rust type this codec handles.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name, for diagnostics.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// The descriptor written to type tables.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Whether values are written inline without type framing.
    pub fn is_value_type(&self) -> bool {
        self.value_type
    }

    /// Whether this is a built-in leaf codec.
    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    /// Types this codec calls into, in first-use order.
    pub fn dependencies(&self) -> &[TypeId] {
        &self.dependencies
    }

    /// Evaluates the compression predicate for `platform`.
    pub fn should_compress(&self, platform: TargetPlatform) -> bool {
        (self.should_compress)(platform)
    }

    /// Decodes one value behind the polymorphic interface.
    pub fn decode(&self, reader: &mut ContentReader<'_>) -> Result<Box<dyn DynContent>> {
        (self.decode)(reader)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("rust_name", &self.rust_name)
            .field("descriptor", &self.descriptor)
            .field("value_type", &self.value_type)
            .field("primitive", &self.primitive)
            .field("dependencies", &self.dependencies.len())
            .finish()
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    by_type: HashMap<TypeId, Arc<Codec>>,
    by_name: HashMap<String, TypeId>,
    by_alias: HashMap<String, TypeId>,
    order: Vec<TypeId>,
}

impl CatalogState {
    fn insert(&mut self, codec: Codec) {
        let id = codec.type_id;
        let name = codec.descriptor.name().to_owned();
        match self.by_name.get(&name) {
            Some(owner) if *owner != id => {
                let owner_name = self
                    .by_type
                    .get(owner)
                    .map(|c| c.rust_name)
                    .unwrap_or("<unknown>");
                log::warn!(
                    "descriptor name `{name}` already registered by {owner_name}; {} keeps its codec but not the name",
                    codec.rust_name
                );
            }
            Some(_) => {}
            None => {
                self.by_name.insert(name, id);
            }
        }
        if let Some(alias) = codec.descriptor.runtime_name() {
            self.by_alias.entry(alias.to_owned()).or_insert(id);
        }
        log::debug!("registered codec {} for {}", codec.descriptor, codec.rust_name);
        self.order.push(id);
        self.by_type.insert(id, Arc::new(codec));
    }

    fn lookup(&self, name: &str) -> Option<&Arc<Codec>> {
        self.by_name
            .get(name)
            .or_else(|| self.by_alias.get(name))
            .and_then(|id| self.by_type.get(id))
    }
}

/// Exclusive registration context handed to [`Content::register_dependencies`]
/// and to [`CatalogExtension`]s.
pub struct Registrar<'a> {
    state: &'a mut CatalogState,
    in_progress: HashSet<TypeId>,
    collecting: Vec<Vec<TypeId>>,
}

impl<'a> Registrar<'a> {
    fn new(state: &'a mut CatalogState) -> Self {
        Self {
            state,
            in_progress: HashSet::new(),
            collecting: Vec::new(),
        }
    }

    /// Registers `T` (if new) and records it as a dependency of the codec
    /// currently being registered.
    pub fn include<T: Content>(&mut self) {
        if T::TRANSPARENT {
            T::register_dependencies(self);
            return;
        }

        let id = TypeId::of::<T>();
        if let Some(deps) = self.collecting.last_mut()
            && !deps.contains(&id)
        {
            deps.push(id);
        }

        if self.state.by_type.contains_key(&id) || !self.in_progress.insert(id) {
            return;
        }

        self.collecting.push(Vec::new());
        T::register_dependencies(self);
        let deps = self.collecting.pop().unwrap_or_default();
        self.in_progress.remove(&id);

        self.state.insert(Codec::of::<T>(deps));
    }

    /// Returns true if `T` already has a codec.
    pub fn contains<T: Content>(&self) -> bool {
        self.state.by_type.contains_key(&TypeId::of::<T>())
    }
}

/// A bundle of codecs registered together, e.g. by a content library.
pub trait CatalogExtension {
    /// Registers this extension's codecs.
    fn register(&self, registrar: &mut Registrar<'_>);
}

/// Registry of every codec known to the process.
///
/// `TypeCatalog` is `Send + Sync`; share it by reference (or `Arc`) between
/// sessions.
#[derive(Debug)]
pub struct TypeCatalog {
    state: RwLock<CatalogState>,
}

impl TypeCatalog {
    /// Creates a catalog with every built-in primitive and math codec.
    pub fn new() -> Self {
        let catalog = Self::empty();
        if let Ok(mut state) = catalog.state.write() {
            codecs::register_builtins(&mut Registrar::new(&mut state));
        }
        catalog
    }

    /// Creates a catalog with no codecs at all.
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogState>> {
        self.state
            .read()
            .map_err(|_| ContentError::Internal("TypeCatalog lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogState>> {
        self.state
            .write()
            .map_err(|_| ContentError::Internal("TypeCatalog lock poisoned".into()))
    }

    /// Registers `T` and everything its codec depends on.
    pub fn register<T: Content>(&self) -> Result<()> {
        if !T::TRANSPARENT && self.read()?.by_type.contains_key(&TypeId::of::<T>()) {
            return Ok(());
        }
        let mut state = self.write()?;
        Registrar::new(&mut state).include::<T>();
        Ok(())
    }

    /// Runs an extension's registrations.
    pub fn extend(&self, extension: &dyn CatalogExtension) -> Result<()> {
        let mut state = self.write()?;
        extension.register(&mut Registrar::new(&mut state));
        Ok(())
    }

    /// Returns the codec for `T`, registering it on first use.
    ///
    /// # Errors
    /// Transparent wrappers have no codec of their own and yield
    /// [`ContentError::Schema`].
    pub fn resolve<T: Content>(&self) -> Result<Arc<Codec>> {
        if T::TRANSPARENT {
            return Err(ContentError::Schema(format!(
                "{} is a transparent wrapper and has no codec of its own",
                std::any::type_name::<T>()
            )));
        }
        let id = TypeId::of::<T>();
        if let Some(codec) = self.read()?.by_type.get(&id) {
            return Ok(Arc::clone(codec));
        }

        let mut state = self.write()?;
        Registrar::new(&mut state).include::<T>();
        state.by_type.get(&id).cloned().ok_or_else(|| {
            ContentError::Internal(format!(
                "registration of {} produced no codec",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Looks up a codec by Rust type.
    pub fn by_type_id(&self, id: TypeId) -> Result<Option<Arc<Codec>>> {
        Ok(self.read()?.by_type.get(&id).cloned())
    }

    /// Looks up a codec by descriptor name.
    ///
    /// Logical names take precedence; a runtime-name override is accepted
    /// when no type claims it as its logical name.
    pub fn by_name(&self, name: &str) -> Result<Option<Arc<Codec>>> {
        Ok(self.read()?.lookup(name).cloned())
    }

    /// Descriptors of all registered codecs, in registration order.
    pub fn descriptors(&self) -> Result<Vec<TypeDescriptor>> {
        let state = self.read()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.by_type.get(id))
            .map(|c| c.descriptor.clone())
            .collect())
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.read().map(|s| s.by_type.len()).unwrap_or(0)
    }

    /// Returns true if no codec is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2;
    use std::collections::HashMap;

    #[test]
    fn builtins_are_registered_by_name() -> Result<()> {
        let catalog = TypeCatalog::new();
        let codec = catalog.by_name("Int32")?.ok_or_else(|| ContentError::Internal("missing".into()))?;
        assert_eq!(codec.type_id(), TypeId::of::<i32>());
        assert!(codec.is_primitive());
        assert!(catalog.by_name("Vector2")?.is_some());
        Ok(())
    }

    #[test]
    fn generic_instantiations_register_their_elements() -> Result<()> {
        let catalog = TypeCatalog::empty();
        let codec = catalog.resolve::<HashMap<String, Vec<Vector2>>>()?;
        assert_eq!(codec.descriptor().name(), "Dictionary<String,List<Vector2>>");
        assert_eq!(codec.dependencies().len(), 2);
        assert!(catalog.by_name("List<Vector2>")?.is_some());
        assert!(catalog.by_name("Vector2")?.is_some());
        assert!(catalog.by_name("String")?.is_some());
        Ok(())
    }

    #[test]
    fn transparent_types_have_no_codec() {
        let catalog = TypeCatalog::new();
        assert!(matches!(
            catalog.resolve::<Option<String>>(),
            Err(ContentError::Schema(_))
        ));
        assert!(catalog.resolve::<Option<i32>>().is_ok());
    }

    #[test]
    fn extensions_register_in_order() -> Result<()> {
        struct Bundle;
        impl CatalogExtension for Bundle {
            fn register(&self, registrar: &mut Registrar<'_>) {
                registrar.include::<Vec<u8>>();
                registrar.include::<Vec<u16>>();
            }
        }

        let catalog = TypeCatalog::empty();
        catalog.extend(&Bundle)?;
        let names: Vec<String> = catalog
            .descriptors()?
            .iter()
            .map(|d| d.name().to_owned())
            .collect();
        assert_eq!(names, ["Byte", "List<Byte>", "UInt16", "List<UInt16>"]);
        Ok(())
    }

    #[test]
    fn concurrent_first_use_registers_once() -> Result<()> {
        let catalog = TypeCatalog::new();
        let before = catalog.len();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| catalog.resolve::<Vec<Option<Vector2>>>().map(|_| ()));
            }
        });
        assert_eq!(catalog.len(), before + 2);
        Ok(())
    }
}
