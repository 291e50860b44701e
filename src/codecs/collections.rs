//! Generic container codecs.
//!
//! Elements go through [`ContentWriter::write_member`], so value-like
//! elements are inline and reference-like elements carry a type index.
//! Every container's descriptor is built from its element descriptors.

use crate::catalog::Registrar;
use crate::content::{Content, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::format::TargetPlatform;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

// --- List ---

impl<T: Content> Content for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("List", &[T::descriptor()])
    }

    fn register_dependencies(registrar: &mut Registrar<'_>) {
        registrar.include::<T>();
    }

    fn should_compress(platform: TargetPlatform) -> bool {
        T::should_compress(platform)
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_count(self.len())?;
        self.iter().try_for_each(|item| writer.write_member(item))
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let mut list = Vec::new();
        list.read_content_into(reader)?;
        Ok(list)
    }

    /// Decodes into the existing elements first, then truncates or appends.
    fn read_content_into(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        let count = reader.read_count()?;
        let reused = count.min(self.len());
        self.truncate(reused);
        for item in self.iter_mut() {
            reader.read_member_into(item)?;
        }
        self.reserve((count - reused).min(reader.remaining()));
        for _ in reused..count {
            self.push(reader.read_member()?);
        }
        Ok(())
    }
}

// --- Array ---

impl<T: Content> Content for Box<[T]> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("Array", &[T::descriptor()])
    }

    fn register_dependencies(registrar: &mut Registrar<'_>) {
        registrar.include::<T>();
    }

    fn should_compress(platform: TargetPlatform) -> bool {
        T::should_compress(platform)
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_count(self.len())?;
        self.iter().try_for_each(|item| writer.write_member(item))
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let count = reader.read_count()?;
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(reader.read_member()?);
        }
        Ok(items.into_boxed_slice())
    }

    /// Arrays keep their allocation when the length is unchanged.
    fn read_content_into(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        let count = reader.read_count()?;
        if count != self.len() {
            let mut items = Vec::with_capacity(count.min(reader.remaining()));
            for _ in 0..count {
                items.push(reader.read_member()?);
            }
            *self = items.into_boxed_slice();
            return Ok(());
        }
        self.iter_mut()
            .try_for_each(|item| reader.read_member_into(item))
    }
}

// --- Dictionary ---

/// Entries are written in the map's iteration order, which differs between
/// `HashMap` instances. Use `BTreeMap` where container bytes must be
/// reproducible; both bind to the same `Dictionary<K,V>` descriptor.
impl<K, V, S> Content for HashMap<K, V, S>
where
    K: Content + Eq + Hash,
    V: Content,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("Dictionary", &[K::descriptor(), V::descriptor()])
    }

    fn register_dependencies(registrar: &mut Registrar<'_>) {
        registrar.include::<K>();
        registrar.include::<V>();
    }

    fn should_compress(platform: TargetPlatform) -> bool {
        K::should_compress(platform) && V::should_compress(platform)
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_count(self.len())?;
        for (key, value) in self {
            writer.write_member(key)?;
            writer.write_member(value)?;
        }
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let mut map = HashMap::default();
        map.read_content_into(reader)?;
        Ok(map)
    }

    /// Clears the map and refills it, keeping its allocation and hasher.
    fn read_content_into(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        let count = reader.read_count()?;
        self.clear();
        self.reserve(count.min(reader.remaining()));
        for _ in 0..count {
            let key: K = reader.read_member()?;
            let value: V = reader.read_member()?;
            if self.insert(key, value).is_some() {
                return Err(ContentError::Framing(
                    "duplicate key in dictionary".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Entries are written in key order, so equal maps always produce equal
/// bytes.
impl<K, V> Content for BTreeMap<K, V>
where
    K: Content + Ord,
    V: Content,
{
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("Dictionary", &[K::descriptor(), V::descriptor()])
    }

    fn register_dependencies(registrar: &mut Registrar<'_>) {
        registrar.include::<K>();
        registrar.include::<V>();
    }

    fn should_compress(platform: TargetPlatform) -> bool {
        K::should_compress(platform) && V::should_compress(platform)
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_count(self.len())?;
        for (key, value) in self {
            writer.write_member(key)?;
            writer.write_member(value)?;
        }
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let mut map = BTreeMap::new();
        map.read_content_into(reader)?;
        Ok(map)
    }

    fn read_content_into(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        let count = reader.read_count()?;
        self.clear();
        for _ in 0..count {
            let key: K = reader.read_member()?;
            let value: V = reader.read_member()?;
            if self.insert(key, value).is_some() {
                return Err(ContentError::Framing(
                    "duplicate key in dictionary".into(),
                ));
            }
        }
        Ok(())
    }
}

// --- Nullable / nullable reference ---

/// `Option<T>` has two encodings.
///
/// For value-like `T` it is `Nullable<T>`: a boolean presence flag followed
/// by the inline payload. For reference-like `T` it is transparent: `None`
/// is the 0 type-index sentinel and `Some` is the usual framed object.
impl<T: Content> Content for Option<T> {
    const VALUE_TYPE: bool = true;
    const TRANSPARENT: bool = !T::VALUE_TYPE;

    fn descriptor() -> TypeDescriptor {
        if T::VALUE_TYPE {
            TypeDescriptor::generic("Nullable", &[T::descriptor()])
        } else {
            T::descriptor()
        }
    }

    fn register_dependencies(registrar: &mut Registrar<'_>) {
        registrar.include::<T>();
    }

    fn should_compress(platform: TargetPlatform) -> bool {
        T::should_compress(platform)
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        if !T::VALUE_TYPE {
            return writer.write_object(self.as_ref());
        }
        writer.write_bool(self.is_some());
        match self {
            Some(value) => value.write_content(writer),
            None => Ok(()),
        }
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        if !T::VALUE_TYPE {
            return reader.read_object();
        }
        if reader.read_bool()? {
            T::read_content(reader).map(Some)
        } else {
            Ok(None)
        }
    }

    fn read_content_into(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        if !T::VALUE_TYPE {
            return reader.read_object_into(self);
        }
        if !reader.read_bool()? {
            *self = None;
            return Ok(());
        }
        match self {
            Some(value) => value.read_content_into(reader),
            None => {
                *self = Some(T::read_content(reader)?);
                Ok(())
            }
        }
    }
}
