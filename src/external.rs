//! References to content stored in other containers.

use crate::content::{Content, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::format::CONTAINER_EXTENSION;
use crate::options::XnbOptions;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;
use std::marker::PhantomData;
use std::path::{Component, Path, PathBuf};

/// A typed reference to another container, stored as a relative path
/// without extension. The target is never loaded by this crate, so `T` does
/// not enter the referencing container's type table.
pub struct ExternalReference<T> {
    path: Option<PathBuf>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ExternalReference<T> {
    /// Points at `path`. On write it must be a container file under the
    /// content root; on read it holds the stored relative path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            _marker: PhantomData,
        }
    }

    /// A null reference.
    pub fn none() -> Self {
        Self {
            path: None,
            _marker: PhantomData,
        }
    }

    /// The stored path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolves the stored path against the directory of `container`,
    /// restoring the container extension.
    pub fn resolve(&self, container: &Path) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        let base = container.parent().unwrap_or(Path::new(""));
        let mut resolved = base.join(path);
        resolved.set_extension(CONTAINER_EXTENSION);
        Some(resolved)
    }
}

impl<T> Clone for ExternalReference<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ExternalReference<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> PartialEq for ExternalReference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<T> std::fmt::Debug for ExternalReference<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExternalReference").field(&self.path).finish()
    }
}

impl<T: Content> Content for ExternalReference<T> {
    const VALUE_TYPE: bool = true;
    const TRANSPARENT: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("ExternalReference", &[T::descriptor()])
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_external_reference(self.path.as_deref())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let path = reader.read_string()?;
        Ok(if path.is_empty() {
            Self::none()
        } else {
            Self::new(path)
        })
    }
}

/// Computes the string stored for an external reference to `target`.
pub(crate) fn relative_reference(target: &Path, options: &XnbOptions) -> Result<String> {
    let is_container = target
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(CONTAINER_EXTENSION));
    if !is_container {
        return Err(ContentError::Reference(format!(
            "{} is not a .{CONTAINER_EXTENSION} container",
            target.display()
        )));
    }

    if let Some(root) = &options.root_directory
        && !target.starts_with(root)
    {
        return Err(ContentError::Reference(format!(
            "{} is outside the content root {}",
            target.display(),
            root.display()
        )));
    }

    let stem = target.with_extension("");
    let base = options
        .relocation_path
        .as_deref()
        .or(options.root_directory.as_deref());
    let relative = match base {
        Some(base) => relative_path(base, &stem),
        None => stem,
    };

    let parts: Vec<String> = relative
        .components()
        .map(|c| match c {
            Component::ParentDir => "..".to_owned(),
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect();
    Ok(parts.join("/"))
}

/// Path of `to` relative to the directory `from`.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component<'_>> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for c in &to[common..] {
        out.push(c.as_os_str());
    }
    out
}
