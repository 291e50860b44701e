//! Hierarchical model data: bones with parent/child links.
//!
//! A bone graph is written as plain bone records first, then a hierarchy
//! section that links them by 1-based index (0 = no parent). Indices are one
//! byte wide when the graph has fewer than 255 bones, otherwise four.

use crate::catalog::Registrar;
use crate::content::{Content, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::math::Matrix;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;

/// One node of a skeleton.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bone {
    /// Bone name (may be empty).
    pub name: Option<String>,
    /// Transform relative to the parent.
    pub transform: Matrix,
    /// Index of the parent bone.
    pub parent: Option<usize>,
    /// Indices of the child bones, in order.
    pub children: Vec<usize>,
}

/// A set of bones and their hierarchy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoneGraph {
    /// All bones; links are indices into this list.
    pub bones: Vec<Bone>,
    /// Index of the root bone.
    pub root: Option<usize>,
}

impl BoneGraph {
    fn wide(&self) -> bool {
        self.bones.len() >= 255
    }

    fn write_link(&self, writer: &mut ContentWriter<'_>, link: Option<usize>) -> Result<()> {
        let value = match link {
            Some(index) if index < self.bones.len() => index + 1,
            Some(index) => {
                return Err(ContentError::Reference(format!(
                    "bone link {index} outside a graph of {} bones",
                    self.bones.len()
                )));
            }
            None => 0,
        };
        if self.wide() {
            writer.write_u32(value as u32);
        } else {
            writer.write_u8(value as u8);
        }
        Ok(())
    }

    fn read_link(reader: &mut ContentReader<'_>, count: usize) -> Result<Option<usize>> {
        let value = if count >= 255 {
            reader.read_u32()? as usize
        } else {
            usize::from(reader.read_u8()?)
        };
        match value {
            0 => Ok(None),
            v if v <= count => Ok(Some(v - 1)),
            v => Err(ContentError::Framing(format!(
                "bone reference {v} outside a graph of {count} bones"
            ))),
        }
    }

    fn read_hierarchy(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        let count = self.bones.len();
        for i in 0..count {
            let parent = Self::read_link(reader, count)?;
            let children_len = reader.read_u32()? as usize;
            let mut children = std::mem::take(&mut self.bones[i].children);
            children.clear();
            children.reserve(children_len.min(reader.remaining()));
            for _ in 0..children_len {
                let child = Self::read_link(reader, count)?.ok_or_else(|| {
                    ContentError::Framing(format!("bone {i} lists a null child"))
                })?;
                children.push(child);
            }
            let bone = &mut self.bones[i];
            bone.parent = parent;
            bone.children = children;
        }
        self.root = Self::read_link(reader, count)?;
        Ok(())
    }
}

impl Content for BoneGraph {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("BoneGraph")
    }

    fn register_dependencies(registrar: &mut Registrar<'_>) {
        registrar.include::<String>();
        registrar.include::<Matrix>();
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_u32(u32::try_from(self.bones.len()).map_err(|_| {
            ContentError::Framing(format!("{} bones do not fit a u32", self.bones.len()))
        })?);
        for bone in &self.bones {
            writer.write_object(bone.name.as_ref())?;
            bone.transform.write_content(writer)?;
        }
        for bone in &self.bones {
            self.write_link(writer, bone.parent)?;
            writer.write_u32(bone.children.len() as u32);
            for &child in &bone.children {
                self.write_link(writer, Some(child))?;
            }
        }
        self.write_link(writer, self.root)
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let mut graph = BoneGraph::default();
        graph.read_content_into(reader)?;
        Ok(graph)
    }

    /// Bones present in both the live graph and the container are updated
    /// in place; extra live bones are dropped and missing ones appended.
    fn read_content_into(&mut self, reader: &mut ContentReader<'_>) -> Result<()> {
        let count = reader.read_u32()? as usize;
        self.bones.truncate(count);
        for i in 0..count {
            let name = reader.read_object::<String>()?;
            let transform = Matrix::read_content(reader)?;
            match self.bones.get_mut(i) {
                Some(bone) => {
                    bone.name = name;
                    bone.transform = transform;
                }
                None => self.bones.push(Bone {
                    name,
                    transform,
                    ..Bone::default()
                }),
            }
        }
        self.read_hierarchy(reader)
    }
}
