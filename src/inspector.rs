// src/inspector.rs

//! Tools for inspecting the physical structure of containers.
//! Useful for debugging type tables and compression decisions.
//!
//! The inspector never binds codecs, so it works on containers whose types
//! the local catalog does not know.

use crate::compression::body_compressor;
use crate::error::{ContentError, Result};
use crate::format::{ContainerHeader, DECOMPRESSED_SIZE_FIELD, GraphicsProfile, HEADER_SIZE, TargetPlatform};
use crate::io::ByteCursor;
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;

/// A structural report of a container.
#[derive(Debug, Serialize)]
pub struct ContainerReport {
    /// Target platform from the header.
    pub platform: TargetPlatform,
    /// Format version.
    pub version: u8,
    /// Graphics profile flag.
    pub profile: GraphicsProfile,
    /// Whether the body is LZ4 compressed.
    pub compressed: bool,
    /// Size of the whole container.
    pub total_size: u32,
    /// Size of the body after decompression.
    pub body_size: usize,
    /// The type table in slot order.
    pub types: Vec<TypeEntry>,
    /// Number of shared resources.
    pub shared_count: usize,
    /// Bytes of main graph and shared payloads.
    pub payload_size: usize,
}

/// One type-table entry.
#[derive(Debug, Clone, Serialize)]
pub struct TypeEntry {
    /// Descriptor string as written.
    pub name: String,
    /// Type version.
    pub version: i32,
}

/// The container inspector.
#[derive(Debug)]
pub struct XnbInspector;

impl XnbInspector {
    /// Reads a container file and returns its structural report.
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<ContainerReport> {
        let bytes = std::fs::read(path)?;
        Self::inspect_bytes(&bytes)
    }

    /// Analyzes container bytes.
    pub fn inspect_bytes(bytes: &[u8]) -> Result<ContainerReport> {
        let header = ContainerHeader::parse(bytes)?;
        let rest = &bytes[HEADER_SIZE..];
        let body: Cow<'_, [u8]> = if header.flags.is_compressed() {
            let field = rest.get(..DECOMPRESSED_SIZE_FIELD).ok_or_else(|| {
                ContentError::Framing("compressed container lacks its size field".into())
            })?;
            let len = u32::from_le_bytes([field[0], field[1], field[2], field[3]]) as usize;
            body_compressor()?.decompress(&rest[DECOMPRESSED_SIZE_FIELD..], len)?
        } else {
            Cow::Borrowed(rest)
        };
        let body_size = body.len();

        let mut cursor = ByteCursor::new(body);
        let count = cursor.read_7bit_encoded()? as usize;
        let mut types = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            types.push(TypeEntry {
                name: cursor.read_string()?,
                version: cursor.read_i32()?,
            });
        }
        let shared_count = cursor.read_7bit_encoded()? as usize;

        Ok(ContainerReport {
            platform: header.platform,
            version: header.version,
            profile: header.flags.profile(),
            compressed: header.flags.is_compressed(),
            total_size: header.total_size,
            body_size,
            types,
            shared_count,
            payload_size: cursor.remaining(),
        })
    }
}

impl std::fmt::Display for ContainerReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== XNB INSPECTOR REPORT ===")?;
        writeln!(f, "Platform:       {}", self.platform)?;
        writeln!(f, "Version:        {}", self.version)?;
        writeln!(f, "Profile:        {:?}", self.profile)?;
        writeln!(
            f,
            "Size:           {}b ({}b body{})",
            self.total_size,
            self.body_size,
            if self.compressed { ", lz4" } else { "" }
        )?;
        writeln!(f, "\n[TYPE TABLE]")?;
        for (i, entry) in self.types.iter().enumerate() {
            let connector = if i + 1 == self.types.len() { "└── " } else { "├── " };
            writeln!(f, "{connector}#{} {} v{}", i + 1, entry.name, entry.version)?;
        }
        writeln!(f, "\n[PAYLOAD]")?;
        writeln!(f, "├── Shared resources: {}", self.shared_count)?;
        write!(f, "└── Graph bytes:      {}", self.payload_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TypeCatalog, XnbOptions};

    #[test]
    fn report_lists_the_type_table() -> Result<()> {
        let catalog = TypeCatalog::new();
        let options = XnbOptions::default()
            .compress(false)
            .platform(TargetPlatform::DesktopGL)
            .profile(GraphicsProfile::HiDef);
        let bytes = options.serialize(&catalog, &vec![String::from("x")])?;
        let report = XnbInspector::inspect_bytes(&bytes)?;

        assert_eq!(report.platform, TargetPlatform::DesktopGL);
        assert_eq!(report.profile, GraphicsProfile::HiDef);
        let names: Vec<&str> = report.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["List<String>", "String"]);
        assert_eq!(report.shared_count, 0);
        // root index, count, element index, "x"
        assert_eq!(report.payload_size, 5);
        assert!(report.to_string().contains("#2 String v0"));
        Ok(())
    }
}
