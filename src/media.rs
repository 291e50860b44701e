//! Already-encoded media payloads.

use crate::content::{Content, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::format::TargetPlatform;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;

/// A sound effect: an opaque wave-format header plus sample data.
///
/// The samples are typically already compressed (ADPCM, Vorbis), so a
/// container holding one is never LZ4 compressed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoundEffectContent {
    /// Raw wave-format header bytes.
    pub format: Vec<u8>,
    /// Encoded sample data.
    pub data: Vec<u8>,
    /// First sample of the loop region.
    pub loop_start: i32,
    /// Length of the loop region in samples.
    pub loop_length: i32,
    /// Playback duration in milliseconds.
    pub duration_ms: i32,
}

fn write_blob(writer: &mut ContentWriter<'_>, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| ContentError::Framing(format!("blob of {} bytes", bytes.len())))?;
    writer.write_u32(len);
    writer.write_bytes(bytes);
    Ok(())
}

fn read_blob(reader: &mut ContentReader<'_>) -> Result<Vec<u8>> {
    let len = reader.read_u32()? as usize;
    reader.read_bytes(len)
}

impl Content for SoundEffectContent {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("SoundEffectContent").with_runtime_name("SoundEffect")
    }

    fn should_compress(_platform: TargetPlatform) -> bool {
        false
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        write_blob(writer, &self.format)?;
        write_blob(writer, &self.data)?;
        writer.write_i32(self.loop_start);
        writer.write_i32(self.loop_length);
        writer.write_i32(self.duration_ms);
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        Ok(Self {
            format: read_blob(reader)?,
            data: read_blob(reader)?,
            loop_start: reader.read_i32()?,
            loop_length: reader.read_i32()?,
            duration_ms: reader.read_i32()?,
        })
    }
}
