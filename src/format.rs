//! Defines the physical binary layout of a compiled-content container.
//!
//! # Layout
//! ```text
//! [Magic "XNB"(3)] [Platform(1)] [Version(1)] [Flags(1)] [TotalSize u32 LE(4)]
//! [DecompressedSize u32 LE(4), only when compressed] [Body]
//! ```
//!
//! `TotalSize` counts every byte from the magic tag through the end of the
//! body, so a truncated or padded container is detected before decoding.
//!
//! ## Body
//! `[TypeTable] [SharedCount 7-bit] [Main graph] [Shared payloads]`, where the
//! type table is a 7-bit count followed by, per entry, a length-prefixed
//! descriptor string and a 4-byte type version.

use crate::error::{ContentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magic bytes identifying the container format.
pub const MAGIC_BYTES: [u8; 3] = *b"XNB";

/// The container format version written and accepted by this crate.
pub const FORMAT_VERSION: u8 = 5;

/// Size of the fixed header: Magic(3) + Platform(1) + Version(1) + Flags(1) + TotalSize(4).
pub const HEADER_SIZE: usize = 10;

/// Size of the decompressed-length field that follows a compressed header.
pub const DECOMPRESSED_SIZE_FIELD: usize = 4;

/// File extension of compiled containers, used by external references.
pub const CONTAINER_EXTENSION: &str = "xnb";

/// The platform a container was compiled for, stored as a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetPlatform {
    /// Desktop Windows (DirectX).
    #[default]
    Windows,
    /// Desktop OpenGL (Windows, Linux, macOS).
    DesktopGL,
    /// Apple macOS.
    MacOSX,
    /// Apple iOS.
    IOS,
    /// Google Android.
    Android,
    /// Windows Store apps.
    WindowsStoreApp,
    /// Xbox 360.
    Xbox360,
    /// Xbox One.
    XboxOne,
    /// Windows Phone.
    WindowsPhone,
    /// PlayStation 4.
    PlayStation4,
    /// PlayStation 5.
    PlayStation5,
    /// Nintendo Switch.
    Switch,
    /// Raspberry Pi.
    RaspberryPi,
    /// Browser builds.
    WebAssembly,
}

impl TargetPlatform {
    const TABLE: [(TargetPlatform, u8); 14] = [
        (Self::Windows, b'w'),
        (Self::DesktopGL, b'd'),
        (Self::MacOSX, b'M'),
        (Self::IOS, b'i'),
        (Self::Android, b'a'),
        (Self::WindowsStoreApp, b'W'),
        (Self::Xbox360, b'x'),
        (Self::XboxOne, b'O'),
        (Self::WindowsPhone, b'm'),
        (Self::PlayStation4, b'P'),
        (Self::PlayStation5, b'5'),
        (Self::Switch, b'S'),
        (Self::RaspberryPi, b'r'),
        (Self::WebAssembly, b'b'),
    ];

    /// Returns the single-byte platform code.
    pub fn code(self) -> u8 {
        Self::TABLE
            .iter()
            .find(|(p, _)| *p == self)
            .map(|(_, c)| *c)
            .unwrap_or(b'w')
    }

    /// Looks up a platform from its byte code.
    pub fn from_code(code: u8) -> Result<Self> {
        Self::TABLE
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(p, _)| *p)
            .ok_or_else(|| {
                ContentError::Framing(format!("unknown target platform code 0x{code:02x}"))
            })
    }
}

/// The feature level a container targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsProfile {
    /// Baseline feature set.
    #[default]
    Reach,
    /// Extended ("high-end") feature set.
    HiDef,
}

/// The flags byte of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    const HIDEF_MASK: u8 = 0b0000_0001; // Bit 0
    const LZ4_MASK: u8 = 0b0100_0000; // Bit 6
    const KNOWN: u8 = Self::HIDEF_MASK | Self::LZ4_MASK;

    /// Creates flags from their components.
    pub fn new(profile: GraphicsProfile, compressed: bool) -> Self {
        let mut byte = 0;
        if profile == GraphicsProfile::HiDef {
            byte |= Self::HIDEF_MASK;
        }
        if compressed {
            byte |= Self::LZ4_MASK;
        }
        Self(byte)
    }

    /// Decodes the byte, rejecting bits this version does not understand.
    pub fn from_byte(byte: u8) -> Result<Self> {
        if byte & !Self::KNOWN != 0 {
            return Err(ContentError::Framing(format!(
                "unsupported header flags 0b{byte:08b}"
            )));
        }
        Ok(Self(byte))
    }

    /// Returns the graphics profile encoded in bit 0.
    pub fn profile(self) -> GraphicsProfile {
        if self.0 & Self::HIDEF_MASK != 0 {
            GraphicsProfile::HiDef
        } else {
            GraphicsProfile::Reach
        }
    }

    /// Returns true if the body is LZ4 compressed.
    pub fn is_compressed(self) -> bool {
        self.0 & Self::LZ4_MASK != 0
    }

    /// Returns the raw byte representation.
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

/// The fixed header at the start of every container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Platform the content was built for.
    pub platform: TargetPlatform,
    /// Format version byte.
    pub version: u8,
    /// Profile and compression flags.
    pub flags: Flags,
    /// Byte length of the whole container, header included.
    pub total_size: u32,
}

impl ContainerHeader {
    /// Serializes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..3].copy_from_slice(&MAGIC_BYTES);
        buf[3] = self.platform.code();
        buf[4] = self.version;
        buf[5] = self.flags.as_u8();
        buf[6..10].copy_from_slice(&self.total_size.to_le_bytes());
        buf
    }

    /// Parses and validates the header at the start of `bytes`.
    ///
    /// `total_size` is checked against the length of `bytes`, so the slice
    /// must be the complete container.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let head = bytes
            .get(..HEADER_SIZE)
            .ok_or_else(|| ContentError::Framing("container smaller than header".into()))?;

        if head[0..3] != MAGIC_BYTES {
            return Err(ContentError::Framing("invalid magic bytes".into()));
        }
        let platform = TargetPlatform::from_code(head[3])?;
        let version = head[4];
        if version != FORMAT_VERSION {
            return Err(ContentError::Framing(format!(
                "unsupported format version: {version}"
            )));
        }
        let flags = Flags::from_byte(head[5])?;
        let total_size = u32::from_le_bytes([head[6], head[7], head[8], head[9]]);

        if total_size as usize != bytes.len() {
            return Err(ContentError::Framing(format!(
                "header declares {total_size} bytes but container holds {}",
                bytes.len()
            )));
        }

        Ok(Self {
            platform,
            version,
            flags,
            total_size,
        })
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ('{}')", self.code() as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_codes_are_unique_and_reversible() {
        for (platform, code) in TargetPlatform::TABLE {
            assert_eq!(platform.code(), code);
            assert_eq!(TargetPlatform::from_code(code).ok(), Some(platform));
        }
        assert!(TargetPlatform::from_code(b'?').is_err());
    }

    #[test]
    fn flags_encode_profile_and_compression() {
        let flags = Flags::new(GraphicsProfile::HiDef, true);
        assert_eq!(flags.as_u8(), 0x41);
        assert_eq!(flags.profile(), GraphicsProfile::HiDef);
        assert!(flags.is_compressed());
        assert!(Flags::from_byte(0x80).is_err());
    }

    #[test]
    fn header_total_size_must_match() {
        let header = ContainerHeader {
            platform: TargetPlatform::DesktopGL,
            version: FORMAT_VERSION,
            flags: Flags::default(),
            total_size: 12,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(ContainerHeader::parse(&bytes).ok(), Some(header));

        bytes.pop();
        assert!(matches!(
            ContainerHeader::parse(&bytes),
            Err(ContentError::Framing(_))
        ));
    }
}
