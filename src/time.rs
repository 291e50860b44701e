//! Date and duration values.
//!
//! Both are measured in 100-nanosecond ticks. A [`DateTime`] packs its tick
//! count and its kind into one 64-bit word:
//!
//! ```text
//! [kind: 2 bits][ticks: 62 bits]
//! ```

use crate::content::{Content, TypeDescriptor};
use crate::error::{ContentError, Result};
use crate::reader::ContentReader;
use crate::writer::ContentWriter;
use std::time::Duration;

/// Ticks per second (one tick is 100 ns).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// A signed duration in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpan {
    /// Tick count.
    pub ticks: i64,
}

impl TimeSpan {
    /// Creates a span from ticks.
    pub const fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    /// Converts a non-negative span to a `Duration`.
    pub fn to_duration(self) -> Option<Duration> {
        let ticks = u64::try_from(self.ticks).ok()?;
        let per_sec = TICKS_PER_SECOND as u64;
        Some(Duration::new(
            ticks / per_sec,
            ((ticks % per_sec) * 100) as u32,
        ))
    }
}

impl From<Duration> for TimeSpan {
    /// Saturates at `i64::MAX` ticks.
    fn from(d: Duration) -> Self {
        let ticks = d.as_nanos() / 100;
        Self {
            ticks: i64::try_from(ticks).unwrap_or(i64::MAX),
        }
    }
}

impl Content for TimeSpan {
    const VALUE_TYPE: bool = true;
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("TimeSpan")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_i64(self.ticks);
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        Ok(Self::from_ticks(reader.read_i64()?))
    }
}

/// How a [`DateTime`] should be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    /// No time zone information.
    #[default]
    Unspecified = 0,
    /// Coordinated universal time.
    Utc = 1,
    /// Local time.
    Local = 2,
}

impl DateTimeKind {
    fn from_bits(bits: u64) -> Result<Self> {
        match bits {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::Utc),
            2 => Ok(Self::Local),
            other => Err(ContentError::Framing(format!("invalid date kind {other}"))),
        }
    }
}

/// A point in time: ticks since 0001-01-01 plus a kind tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateTime {
    ticks: u64,
    kind: DateTimeKind,
}

impl DateTime {
    const KIND_SHIFT: u32 = 62;
    const TICKS_MASK: u64 = (1 << Self::KIND_SHIFT) - 1;

    /// Creates a date; `ticks` must fit in 62 bits.
    pub fn new(ticks: u64, kind: DateTimeKind) -> Result<Self> {
        if ticks > Self::TICKS_MASK {
            return Err(ContentError::Framing(format!(
                "{ticks} ticks do not fit in 62 bits"
            )));
        }
        Ok(Self { ticks, kind })
    }

    /// Tick count.
    pub fn ticks(self) -> u64 {
        self.ticks
    }

    /// Kind tag.
    pub fn kind(self) -> DateTimeKind {
        self.kind
    }

    /// The packed on-disk representation.
    pub fn to_bits(self) -> u64 {
        self.ticks | ((self.kind as u64) << Self::KIND_SHIFT)
    }

    /// Unpacks the on-disk representation.
    pub fn from_bits(bits: u64) -> Result<Self> {
        Ok(Self {
            ticks: bits & Self::TICKS_MASK,
            kind: DateTimeKind::from_bits(bits >> Self::KIND_SHIFT)?,
        })
    }
}

impl Content for DateTime {
    const VALUE_TYPE: bool = true;
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("DateTime")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_u64(self.to_bits());
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        Self::from_bits(reader.read_u64()?)
    }
}
