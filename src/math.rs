//! Fixed-layout math records.
//!
//! All of these are value-like leaf codecs: written inline as their
//! little-endian components with no length or type framing.

use crate::content::{Content, TypeDescriptor};
use crate::error::Result;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;

macro_rules! float_record {
    ($(#[$doc:meta])* $name:ident { $($field:ident),+ }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        pub struct $name {
            $(
                #[allow(missing_docs)]
                pub $field: f32,
            )+
        }

        impl $name {
            /// Creates a value from its components.
            pub const fn new($($field: f32),+) -> Self {
                Self { $($field),+ }
            }
        }

        impl Content for $name {
            const VALUE_TYPE: bool = true;
            const PRIMITIVE: bool = true;

            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::new(stringify!($name))
            }

            fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
                $(writer.write_f32(self.$field);)+
                Ok(())
            }

            fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
                Ok(Self {
                    $($field: reader.read_f32()?,)+
                })
            }
        }
    };
}

float_record!(
    /// A 2-component vector.
    Vector2 { x, y }
);
float_record!(
    /// A 3-component vector.
    Vector3 { x, y, z }
);
float_record!(
    /// A 4-component vector.
    Vector4 { x, y, z, w }
);
float_record!(
    /// A rotation quaternion.
    Quaternion { x, y, z, w }
);

/// A 4x4 row-major matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Elements in row-major order (`m[row * 4 + col]`).
    pub m: [f32; 16],
}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Matrix = Matrix {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Content for Matrix {
    const VALUE_TYPE: bool = true;
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("Matrix")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        self.m.iter().for_each(|v| writer.write_f32(*v));
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        let mut m = [0.0; 16];
        for v in &mut m {
            *v = reader.read_f32()?;
        }
        Ok(Self { m })
    }
}

/// An 8-bit-per-channel RGBA color, written as four bytes in R, G, B, A order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Creates a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Content for Color {
    const VALUE_TYPE: bool = true;
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("Color")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_bytes(&[self.r, self.g, self.b, self.a]);
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        Ok(Self {
            r: reader.read_u8()?,
            g: reader.read_u8()?,
            b: reader.read_u8()?,
            a: reader.read_u8()?,
        })
    }
}

/// An integer rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Content for Rectangle {
    const VALUE_TYPE: bool = true;
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("Rectangle")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_i32(self.x);
        writer.write_i32(self.y);
        writer.write_i32(self.width);
        writer.write_i32(self.height);
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        Ok(Self {
            x: reader.read_i32()?,
            y: reader.read_i32()?,
            width: reader.read_i32()?,
            height: reader.read_i32()?,
        })
    }
}

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[allow(missing_docs)]
pub struct BoundingBox {
    pub min: Vector3,
    pub max: Vector3,
}

impl Content for BoundingBox {
    const VALUE_TYPE: bool = true;
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("BoundingBox")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        self.min.write_content(writer)?;
        self.max.write_content(writer)
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        Ok(Self {
            min: Vector3::read_content(reader)?,
            max: Vector3::read_content(reader)?,
        })
    }
}

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[allow(missing_docs)]
pub struct BoundingSphere {
    pub center: Vector3,
    pub radius: f32,
}

impl Content for BoundingSphere {
    const VALUE_TYPE: bool = true;
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("BoundingSphere")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        self.center.write_content(writer)?;
        writer.write_f32(self.radius);
        Ok(())
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        Ok(Self {
            center: Vector3::read_content(reader)?,
            radius: reader.read_f32()?,
        })
    }
}
