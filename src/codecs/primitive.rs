use crate::content::{Content, TypeDescriptor};
use crate::error::Result;
use crate::reader::ContentReader;
use crate::writer::ContentWriter;

macro_rules! scalar_content {
    ($($ty:ty => $name:literal, $write:ident, $read:ident;)*) => {
        $(
            impl Content for $ty {
                const VALUE_TYPE: bool = true;
                const PRIMITIVE: bool = true;

                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::new($name)
                }

                fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
                    writer.$write(*self);
                    Ok(())
                }

                fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

scalar_content! {
    bool => "Boolean", write_bool, read_bool;
    u8 => "Byte", write_u8, read_u8;
    i8 => "SByte", write_i8, read_i8;
    i16 => "Int16", write_i16, read_i16;
    u16 => "UInt16", write_u16, read_u16;
    i32 => "Int32", write_i32, read_i32;
    u32 => "UInt32", write_u32, read_u32;
    i64 => "Int64", write_i64, read_i64;
    u64 => "UInt64", write_u64, read_u64;
    f32 => "Single", write_f32, read_f32;
    f64 => "Double", write_f64, read_f64;
    char => "Char", write_char, read_char;
}

impl Content for String {
    const PRIMITIVE: bool = true;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new("String")
    }

    fn write_content(&self, writer: &mut ContentWriter<'_>) -> Result<()> {
        writer.write_string(self)
    }

    fn read_content(reader: &mut ContentReader<'_>) -> Result<Self> {
        reader.read_string()
    }
}
