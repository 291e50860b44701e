//! Built-in codecs: scalars, strings, and the generic containers.
//!
//! Math records, date/time values and the multi-dimensional array live in
//! their own top-level modules; this module only wires them into a fresh
//! catalog.

mod collections;
mod primitive;

use crate::catalog::Registrar;
use crate::math::{
    BoundingBox, BoundingSphere, Color, Matrix, Quaternion, Rectangle, Vector2, Vector3, Vector4,
};
use crate::time::{DateTime, TimeSpan};

/// Registers every built-in leaf codec.
pub(crate) fn register_builtins(registrar: &mut Registrar<'_>) {
    registrar.include::<bool>();
    registrar.include::<u8>();
    registrar.include::<i8>();
    registrar.include::<i16>();
    registrar.include::<u16>();
    registrar.include::<i32>();
    registrar.include::<u32>();
    registrar.include::<i64>();
    registrar.include::<u64>();
    registrar.include::<f32>();
    registrar.include::<f64>();
    registrar.include::<char>();
    registrar.include::<String>();

    registrar.include::<TimeSpan>();
    registrar.include::<DateTime>();

    registrar.include::<Vector2>();
    registrar.include::<Vector3>();
    registrar.include::<Vector4>();
    registrar.include::<Quaternion>();
    registrar.include::<Matrix>();
    registrar.include::<Color>();
    registrar.include::<Rectangle>();
    registrar.include::<BoundingBox>();
    registrar.include::<BoundingSphere>();
}
