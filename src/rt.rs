// src/rt.rs

//! Runtime utilities for generated code (Macros).
//! Do not use directly.

use crate::error::ContentError;
use std::fmt::Display;

/// The error a derived enum codec returns for an unknown discriminant.
pub fn invalid_discriminant(type_name: &str, raw: impl Display) -> ContentError {
    ContentError::Framing(format!("{raw} is not a valid discriminant of {type_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_the_enum_and_value() {
        let err = invalid_discriminant("Blend", 9);
        assert!(matches!(&err, ContentError::Framing(msg) if msg.contains("Blend") && msg.contains('9')));
    }
}
