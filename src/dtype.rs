use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Debug, thiserror::Error)]
pub enum DTypeError {
    #[error("Unknown element type name \"{0}\"")]
    UnknownTypeName(String),
}

#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    Eq,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
)]
pub enum DType {
    F64,
    F32,
    I64,
    I32,
    BOOL,
}

impl DType {
    pub fn size(&self) -> usize {
        match self {
            DType::F64 => 8,
            DType::F32 => 4,
            DType::I64 => 8,
            DType::I32 => 4,
            DType::BOOL => 1,
        }
    }

    /// Name used inside type tags, e.g. the `double` in `InputNode<double>`.
    pub fn type_name(&self) -> &'static str {
        match self {
            DType::F64 => "double",
            DType::F32 => "float",
            DType::I64 => "int64",
            DType::I32 => "int",
            DType::BOOL => "bool",
        }
    }

    pub fn from_type_name(name: &str) -> Result<Self, DTypeError> {
        Ok(match name {
            "double" => DType::F64,
            "float" => DType::F32,
            "int64" => DType::I64,
            "int" => DType::I32,
            "bool" => DType::BOOL,
            _ => Err(DTypeError::UnknownTypeName(name.to_string()))?,
        })
    }

    pub fn is_real(&self) -> bool {
        matches!(self, DType::F64 | DType::F32)
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DType::F64 => write!(f, "Float64"),
            DType::F32 => write!(f, "Float32"),
            DType::I64 => write!(f, "Int64"),
            DType::I32 => write!(f, "Int32"),
            DType::BOOL => write!(f, "Bool"),
        }
    }
}

pub trait DTypeOfPrimitive {
    const DTYPE: DType;
}

impl DTypeOfPrimitive for f64 { const DTYPE: DType = DType::F64; }
impl DTypeOfPrimitive for f32 { const DTYPE: DType = DType::F32; }
impl DTypeOfPrimitive for i64 { const DTYPE: DType = DType::I64; }
impl DTypeOfPrimitive for i32 { const DTYPE: DType = DType::I32; }
impl DTypeOfPrimitive for bool { const DTYPE: DType = DType::BOOL; }

/// A primitive that node fields and ports can be parameterized over.
pub trait Element:
    DTypeOfPrimitive
    + Copy
    + Debug
    + Default
    + PartialEq
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    fn type_name() -> &'static str {
        Self::DTYPE.type_name()
    }
}

impl Element for f64 {}
impl Element for f32 {}
impl Element for i64 {}
impl Element for i32 {}
impl Element for bool {}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn type_names_round_trip() {
        for dtype in DType::iter() {
            assert_eq!(DType::from_type_name(dtype.type_name()).unwrap(), dtype);
        }
        assert!(DType::from_type_name("half").is_err());
    }

    #[test]
    fn primitive_names() {
        assert_eq!(<f64 as Element>::type_name(), "double");
        assert_eq!(<i64 as Element>::type_name(), "int64");
        assert_eq!(<bool as Element>::type_name(), "bool");
    }
}
