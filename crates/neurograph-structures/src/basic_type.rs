// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Element kinds for typed buffers and parameters.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::StructuresError;

/// Closed set of element kinds a buffer or parameter can hold.
///
/// The discriminant doubles as the serialization tag, so the numbering
/// must never change.
///
/// # Example
/// ```
/// use neurograph_structures::BasicType;
///
/// assert_eq!(BasicType::Int32.size(), 4);
/// assert_eq!("Real64".parse::<BasicType>().unwrap(), BasicType::Real64);
/// assert_eq!(BasicType::UInt16 as u8, 2);
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BasicType {
    Byte = 0,
    Int16 = 1,
    UInt16 = 2,
    Int32 = 3,
    UInt32 = 4,
    Int64 = 5,
    UInt64 = 6,
    Real32 = 7,
    Real64 = 8,
    Bool = 9,
    /// Opaque 64-bit handle
    Handle = 10,
}

impl BasicType {
    /// Every basic type, in tag order
    pub const ALL: [BasicType; 11] = [
        BasicType::Byte,
        BasicType::Int16,
        BasicType::UInt16,
        BasicType::Int32,
        BasicType::UInt32,
        BasicType::Int64,
        BasicType::UInt64,
        BasicType::Real32,
        BasicType::Real64,
        BasicType::Bool,
        BasicType::Handle,
    ];

    /// Size of one element in bytes
    pub const fn size(&self) -> usize {
        match self {
            BasicType::Byte | BasicType::Bool => 1,
            BasicType::Int16 | BasicType::UInt16 => 2,
            BasicType::Int32 | BasicType::UInt32 | BasicType::Real32 => 4,
            BasicType::Int64 | BasicType::UInt64 | BasicType::Real64 | BasicType::Handle => 8,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            BasicType::Byte => "Byte",
            BasicType::Int16 => "Int16",
            BasicType::UInt16 => "UInt16",
            BasicType::Int32 => "Int32",
            BasicType::UInt32 => "UInt32",
            BasicType::Int64 => "Int64",
            BasicType::UInt64 => "UInt64",
            BasicType::Real32 => "Real32",
            BasicType::Real64 => "Real64",
            BasicType::Bool => "Bool",
            BasicType::Handle => "Handle",
        }
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            BasicType::Byte
                | BasicType::Int16
                | BasicType::UInt16
                | BasicType::Int32
                | BasicType::UInt32
                | BasicType::Int64
                | BasicType::UInt64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, BasicType::Real32 | BasicType::Real64)
    }

    /// Integer or floating point
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl TryFrom<u8> for BasicType {
    type Error = StructuresError;
    fn try_from(value: u8) -> Result<Self, StructuresError> {
        BasicType::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| StructuresError::UnknownBasicType(format!("tag {}", value)))
    }
}

impl FromStr for BasicType {
    type Err = StructuresError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BasicType::ALL
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| StructuresError::UnknownBasicType(s.to_string()))
    }
}

impl Display for BasicType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_table_order() {
        for (idx, t) in BasicType::ALL.iter().enumerate() {
            assert_eq!(*t as u8 as usize, idx);
            assert_eq!(BasicType::try_from(idx as u8).unwrap(), *t);
        }
        assert!(BasicType::try_from(11).is_err());
    }

    #[test]
    fn test_name_round_trip_is_case_insensitive() {
        for t in BasicType::ALL {
            assert_eq!(t.name().parse::<BasicType>().unwrap(), t);
            assert_eq!(t.name().to_lowercase().parse::<BasicType>().unwrap(), t);
        }
        assert!(matches!(
            "Real16".parse::<BasicType>(),
            Err(StructuresError::UnknownBasicType(_))
        ));
    }

    #[test]
    fn test_classification() {
        assert!(BasicType::UInt64.is_integer());
        assert!(!BasicType::Bool.is_numeric());
        assert!(!BasicType::Handle.is_numeric());
        assert!(BasicType::Real32.is_float());
    }
}
