// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::basic_type::BasicType;

/// Common error type for neurograph data operations.
///
/// Raised by typed buffer access, buffer copies and parameter conversions.
///
/// # Examples
/// ```
/// use neurograph_structures::{Array, BasicType, StructuresError};
///
/// let array = Array::zeroed(BasicType::Int32, 4);
/// let err = array.as_slice::<f32>().unwrap_err();
/// assert!(matches!(err, StructuresError::TypeMismatch { .. }));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum StructuresError {
    /// A typed access or copy was attempted with the wrong element type
    TypeMismatch {
        expected: BasicType,
        actual: BasicType,
    },
    /// A copy or gather would read or write past the end of a buffer
    OutOfBounds {
        index: usize,
        len: usize,
    },
    /// A value could not be converted to the requested type
    ConversionError(String),
    /// Unknown basic type name
    UnknownBasicType(String),
    /// A parameter map lookup found no entry
    MissingParameter(String),
    /// A parameter exists but cannot be read as the requested type
    ParameterTypeMismatch {
        name: String,
        expected: String,
    },
    /// Invalid parameters provided to a function
    BadParameters(String),
}

impl Display for StructuresError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StructuresError::TypeMismatch { expected, actual } => {
                write!(f, "Type Mismatch: expected {}, got {}", expected, actual)
            }
            StructuresError::OutOfBounds { index, len } => {
                write!(f, "Out Of Bounds: index {} in buffer of {} elements", index, len)
            }
            StructuresError::ConversionError(msg) => write!(f, "Conversion Error: {}", msg),
            StructuresError::UnknownBasicType(name) => write!(f, "Unknown Basic Type: {}", name),
            StructuresError::MissingParameter(name) => write!(f, "Missing Parameter: {}", name),
            StructuresError::ParameterTypeMismatch { name, expected } => {
                write!(f, "Parameter Type Mismatch: {} is not {}", name, expected)
            }
            StructuresError::BadParameters(msg) => write!(f, "Bad Parameters: {}", msg),
        }
    }
}
impl Error for StructuresError {}
