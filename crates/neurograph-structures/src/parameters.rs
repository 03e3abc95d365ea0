// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parameter values handed to region implementations at creation time.
//!
//! A [`ParameterMap`] is the already-parsed form of whatever configuration
//! front end the embedding application uses. Values are typed [`Scalar`]s,
//! strings, or sequences of scalars. Numeric scalars convert between types
//! only when no information is lost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::array::{ArrayElement, Handle};
use crate::basic_type::BasicType;
use crate::StructuresError;

/// A single typed value, one variant per [`BasicType`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Real32(f32),
    Real64(f64),
    Bool(bool),
    Handle(Handle),
}

impl Scalar {
    pub fn basic_type(&self) -> BasicType {
        match self {
            Scalar::Byte(_) => BasicType::Byte,
            Scalar::Int16(_) => BasicType::Int16,
            Scalar::UInt16(_) => BasicType::UInt16,
            Scalar::Int32(_) => BasicType::Int32,
            Scalar::UInt32(_) => BasicType::UInt32,
            Scalar::Int64(_) => BasicType::Int64,
            Scalar::UInt64(_) => BasicType::UInt64,
            Scalar::Real32(_) => BasicType::Real32,
            Scalar::Real64(_) => BasicType::Real64,
            Scalar::Bool(_) => BasicType::Bool,
            Scalar::Handle(_) => BasicType::Handle,
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match *self {
            Scalar::Byte(v) => Some(v as i128),
            Scalar::Int16(v) => Some(v as i128),
            Scalar::UInt16(v) => Some(v as i128),
            Scalar::Int32(v) => Some(v as i128),
            Scalar::UInt32(v) => Some(v as i128),
            Scalar::Int64(v) => Some(v as i128),
            Scalar::UInt64(v) => Some(v as i128),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::Real32(v) => Some(v as f64),
            Scalar::Real64(v) => Some(v),
            _ => None,
        }
    }

    fn integer_as(target: BasicType, v: i128) -> Option<Scalar> {
        Some(match target {
            BasicType::Byte => Scalar::Byte(u8::try_from(v).ok()?),
            BasicType::Int16 => Scalar::Int16(i16::try_from(v).ok()?),
            BasicType::UInt16 => Scalar::UInt16(u16::try_from(v).ok()?),
            BasicType::Int32 => Scalar::Int32(i32::try_from(v).ok()?),
            BasicType::UInt32 => Scalar::UInt32(u32::try_from(v).ok()?),
            BasicType::Int64 => Scalar::Int64(i64::try_from(v).ok()?),
            BasicType::UInt64 => Scalar::UInt64(u64::try_from(v).ok()?),
            BasicType::Real32 => {
                let f = v as f32;
                if f as i128 != v {
                    return None;
                }
                Scalar::Real32(f)
            }
            BasicType::Real64 => {
                let f = v as f64;
                if f as i128 != v {
                    return None;
                }
                Scalar::Real64(f)
            }
            BasicType::Bool | BasicType::Handle => return None,
        })
    }

    fn float_as(target: BasicType, v: f64) -> Option<Scalar> {
        match target {
            BasicType::Real64 => Some(Scalar::Real64(v)),
            BasicType::Real32 => {
                let f = v as f32;
                if (f as f64) == v || v.is_nan() {
                    Some(Scalar::Real32(f))
                } else {
                    None
                }
            }
            t if t.is_integer() => {
                if !v.is_finite() || v.fract() != 0.0 || v.abs() > 1e30 {
                    return None;
                }
                Scalar::integer_as(t, v as i128)
            }
            _ => None,
        }
    }

    /// Convert to `target` if the value survives unchanged.
    ///
    /// Integers are range checked, floats become integers only when integral,
    /// and bool/handle values never convert to or from numbers.
    pub fn convert_to(&self, target: BasicType) -> Option<Scalar> {
        if self.basic_type() == target {
            return Some(*self);
        }
        if let Some(v) = self.as_i128() {
            return Scalar::integer_as(target, v);
        }
        if let Some(v) = self.as_f64() {
            return Scalar::float_as(target, v);
        }
        None
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Byte(v) => write!(f, "{}", v),
            Scalar::Int16(v) => write!(f, "{}", v),
            Scalar::UInt16(v) => write!(f, "{}", v),
            Scalar::Int32(v) => write!(f, "{}", v),
            Scalar::UInt32(v) => write!(f, "{}", v),
            Scalar::Int64(v) => write!(f, "{}", v),
            Scalar::UInt64(v) => write!(f, "{}", v),
            Scalar::Real32(v) => write!(f, "{}", v),
            Scalar::Real64(v) => write!(f, "{}", v),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Handle(v) => write!(f, "handle:{}", v.0),
        }
    }
}

/// Element types that can be read out of and stored into a [`Scalar`]
pub trait ScalarValue: ArrayElement {
    fn into_scalar(self) -> Scalar;

    /// Exact variant match, no conversion
    fn from_exact(scalar: &Scalar) -> Option<Self>;

    /// Lossless conversion from any compatible scalar
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        scalar
            .convert_to(Self::BASIC_TYPE)
            .and_then(|s| Self::from_exact(&s))
    }
}

macro_rules! impl_scalar_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl ScalarValue for $t {
                fn into_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }

                fn from_exact(scalar: &Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }

            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Scalar::$variant(value)
                }
            }

            impl From<$t> for ParameterValue {
                fn from(value: $t) -> Self {
                    ParameterValue::Scalar(Scalar::$variant(value))
                }
            }

            impl From<Vec<$t>> for ParameterValue {
                fn from(values: Vec<$t>) -> Self {
                    ParameterValue::Sequence(values.into_iter().map(Scalar::$variant).collect())
                }
            }
        )*
    };
}

impl_scalar_value!(
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Real32,
    f64 => Real64,
    bool => Bool,
    Handle => Handle,
);

/// Value of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Scalar(Scalar),
    String(String),
    Sequence(Vec<Scalar>),
}

impl ParameterValue {
    /// Element type; strings report [`BasicType::Byte`], empty sequences `None`
    pub fn basic_type(&self) -> Option<BasicType> {
        match self {
            ParameterValue::Scalar(s) => Some(s.basic_type()),
            ParameterValue::String(_) => Some(BasicType::Byte),
            ParameterValue::Sequence(items) => items.first().map(Scalar::basic_type),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            ParameterValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert every contained scalar to `target`, failing if any would lose information
    pub fn convert_to(&self, target: BasicType) -> Option<ParameterValue> {
        match self {
            ParameterValue::Scalar(s) => s.convert_to(target).map(ParameterValue::Scalar),
            ParameterValue::String(_) => (target == BasicType::Byte).then(|| self.clone()),
            ParameterValue::Sequence(items) => items
                .iter()
                .map(|s| s.convert_to(target))
                .collect::<Option<Vec<_>>>()
                .map(ParameterValue::Sequence),
        }
    }
}

impl From<Scalar> for ParameterValue {
    fn from(value: Scalar) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterValue::Scalar(s) => write!(f, "{}", s),
            ParameterValue::String(s) => write!(f, "\"{}\"", s),
            ParameterValue::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Name-sorted mapping of parameter name to value.
///
/// # Example
/// ```
/// use neurograph_structures::ParameterMap;
///
/// let params = ParameterMap::new()
///     .with("width", 4u32)
///     .with("label", "input")
///     .with("weights", vec![0.5f32, 0.25]);
///
/// // Lossless conversion on read
/// assert_eq!(params.get_scalar::<u64>("width").unwrap(), 4);
/// assert_eq!(params.get_string("label").unwrap(), "input");
/// assert_eq!(params.get_array::<f64>("weights").unwrap(), vec![0.5, 0.25]);
/// assert!(params.get_scalar::<i32>("missing").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterMap {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Option<ParameterValue> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParameterValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&ParameterValue, StructuresError> {
        self.values
            .get(name)
            .ok_or_else(|| StructuresError::MissingParameter(name.to_string()))
    }

    pub fn get_scalar<T: ScalarValue>(&self, name: &str) -> Result<T, StructuresError> {
        self.require(name)?
            .as_scalar()
            .and_then(T::from_scalar)
            .ok_or_else(|| StructuresError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: T::BASIC_TYPE.to_string(),
            })
    }

    pub fn get_string(&self, name: &str) -> Result<&str, StructuresError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| StructuresError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: "string".to_string(),
            })
    }

    /// Read a sequence; a lone scalar is read as a one element sequence
    pub fn get_array<T: ScalarValue>(&self, name: &str) -> Result<Vec<T>, StructuresError> {
        let mismatch = || StructuresError::ParameterTypeMismatch {
            name: name.to_string(),
            expected: format!("sequence of {}", T::BASIC_TYPE),
        };
        match self.require(name)? {
            ParameterValue::Sequence(items) => items
                .iter()
                .map(T::from_scalar)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(mismatch),
            ParameterValue::Scalar(s) => T::from_scalar(s).map(|v| vec![v]).ok_or_else(mismatch),
            ParameterValue::String(_) => Err(mismatch()),
        }
    }
}

impl FromIterator<(String, ParameterValue)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
