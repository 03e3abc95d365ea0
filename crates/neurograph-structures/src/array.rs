// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed, homogeneous, heap allocated buffers.
//!
//! An [`Array`] is tagged with its [`BasicType`] at creation and the tag never
//! changes afterwards. Typed views are obtained through [`ArrayElement`], which
//! is implemented for the Rust type backing each basic type.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::basic_type::BasicType;
use crate::reindex::ReindexRule;
use crate::StructuresError;

/// Opaque 64-bit handle element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u64);

/// Storage behind an [`Array`], one variant per basic type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayData {
    Byte(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Real32(Vec<f32>),
    Real64(Vec<f64>),
    Bool(Vec<bool>),
    Handle(Vec<Handle>),
}

/// Runs `$body` with `$v` bound to the inner vector of whichever variant `$data` holds.
macro_rules! with_vec {
    ($data:expr, |$v:ident| $body:expr) => {
        match $data {
            ArrayData::Byte($v) => $body,
            ArrayData::Int16($v) => $body,
            ArrayData::UInt16($v) => $body,
            ArrayData::Int32($v) => $body,
            ArrayData::UInt32($v) => $body,
            ArrayData::Int64($v) => $body,
            ArrayData::UInt64($v) => $body,
            ArrayData::Real32($v) => $body,
            ArrayData::Real64($v) => $body,
            ArrayData::Bool($v) => $body,
            ArrayData::Handle($v) => $body,
        }
    };
}

/// Same as [`with_vec`] but for two arrays that must hold the same variant.
macro_rules! with_vec_pair {
    ($src:expr, $dst:expr, |$s:ident, $d:ident| $body:expr) => {
        match ($src, $dst) {
            (ArrayData::Byte($s), ArrayData::Byte($d)) => $body,
            (ArrayData::Int16($s), ArrayData::Int16($d)) => $body,
            (ArrayData::UInt16($s), ArrayData::UInt16($d)) => $body,
            (ArrayData::Int32($s), ArrayData::Int32($d)) => $body,
            (ArrayData::UInt32($s), ArrayData::UInt32($d)) => $body,
            (ArrayData::Int64($s), ArrayData::Int64($d)) => $body,
            (ArrayData::UInt64($s), ArrayData::UInt64($d)) => $body,
            (ArrayData::Real32($s), ArrayData::Real32($d)) => $body,
            (ArrayData::Real64($s), ArrayData::Real64($d)) => $body,
            (ArrayData::Bool($s), ArrayData::Bool($d)) => $body,
            (ArrayData::Handle($s), ArrayData::Handle($d)) => $body,
            (s, d) => Err(StructuresError::TypeMismatch {
                expected: d.basic_type(),
                actual: s.basic_type(),
            }),
        }
    };
}

impl ArrayData {
    /// Zero filled storage of `count` elements
    pub fn zeroed(element_type: BasicType, count: usize) -> Self {
        match element_type {
            BasicType::Byte => ArrayData::Byte(vec![0; count]),
            BasicType::Int16 => ArrayData::Int16(vec![0; count]),
            BasicType::UInt16 => ArrayData::UInt16(vec![0; count]),
            BasicType::Int32 => ArrayData::Int32(vec![0; count]),
            BasicType::UInt32 => ArrayData::UInt32(vec![0; count]),
            BasicType::Int64 => ArrayData::Int64(vec![0; count]),
            BasicType::UInt64 => ArrayData::UInt64(vec![0; count]),
            BasicType::Real32 => ArrayData::Real32(vec![0.0; count]),
            BasicType::Real64 => ArrayData::Real64(vec![0.0; count]),
            BasicType::Bool => ArrayData::Bool(vec![false; count]),
            BasicType::Handle => ArrayData::Handle(vec![Handle::default(); count]),
        }
    }

    pub fn basic_type(&self) -> BasicType {
        match self {
            ArrayData::Byte(_) => BasicType::Byte,
            ArrayData::Int16(_) => BasicType::Int16,
            ArrayData::UInt16(_) => BasicType::UInt16,
            ArrayData::Int32(_) => BasicType::Int32,
            ArrayData::UInt32(_) => BasicType::UInt32,
            ArrayData::Int64(_) => BasicType::Int64,
            ArrayData::UInt64(_) => BasicType::UInt64,
            ArrayData::Real32(_) => BasicType::Real32,
            ArrayData::Real64(_) => BasicType::Real64,
            ArrayData::Bool(_) => BasicType::Bool,
            ArrayData::Handle(_) => BasicType::Handle,
        }
    }

    pub fn len(&self) -> usize {
        with_vec!(self, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rust element types that can back an [`Array`]
pub trait ArrayElement: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Basic type tag of this element
    const BASIC_TYPE: BasicType;

    fn slice(data: &ArrayData) -> Option<&[Self]>;

    fn slice_mut(data: &mut ArrayData) -> Option<&mut [Self]>;

    fn into_data(values: Vec<Self>) -> ArrayData;
}

macro_rules! impl_array_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl ArrayElement for $t {
                const BASIC_TYPE: BasicType = BasicType::$variant;

                fn slice(data: &ArrayData) -> Option<&[Self]> {
                    match data {
                        ArrayData::$variant(v) => Some(v.as_slice()),
                        _ => None,
                    }
                }

                fn slice_mut(data: &mut ArrayData) -> Option<&mut [Self]> {
                    match data {
                        ArrayData::$variant(v) => Some(v.as_mut_slice()),
                        _ => None,
                    }
                }

                fn into_data(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }
            }
        )*
    };
}

impl_array_element!(
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

/// A typed buffer with an immutable element type.
///
/// A freshly created array is unallocated and holds zero elements. Allocation
/// always zero fills, so nothing ever observes uninitialised memory.
///
/// # Example
/// ```
/// use neurograph_structures::{Array, BasicType};
///
/// let mut array = Array::new(BasicType::Real32);
/// assert!(!array.is_allocated());
///
/// array.allocate(3);
/// assert_eq!(array.as_slice::<f32>().unwrap(), &[0.0, 0.0, 0.0]);
///
/// array.as_mut_slice::<f32>().unwrap()[1] = 2.5;
/// assert_eq!(array.to_vec::<f32>().unwrap(), vec![0.0, 2.5, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    data: ArrayData,
    allocated: bool,
}

impl Array {
    /// Create an unallocated array of the given element type
    pub fn new(element_type: BasicType) -> Self {
        Self {
            data: ArrayData::zeroed(element_type, 0),
            allocated: false,
        }
    }

    /// Create an allocated, zero filled array
    pub fn zeroed(element_type: BasicType, count: usize) -> Self {
        Self {
            data: ArrayData::zeroed(element_type, count),
            allocated: true,
        }
    }

    /// Create an allocated array that takes ownership of `values`
    pub fn from_vec<T: ArrayElement>(values: Vec<T>) -> Self {
        Self {
            data: T::into_data(values),
            allocated: true,
        }
    }

    pub fn element_type(&self) -> BasicType {
        self.data.basic_type()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn size_in_bytes(&self) -> usize {
        self.len() * self.element_type().size()
    }

    /// (Re)allocate `count` zeroed elements, discarding previous contents
    pub fn allocate(&mut self, count: usize) {
        self.data = ArrayData::zeroed(self.element_type(), count);
        self.allocated = true;
    }

    /// Drop the storage and return to the unallocated state
    pub fn release(&mut self) {
        self.data = ArrayData::zeroed(self.element_type(), 0);
        self.allocated = false;
    }

    /// Zero every element, keeping the current length
    pub fn fill_zero(&mut self) {
        with_vec!(&mut self.data, |v| v.iter_mut().for_each(|e| *e = Default::default()))
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn as_slice<T: ArrayElement>(&self) -> Result<&[T], StructuresError> {
        T::slice(&self.data).ok_or(StructuresError::TypeMismatch {
            expected: self.element_type(),
            actual: T::BASIC_TYPE,
        })
    }

    pub fn as_mut_slice<T: ArrayElement>(&mut self) -> Result<&mut [T], StructuresError> {
        let element_type = self.element_type();
        T::slice_mut(&mut self.data).ok_or(StructuresError::TypeMismatch {
            expected: element_type,
            actual: T::BASIC_TYPE,
        })
    }

    pub fn to_vec<T: ArrayElement>(&self) -> Result<Vec<T>, StructuresError> {
        self.as_slice::<T>().map(|s| s.to_vec())
    }

    /// Copy this array (optionally reindexed) into `dst` starting at `dst_offset`.
    ///
    /// Element types must match exactly; no widening is performed. Returns the
    /// number of elements written.
    pub fn copy_into(
        &self,
        dst: &mut Array,
        dst_offset: usize,
        rule: Option<&ReindexRule>,
    ) -> Result<usize, StructuresError> {
        with_vec_pair!(&self.data, &mut dst.data, |s, d| copy_elements(
            s.as_slice(),
            d.as_mut_slice(),
            dst_offset,
            rule
        ))
    }

    /// Overwrite the whole content with `src`, which must have the same type and length
    pub fn copy_from(&mut self, src: &Array) -> Result<(), StructuresError> {
        if src.len() != self.len() {
            return Err(StructuresError::BadParameters(format!(
                "cannot copy {} elements into a buffer of {}",
                src.len(),
                self.len()
            )));
        }
        src.copy_into(self, 0, None).map(|_| ())
    }
}

fn copy_elements<T: Copy>(
    src: &[T],
    dst: &mut [T],
    dst_offset: usize,
    rule: Option<&ReindexRule>,
) -> Result<usize, StructuresError> {
    if let Some(rule) = rule {
        rule.validate(src.len())?;
    }
    let width = ReindexRule::width_for(rule, src.len());
    let end = dst_offset + width;
    if end > dst.len() {
        return Err(StructuresError::OutOfBounds {
            index: end,
            len: dst.len(),
        });
    }
    let target = &mut dst[dst_offset..end];
    match rule {
        None => target.copy_from_slice(src),
        Some(ReindexRule::Range { offset, count }) => {
            target.copy_from_slice(&src[*offset..*offset + *count]);
        }
        Some(ReindexRule::Indices(indices)) => {
            for (slot, &index) in target.iter_mut().zip(indices.iter()) {
                *slot = src[index];
            }
        }
    }
    Ok(width)
}
