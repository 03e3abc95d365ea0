// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograph-structures
//!
//! Leaf data types shared by every neurograph crate: the [`BasicType`] element
//! tag, typed [`Array`] buffers, parameter values and link reindexing rules.

pub mod array;
pub mod basic_type;
mod error;
pub mod parameters;
pub mod reindex;

pub use array::{Array, ArrayData, ArrayElement, Handle};
pub use basic_type::BasicType;
pub use error::StructuresError;
pub use parameters::{ParameterMap, ParameterValue, Scalar, ScalarValue};
pub use reindex::ReindexRule;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
