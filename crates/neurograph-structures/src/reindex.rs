// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Element reindexing applied by a link when copying a source buffer.

use serde::{Deserialize, Serialize};

use crate::StructuresError;

/// Selects which source elements a link contributes, and in which order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReindexRule {
    /// Contiguous slice `source[offset..offset + count]`
    Range { offset: usize, count: usize },
    /// Gather `source[indices[i]]` for every `i`
    Indices(Vec<usize>),
}

impl ReindexRule {
    /// Number of elements this rule contributes
    pub fn width(&self) -> usize {
        match self {
            ReindexRule::Range { count, .. } => *count,
            ReindexRule::Indices(indices) => indices.len(),
        }
    }

    /// Width with an optional rule; no rule means the whole source
    pub fn width_for(rule: Option<&ReindexRule>, source_len: usize) -> usize {
        rule.map_or(source_len, ReindexRule::width)
    }

    /// Check that every selected element exists in a source of `source_len` elements
    pub fn validate(&self, source_len: usize) -> Result<(), StructuresError> {
        match self {
            ReindexRule::Range { offset, count } => {
                let end = offset
                    .checked_add(*count)
                    .ok_or_else(|| StructuresError::BadParameters("range overflows".into()))?;
                if end > source_len {
                    return Err(StructuresError::OutOfBounds {
                        index: end,
                        len: source_len,
                    });
                }
            }
            ReindexRule::Indices(indices) => {
                if let Some(&bad) = indices.iter().find(|&&i| i >= source_len) {
                    return Err(StructuresError::OutOfBounds {
                        index: bad,
                        len: source_len,
                    });
                }
            }
        }
        Ok(())
    }
}
