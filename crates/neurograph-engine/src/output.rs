// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_structures::{Array, BasicType};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{NetworkError, NetworkResult};

/// Identifier of a link within one network; allocated in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u64);

impl Display for LinkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Named output buffer owned by a region
#[derive(Debug, Clone)]
pub struct Output {
    region: String,
    name: String,
    data: Array,
    links: Vec<LinkId>,
    is_default: bool,
}

impl Output {
    pub fn new(
        region: impl Into<String>,
        name: impl Into<String>,
        data_type: BasicType,
        is_default: bool,
    ) -> Self {
        Self {
            region: region.into(),
            name: name.into(),
            data: Array::new(data_type),
            links: Vec::new(),
            is_default,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn element_type(&self) -> BasicType {
        self.data.element_type()
    }

    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &Array {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Array {
        &mut self.data
    }

    /// Subscribed links, in registration order
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn has_outgoing_links(&self) -> bool {
        !self.links.is_empty()
    }

    fn endpoint(&self) -> String {
        format!("{}.{}", self.region, self.name)
    }

    pub fn add_link(&mut self, link: LinkId) -> NetworkResult<()> {
        if self.links.contains(&link) {
            return Err(NetworkError::DuplicateLink(format!(
                "{} already feeds {}",
                link,
                self.endpoint()
            )));
        }
        self.links.push(link);
        Ok(())
    }

    pub fn remove_link(&mut self, link: LinkId) -> NetworkResult<()> {
        let position = self.links.iter().position(|l| *l == link).ok_or_else(|| {
            NetworkError::MissingLink(format!("{} is not attached to {}", link, self.endpoint()))
        })?;
        self.links.remove(position);
        Ok(())
    }

    /// Allocate `count` zeroed elements.
    ///
    /// An allocated buffer of the same size is kept as is, so restored data
    /// survives. A different size is only accepted while no link is attached.
    pub fn initialize(&mut self, count: usize) -> NetworkResult<()> {
        if !self.data.is_allocated() {
            self.data.allocate(count);
        } else if self.data.len() != count {
            if self.has_outgoing_links() {
                return Err(NetworkError::BufferResize {
                    endpoint: self.endpoint(),
                    current: self.data.len(),
                    requested: count,
                });
            }
            self.data.allocate(count);
        }
        Ok(())
    }

    /// Install a saved buffer; the element type must match the declaration
    pub(crate) fn restore(&mut self, saved: Array) -> NetworkResult<()> {
        if saved.element_type() != self.element_type() {
            return Err(NetworkError::Structures(
                neurograph_structures::StructuresError::TypeMismatch {
                    expected: self.element_type(),
                    actual: saved.element_type(),
                },
            ));
        }
        self.data = saved;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_and_missing_link() {
        let mut output = Output::new("a", "out", BasicType::Int32, true);
        output.add_link(LinkId(1)).unwrap();
        assert!(matches!(
            output.add_link(LinkId(1)),
            Err(NetworkError::DuplicateLink(_))
        ));
        assert!(matches!(
            output.remove_link(LinkId(2)),
            Err(NetworkError::MissingLink(_))
        ));
        output.remove_link(LinkId(1)).unwrap();
        assert!(!output.has_outgoing_links());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut output = Output::new("a", "out", BasicType::Real32, false);
        assert_eq!(output.element_count(), 0);
        output.initialize(3).unwrap();
        output.data_mut().as_mut_slice::<f32>().unwrap()[0] = 1.5;
        output.initialize(3).unwrap();
        assert_eq!(output.data().to_vec::<f32>().unwrap(), vec![1.5, 0.0, 0.0]);
    }

    #[test]
    fn test_resize_rejected_with_links() {
        let mut output = Output::new("a", "out", BasicType::Byte, false);
        output.initialize(2).unwrap();
        output.initialize(4).unwrap();
        assert_eq!(output.element_count(), 4);

        output.add_link(LinkId(0)).unwrap();
        assert!(matches!(
            output.initialize(8),
            Err(NetworkError::BufferResize {
                current: 4,
                requested: 8,
                ..
            })
        ));
    }

    #[test]
    fn test_restore_checks_type() {
        let mut output = Output::new("a", "out", BasicType::Int16, false);
        assert!(output.restore(Array::from_vec(vec![1i32])).is_err());
        output.restore(Array::from_vec(vec![4i16, 5])).unwrap();
        output.initialize(2).unwrap();
        assert_eq!(output.data().to_vec::<i16>().unwrap(), vec![4, 5]);
    }
}
