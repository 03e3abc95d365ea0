// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use neurograph_structures::{Array, BasicType};

use crate::error::{NetworkError, NetworkResult};
use crate::output::LinkId;

/// Named input of a region.
///
/// Holds its own copy of the data delivered by its links, concatenated in
/// link registration order.
#[derive(Debug, Clone)]
pub struct Input {
    region: String,
    name: String,
    data: Array,
    links: Vec<LinkId>,
    required: bool,
    is_default: bool,
}

impl Input {
    pub fn new(
        region: impl Into<String>,
        name: impl Into<String>,
        data_type: BasicType,
        required: bool,
        is_default: bool,
    ) -> Self {
        Self {
            region: region.into(),
            name: name.into(),
            data: Array::new(data_type),
            links: Vec::new(),
            required,
            is_default,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
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

    /// Source links, in registration order
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub(crate) fn links_and_data_mut(&mut self) -> (&[LinkId], &mut Array) {
        (&self.links, &mut self.data)
    }

    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn add_link(&mut self, link: LinkId) -> NetworkResult<()> {
        if self.links.contains(&link) {
            return Err(NetworkError::DuplicateLink(format!(
                "{} already feeds {}.{}",
                link, self.region, self.name
            )));
        }
        self.links.push(link);
        Ok(())
    }

    pub fn remove_link(&mut self, link: LinkId) -> NetworkResult<()> {
        let position = self.links.iter().position(|l| *l == link).ok_or_else(|| {
            NetworkError::MissingLink(format!(
                "{} is not attached to {}.{}",
                link, self.region, self.name
            ))
        })?;
        self.links.remove(position);
        Ok(())
    }

    /// Size the local buffer; contents are kept when the size is unchanged
    pub fn initialize(&mut self, count: usize) {
        if !self.data.is_allocated() || self.data.len() != count {
            self.data.allocate(count);
        }
    }
}
