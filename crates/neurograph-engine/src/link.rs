// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed data routing edge between an output and an input.
//!
//! A link with delay `D` keeps a FIFO of `D` snapshots of its source output.
//! The destination reads the oldest snapshot, so data produced at cycle `N`
//! arrives at cycle `N + D`. Delay 0 links read the live output.

use neurograph_structures::{Array, ReindexRule};
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

use crate::output::LinkId;

/// Endpoints and options for a new link.
///
/// Leaving an endpoint name empty selects the region's default output or
/// input.
///
/// # Example
/// ```
/// use neurograph_engine::LinkSpec;
///
/// let spec = LinkSpec::new("gen", "out", "sink", "in").delay(1);
/// assert_eq!(spec.to_string(), "gen.out -> sink.in (delay 1)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub src_region: String,
    pub src_output: String,
    pub dest_region: String,
    pub dest_input: String,
    pub reindex: Option<ReindexRule>,
    pub delay: u32,
}

impl LinkSpec {
    pub fn new(
        src_region: impl Into<String>,
        src_output: impl Into<String>,
        dest_region: impl Into<String>,
        dest_input: impl Into<String>,
    ) -> Self {
        Self {
            src_region: src_region.into(),
            src_output: src_output.into(),
            dest_region: dest_region.into(),
            dest_input: dest_input.into(),
            reindex: None,
            delay: 0,
        }
    }

    /// Link the default output of `src_region` to the default input of `dest_region`
    pub fn between_defaults(src_region: impl Into<String>, dest_region: impl Into<String>) -> Self {
        Self::new(src_region, "", dest_region, "")
    }

    pub fn delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }

    pub fn reindex(mut self, rule: ReindexRule) -> Self {
        self.reindex = Some(rule);
        self
    }
}

impl Display for LinkSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.src_region, self.src_output, self.dest_region, self.dest_input
        )?;
        if self.delay > 0 {
            write!(f, " (delay {})", self.delay)?;
        }
        Ok(())
    }
}

/// Link owned by a network
#[derive(Debug, Clone)]
pub struct Link {
    id: LinkId,
    spec: LinkSpec,
    pending: VecDeque<Array>,
}

impl Link {
    /// `spec` must have both endpoint names resolved
    pub(crate) fn new(id: LinkId, spec: LinkSpec) -> Self {
        Self {
            id,
            spec,
            pending: VecDeque::new(),
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn spec(&self) -> &LinkSpec {
        &self.spec
    }

    pub fn src_region(&self) -> &str {
        &self.spec.src_region
    }

    pub fn src_output(&self) -> &str {
        &self.spec.src_output
    }

    pub fn dest_region(&self) -> &str {
        &self.spec.dest_region
    }

    pub fn dest_input(&self) -> &str {
        &self.spec.dest_input
    }

    pub fn delay(&self) -> u32 {
        self.spec.delay
    }

    pub fn reindex(&self) -> Option<&ReindexRule> {
        self.spec.reindex.as_ref()
    }

    /// Elements this link contributes for a source of `source_len` elements
    pub fn width(&self, source_len: usize) -> usize {
        ReindexRule::width_for(self.reindex(), source_len)
    }

    /// Buffered snapshots, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &Array> {
        self.pending.iter()
    }

    pub(crate) fn restore_pending(&mut self, snapshots: Vec<Array>) {
        self.pending = snapshots.into();
    }

    /// Make sure a delayed link holds `delay` snapshots shaped like `source`.
    ///
    /// Restored snapshots of the right shape are kept; otherwise the FIFO is
    /// refilled with zeroes.
    pub(crate) fn initialize_buffers(&mut self, source: &Array) {
        let delay = self.spec.delay as usize;
        let shaped = self.pending.len() == delay
            && self.pending.iter().all(|snapshot| {
                snapshot.element_type() == source.element_type() && snapshot.len() == source.len()
            });
        if !shaped {
            self.pending = (0..delay)
                .map(|_| Array::zeroed(source.element_type(), source.len()))
                .collect();
        }
    }

    /// Data the destination sees this cycle
    pub(crate) fn visible<'a>(&'a self, output: &'a Array) -> &'a Array {
        if self.spec.delay == 0 {
            output
        } else {
            self.pending.front().unwrap_or(output)
        }
    }

    /// Push this cycle's output and drop the oldest snapshot
    pub(crate) fn shift(&mut self, output: &Array) {
        if self.spec.delay == 0 {
            return;
        }
        // Reuse the oldest buffer rather than allocating a new one
        match self.pending.pop_front() {
            Some(mut oldest) if oldest.len() == output.len() => {
                if oldest.copy_from(output).is_err() {
                    oldest = output.clone();
                }
                self.pending.push_back(oldest);
            }
            _ => self.pending.push_back(output.clone()),
        }
    }
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id, self.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurograph_structures::BasicType;

    fn delayed(delay: u32) -> Link {
        Link::new(LinkId(0), LinkSpec::new("a", "out", "b", "in").delay(delay))
    }

    #[test]
    fn test_delay_zero_reads_live_output() {
        let link = delayed(0);
        let output = Array::from_vec(vec![1u8, 2]);
        assert_eq!(link.visible(&output), &output);
    }

    #[test]
    fn test_delay_two_fifo() {
        let mut link = delayed(2);
        let mut output = Array::zeroed(BasicType::Int32, 2);
        link.initialize_buffers(&output);
        assert_eq!(link.pending().count(), 2);

        let mut seen = Vec::new();
        for cycle in 1..=4i32 {
            seen.push(link.visible(&output).to_vec::<i32>().unwrap());
            output.as_mut_slice::<i32>().unwrap().fill(cycle);
            link.shift(&output);
        }
        assert_eq!(
            seen,
            vec![vec![0, 0], vec![0, 0], vec![1, 1], vec![2, 2]]
        );
    }

    #[test]
    fn test_restored_buffers_are_kept() {
        let mut link = delayed(1);
        link.restore_pending(vec![Array::from_vec(vec![9i64])]);
        link.initialize_buffers(&Array::zeroed(BasicType::Int64, 1));
        assert_eq!(
            link.pending().next().unwrap().to_vec::<i64>().unwrap(),
            vec![9]
        );

        // Wrong shape is replaced
        link.initialize_buffers(&Array::zeroed(BasicType::Int64, 3));
        assert_eq!(link.pending().next().unwrap().len(), 3);
    }

    #[test]
    fn test_width_uses_reindex() {
        let link = Link::new(
            LinkId(1),
            LinkSpec::new("a", "out", "b", "in").reindex(ReindexRule::Range { offset: 1, count: 2 }),
        );
        assert_eq!(link.width(10), 2);
        assert_eq!(delayed(0).width(10), 10);
    }
}
