use crate::dtype::DType;
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// A contiguous slice of one output port of one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub node: NodeId,
    pub port: usize,
    pub start: usize,
    pub count: usize,
}

impl PortRange {
    pub fn new(node: NodeId, port: usize, start: usize, count: usize) -> Self {
        Self {
            node,
            port,
            start,
            count,
        }
    }

    /// One past the last element, or `None` when that overflows.
    pub fn end(&self) -> Option<usize> {
        self.start.checked_add(self.count)
    }
}

/// Ordered set of port ranges, read as one flat vector of elements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortElements {
    ranges: Vec<PortRange>,
}

impl PortElements {
    pub fn new() -> Self {
        Self { ranges: vec![] }
    }

    pub fn from_range(range: PortRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    pub fn from_ranges(ranges: impl IntoIterator<Item = PortRange>) -> Self {
        Self {
            ranges: ranges.into_iter().collect(),
        }
    }

    pub fn push(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    pub fn append(&mut self, other: &PortElements) {
        self.ranges.extend(other.ranges.iter().copied());
    }

    pub fn ranges(&self) -> &[PortRange] {
        &self.ranges
    }

    /// Total number of elements across all ranges, or `None` when that overflows.
    pub fn checked_size(&self) -> Option<usize> {
        self.ranges.iter().try_fold(0usize, |acc, x| acc.checked_add(x.count))
    }

    /// Total number of elements across all ranges, saturating at `usize::MAX`.
    /// Loaded elements never saturate.
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Distinct nodes referenced, in first-seen order.
    pub fn referenced_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for range in &self.ranges {
            if !out.contains(&range.node) {
                out.push(range.node);
            }
        }
        out
    }
}

impl From<PortRange> for PortElements {
    fn from(value: PortRange) -> Self {
        Self::from_range(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputPort {
    name: &'static str,
    dtype: DType,
    size: usize,
}

impl OutputPort {
    pub fn new(name: &'static str, dtype: DType, size: usize) -> Self {
        Self { name, dtype, size }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputPort {
    name: &'static str,
    dtype: DType,
    elements: PortElements,
}

impl InputPort {
    pub fn new(name: &'static str, dtype: DType, elements: PortElements) -> Self {
        Self {
            name,
            dtype,
            elements,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn elements(&self) -> &PortElements {
        &self.elements
    }

    pub fn set_elements(&mut self, elements: PortElements) {
        self.elements = elements;
    }

    pub fn size(&self) -> usize {
        self.elements.size()
    }
}
