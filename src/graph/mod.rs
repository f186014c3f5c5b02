mod archive;
mod node;
pub mod ports;

pub use archive::{GRAPH_ARCHIVE_VERSION, GRAPH_TYPE_TAG};
pub use node::*;

use crate::graph::ports::{OutputPort, PortElements, PortRange};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Node {node} references missing node {referenced}")]
    DanglingReference { node: NodeId, referenced: NodeId },
    #[error("Node {node} references missing output port {port} of node {referenced}")]
    MissingPort {
        node: NodeId,
        referenced: NodeId,
        port: usize,
    },
    #[error("Node {node} references elements [{start}, {end}) of node {referenced} port {port}, which has {size}")]
    RangeOutOfBounds {
        node: NodeId,
        referenced: NodeId,
        port: usize,
        start: usize,
        end: usize,
        size: usize,
    },
    #[error("Node {node} input \"{input}\" expects {expected} but node {referenced} produces {found}")]
    TypeMismatch {
        node: NodeId,
        input: &'static str,
        referenced: NodeId,
        expected: crate::dtype::DType,
        found: crate::dtype::DType,
    },
}

/// Stable handle of a node, unique within its graph.
#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeId(s.trim().parse()?))
    }
}

/// Owning arena of nodes. Node ids are insertion indices.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Box<dyn Node>>,
}

impl Graph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add_node<N: Node + 'static>(&mut self, node: N) -> NodeId {
        self.add_boxed_node(Box::new(node))
    }

    pub fn add_boxed_node(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id.0).map(|x| x.as_ref())
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut (dyn Node + 'static)> {
        self.nodes.get_mut(id.0).map(|x| x.as_mut())
    }

    pub fn get_node_as<T: Node + 'static>(&self, id: NodeId) -> Option<&T> {
        self.get_node(id)?.as_any().downcast_ref::<T>()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &dyn Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, x)| (NodeId(i), x.as_ref()))
    }

    /// Every node whose concrete type is `T`, in insertion order.
    pub fn nodes_by_type<T: Node + 'static>(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.as_any().downcast_ref::<T>().map(|x| (id, x)))
    }

    pub fn input_nodes(&self) -> impl Iterator<Item = (NodeId, &dyn InputNodeBase)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.as_input_node().map(|x| (id, x)))
    }

    pub fn output_nodes(&self) -> impl Iterator<Item = (NodeId, &dyn OutputNodeBase)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.as_output_node().map(|x| (id, x)))
    }

    pub fn sample_buffers(&self) -> impl Iterator<Item = (NodeId, &dyn SampleBuffer)> + '_ {
        self.iter()
            .filter_map(|(id, node)| node.as_sample_buffer().map(|x| (id, x)))
    }

    pub fn output_port(&self, id: NodeId, port: usize) -> Option<&OutputPort> {
        self.get_node(id)?.output_ports().get(port).copied()
    }

    pub fn find_output_port(&self, id: NodeId, name: &str) -> Option<usize> {
        self.get_node(id)?
            .output_ports()
            .iter()
            .position(|x| x.name() == name)
    }

    /// The whole of output port `port` of node `id`.
    pub fn port_elements(&self, id: NodeId, port: usize) -> Option<PortElements> {
        let output = self.output_port(id, port)?;
        Some(PortElements::from_range(PortRange::new(
            id,
            port,
            0,
            output.size(),
        )))
    }

    /// Nodes with at least one input referencing `id`, in insertion order.
    pub fn consumers_of(&self, id: NodeId) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| {
                node.input_ports()
                    .iter()
                    .any(|x| x.elements().ranges().iter().any(|r| r.node == id))
            })
            .map(|(consumer, _)| consumer)
            .collect()
    }

    /// Checks that `elements`, as read by `node`, point at existing ports and elements.
    pub fn check_elements(&self, node: NodeId, elements: &PortElements) -> Result<(), GraphError> {
        for range in elements.ranges() {
            let referenced = self.get_node(range.node).ok_or(GraphError::DanglingReference {
                node,
                referenced: range.node,
            })?;
            let output = referenced
                .output_ports()
                .get(range.port)
                .copied()
                .ok_or(GraphError::MissingPort {
                    node,
                    referenced: range.node,
                    port: range.port,
                })?;
            match range.end() {
                Some(end) if end <= output.size() => {}
                _ => {
                    return Err(GraphError::RangeOutOfBounds {
                        node,
                        referenced: range.node,
                        port: range.port,
                        start: range.start,
                        end: range.start.saturating_add(range.count),
                        size: output.size(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Checks that every input of every node resolves within this graph.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (id, node) in self.iter() {
            for input in node.input_ports() {
                self.check_elements(id, input.elements())?;
                for range in input.elements().ranges() {
                    if let Some(output) = self.output_port(range.node, range.port) {
                        if output.dtype() != input.dtype() {
                            return Err(GraphError::TypeMismatch {
                                node: id,
                                input: input.name(),
                                referenced: range.node,
                                expected: input.dtype(),
                                found: output.dtype(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
