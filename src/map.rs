use crate::archive::{ArchiveError, Archivable, Archiver, Unarchiver, expect_record};
use crate::graph::ports::PortElements;
use crate::graph::{Graph, InputNodeBase, NodeId};

pub const MAP_TYPE_TAG: &str = "Map";
pub const MAP_ARCHIVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Map has no anchor named \"{0}\"")]
    UnknownAnchor(String),
    #[error("Invalid anchor \"{name}\": {reason}")]
    InvalidAnchor { name: String, reason: String },
}

/// A graph together with named entry and exit points.
#[derive(Debug, Default)]
pub struct Map {
    graph: Graph,
    inputs: Vec<(String, NodeId)>,
    outputs: Vec<(String, PortElements)>,
}

impl Map {
    /// Every input anchor must name a graph-input node and every output anchor
    /// must reference existing elements. Anchor names are unique per side.
    pub fn new(
        graph: Graph,
        inputs: Vec<(String, NodeId)>,
        outputs: Vec<(String, PortElements)>,
    ) -> Result<Self, MapError> {
        check_inputs(&graph, &inputs).map_err(|x| x.1)?;
        check_outputs(&graph, &outputs).map_err(|x| x.1)?;
        Ok(Self {
            graph,
            inputs,
            outputs,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty() && self.inputs.is_empty() && self.outputs.is_empty()
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inputs.iter().map(|x| x.0.as_str())
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.outputs.iter().map(|x| x.0.as_str())
    }

    pub fn inputs(&self) -> &[(String, NodeId)] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[(String, PortElements)] {
        &self.outputs
    }

    pub fn input_id(&self, name: &str) -> Result<NodeId, MapError> {
        self.inputs
            .iter()
            .find(|x| x.0 == name)
            .map(|x| x.1)
            .ok_or_else(|| MapError::UnknownAnchor(name.to_string()))
    }

    pub fn input(&self, name: &str) -> Result<&dyn InputNodeBase, MapError> {
        let id = self.input_id(name)?;
        self.graph
            .get_node(id)
            .and_then(|x| x.as_input_node())
            .ok_or_else(|| MapError::InvalidAnchor {
                name: name.to_string(),
                reason: format!("node {} is not an input node", id),
            })
    }

    pub fn output(&self, name: &str) -> Result<&PortElements, MapError> {
        self.outputs
            .iter()
            .find(|x| x.0 == name)
            .map(|x| &x.1)
            .ok_or_else(|| MapError::UnknownAnchor(name.to_string()))
    }

    pub fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        let model_path = if archiver.path().is_empty() {
            "model".to_string()
        } else {
            format!("{}.model", archiver.path())
        };
        let mut model = Archiver::new_record(model_path, crate::graph::GRAPH_TYPE_TAG, crate::graph::GRAPH_ARCHIVE_VERSION);
        self.graph.archive(&mut model)?;
        archiver.write_value("model", model.into_value());

        let input_names: Vec<&str> = self.input_names().collect();
        let input_ids: Vec<NodeId> = self.inputs.iter().map(|x| x.1).collect();
        archiver.write("input_names", &input_names)?;
        archiver.write_node_ids("inputs", &input_ids)?;

        let output_names: Vec<&str> = self.output_names().collect();
        let output_elements: Vec<&PortElements> = self.outputs.iter().map(|x| &x.1).collect();
        archiver.write("output_names", &output_names)?;
        archiver.write_port_elements_list("outputs", &output_elements)
    }

    pub fn to_archive(&self) -> Result<Archiver, ArchiveError> {
        let mut archiver = Archiver::new_record("", MAP_TYPE_TAG, MAP_ARCHIVE_VERSION);
        self.archive(&mut archiver)?;
        Ok(archiver)
    }

    pub fn unarchive(unarchiver: &Unarchiver<'_>) -> Result<Self, ArchiveError> {
        expect_record(unarchiver, MAP_TYPE_TAG, MAP_ARCHIVE_VERSION)?;
        let (graph, ids) = unarchiver.with_child("model", Graph::unarchive_with_ids)?;

        // Anchors refer into the model by archived id.
        let linked = unarchiver.with_node_ids(&ids);
        let input_names: Vec<String> = linked.read("input_names")?;
        let input_ids = linked.read_node_ids("inputs")?;
        if input_names.len() != input_ids.len() {
            return Err(ArchiveError::malformed(
                linked.field_path("inputs"),
                format!("{} input names but {} inputs", input_names.len(), input_ids.len()),
            ));
        }
        let output_names: Vec<String> = linked.read("output_names")?;
        let output_elements = linked.read_port_elements_list("outputs")?;
        if output_names.len() != output_elements.len() {
            return Err(ArchiveError::malformed(
                linked.field_path("outputs"),
                format!("{} output names but {} outputs", output_names.len(), output_elements.len()),
            ));
        }

        let inputs: Vec<_> = input_names.into_iter().zip(input_ids).collect();
        let outputs: Vec<_> = output_names.into_iter().zip(output_elements).collect();
        let anchor_error = |field: &str, (i, e): (usize, MapError)| {
            ArchiveError::malformed(format!("{}[{}]", linked.field_path(field), i), e.to_string())
        };
        check_inputs(&graph, &inputs).map_err(|x| anchor_error("inputs", x))?;
        check_outputs(&graph, &outputs).map_err(|x| anchor_error("outputs", x))?;
        let map = Map {
            graph,
            inputs,
            outputs,
        };
        log::debug!(
            "Unarchived map with {} inputs and {} outputs",
            map.inputs.len(),
            map.outputs.len()
        );
        Ok(map)
    }
}

/// Index and reason of the first invalid input anchor.
fn check_inputs(graph: &Graph, inputs: &[(String, NodeId)]) -> Result<(), (usize, MapError)> {
    for (i, (name, id)) in inputs.iter().enumerate() {
        let invalid = |reason: String| {
            (
                i,
                MapError::InvalidAnchor {
                    name: name.clone(),
                    reason,
                },
            )
        };
        if inputs[..i].iter().any(|x| &x.0 == name) {
            return Err(invalid("duplicate input name".to_string()));
        }
        let node = graph
            .get_node(*id)
            .ok_or_else(|| invalid(format!("node {} does not exist", id)))?;
        if node.as_input_node().is_none() {
            return Err(invalid(format!("node {} ({}) is not an input node", id, node.type_tag())));
        }
    }
    Ok(())
}

/// Index and reason of the first invalid output anchor.
fn check_outputs(graph: &Graph, outputs: &[(String, PortElements)]) -> Result<(), (usize, MapError)> {
    for (i, (name, elements)) in outputs.iter().enumerate() {
        let invalid = |reason: String| {
            (
                i,
                MapError::InvalidAnchor {
                    name: name.clone(),
                    reason,
                },
            )
        };
        if outputs[..i].iter().any(|x| &x.0 == name) {
            return Err(invalid("duplicate output name".to_string()));
        }
        for range in elements.ranges() {
            let port = graph
                .output_port(range.node, range.port)
                .ok_or_else(|| invalid(format!("node {} has no output port {}", range.node, range.port)))?;
            match range.end() {
                Some(end) if end <= port.size() => {}
                _ => {
                    return Err(invalid(format!(
                        "elements [{}, {}) of node {} port {} exceed its size {}",
                        range.start,
                        range.start.saturating_add(range.count),
                        range.node,
                        range.port,
                        port.size()
                    )));
                }
            }
        }
    }
    Ok(())
}
