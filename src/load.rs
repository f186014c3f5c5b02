//! File-level entry points: reading and writing graphs and maps, and
//! assembling a map from loosely specified arguments.
use crate::archive::{ArchiveError, Unarchiver, read_document, write_document};
use crate::files::{open_readable, open_writable};
use crate::graph::{Graph, NodeId};
use crate::graph::ports::PortElements;
use crate::map::{Map, MapError};
use crate::nodes::InputNode;
use crate::port_spec::{parse_input_spec, parse_output_spec};
use crate::registry::TypeRegistry;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("File not writable: {}", .0.display())]
    FileNotWritable(PathBuf),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unable to parse config file {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where a map comes from. A map file wins over a model file, which wins
/// over the pass-through default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapLoadArguments {
    pub map_filename: Option<PathBuf>,
    pub model_filename: Option<PathBuf>,
    pub model_inputs: Option<String>,
    pub model_outputs: Option<String>,
    pub default_input_size: usize,
}

impl Default for MapLoadArguments {
    fn default() -> Self {
        Self {
            map_filename: None,
            model_filename: None,
            model_inputs: None,
            model_outputs: None,
            default_input_size: 1,
        }
    }
}

fn non_empty_path(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|x| !x.as_os_str().is_empty())
}

fn non_empty_str(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(|x| x.trim()).filter(|x| !x.is_empty())
}

impl MapLoadArguments {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        serde_json::from_reader(open_readable(path)?).map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn map_filename(&self) -> Option<&Path> {
        non_empty_path(&self.map_filename)
    }

    pub fn model_filename(&self) -> Option<&Path> {
        non_empty_path(&self.model_filename)
    }

    pub fn model_inputs(&self) -> Option<&str> {
        non_empty_str(&self.model_inputs)
    }

    pub fn model_outputs(&self) -> Option<&str> {
        non_empty_str(&self.model_outputs)
    }
}

pub fn read_graph(registry: &TypeRegistry, reader: impl Read) -> Result<Graph, LoadError> {
    let document = read_document(reader)?;
    let unarchiver = Unarchiver::new(registry, &document, "")?;
    Ok(Graph::unarchive(&unarchiver)?)
}

pub fn write_graph(graph: &Graph, writer: impl Write) -> Result<(), LoadError> {
    write_document(&graph.to_archive()?.into_value(), writer)?;
    Ok(())
}

pub fn load_graph(registry: &TypeRegistry, path: impl AsRef<Path>) -> Result<Graph, LoadError> {
    let path = path.as_ref();
    let graph = read_graph(registry, open_readable(path)?)?;
    log::info!("Loaded model with {} nodes from {}", graph.len(), path.display());
    Ok(graph)
}

pub fn save_graph(graph: &Graph, path: impl AsRef<Path>) -> Result<(), LoadError> {
    let path = path.as_ref();
    write_graph(graph, open_writable(path)?)?;
    log::info!("Saved model with {} nodes to {}", graph.len(), path.display());
    Ok(())
}

pub fn read_map(registry: &TypeRegistry, reader: impl Read) -> Result<Map, LoadError> {
    let document = read_document(reader)?;
    let unarchiver = Unarchiver::new(registry, &document, "")?;
    Ok(Map::unarchive(&unarchiver)?)
}

pub fn write_map(map: &Map, writer: impl Write) -> Result<(), LoadError> {
    write_document(&map.to_archive()?.into_value(), writer)?;
    Ok(())
}

/// An empty path yields the empty map.
pub fn load_map(registry: &TypeRegistry, path: impl AsRef<Path>) -> Result<Map, LoadError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Ok(Map::default());
    }
    let map = read_map(registry, open_readable(path)?)?;
    log::info!("Loaded map with {} nodes from {}", map.graph().len(), path.display());
    Ok(map)
}

pub fn save_map(map: &Map, path: impl AsRef<Path>) -> Result<(), LoadError> {
    let path = path.as_ref();
    write_map(map, open_writable(path)?)?;
    log::info!("Saved map with {} nodes to {}", map.graph().len(), path.display());
    Ok(())
}

fn select_input(graph: &Graph, arguments: &MapLoadArguments) -> Result<NodeId, LoadError> {
    match arguments.model_inputs() {
        Some(spec) => parse_input_spec(graph, spec)
            .map_err(|e| LoadError::InvalidArgument(format!("can't find input node: {}", e))),
        None => graph
            .input_nodes()
            .next()
            .map(|x| x.0)
            .ok_or_else(|| LoadError::InvalidArgument("can't find input node".to_string())),
    }
}

fn select_output(graph: &Graph, arguments: &MapLoadArguments) -> Result<PortElements, LoadError> {
    match arguments.model_outputs() {
        Some(spec) => {
            let elements = parse_output_spec(graph, spec)
                .map_err(|e| LoadError::InvalidArgument(format!("can't find output elements: {}", e)))?;
            if elements.is_empty() {
                return Err(LoadError::InvalidArgument(format!(
                    "output spec \"{}\" names no elements",
                    spec
                )));
            }
            Ok(elements)
        }
        None => {
            let (id, _) = graph
                .output_nodes()
                .next()
                .ok_or_else(|| LoadError::InvalidArgument("can't find output node".to_string()))?;
            graph
                .port_elements(id, 0)
                .ok_or_else(|| LoadError::InvalidArgument("can't find output port".to_string()))
        }
    }
}

/// A graph holding a single `InputNode<double>` that is both the input and the output.
fn identity_map(size: usize) -> Result<Map, LoadError> {
    let mut graph = Graph::new();
    let input = graph.add_node(InputNode::<f64>::new(size));
    let output = graph
        .port_elements(input, 0)
        .ok_or_else(|| LoadError::InvalidArgument("can't find output port".to_string()))?;
    Ok(Map::new(
        graph,
        vec![("input".to_string(), input)],
        vec![("output".to_string(), output)],
    )?)
}

pub fn load_map_from_arguments(
    registry: &TypeRegistry,
    arguments: &MapLoadArguments,
) -> Result<Map, LoadError> {
    if let Some(path) = arguments.map_filename() {
        return load_map(registry, path);
    }
    if let Some(path) = arguments.model_filename() {
        let graph = load_graph(registry, path)?;
        let input = select_input(&graph, arguments)?;
        let output = select_output(&graph, arguments)?;
        log::debug!("Mapping input node {} and {} output elements", input, output.size());
        return Ok(Map::new(
            graph,
            vec![("input".to_string(), input)],
            vec![("output".to_string(), output)],
        )?);
    }
    log::info!(
        "No map or model given, using a pass-through map of size {}",
        arguments.default_input_size
    );
    identity_map(arguments.default_input_size)
}
