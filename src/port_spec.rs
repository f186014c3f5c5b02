//! Textual references into a graph, as given on command lines and in configs.
//!
//! An input spec is a node id (`"3"`). An output spec is a comma separated
//! list, optionally wrapped in braces, of `node.port`, `node.port[i]` or
//! `node.port[start:end]`, where `port` is an output port name or index.
use crate::graph::ports::{PortElements, PortRange};
use crate::graph::{Graph, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortSpecError {
    #[error("Malformed port spec \"{spec}\": {reason}")]
    Malformed { spec: String, reason: String },
    #[error("Node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("Node {0} is not an input node")]
    NotAnInput(NodeId),
    #[error("Node {node} has no output port \"{port}\"")]
    UnknownPort { node: NodeId, port: String },
    #[error("Elements [{start}, {end}) are out of range for node {node} port {port} of size {size}")]
    OutOfRange {
        node: NodeId,
        port: usize,
        start: usize,
        end: usize,
        size: usize,
    },
}

fn malformed(spec: &str, reason: impl Into<String>) -> PortSpecError {
    PortSpecError::Malformed {
        spec: spec.to_string(),
        reason: reason.into(),
    }
}

fn parse_node_id(graph: &Graph, spec: &str, text: &str) -> Result<NodeId, PortSpecError> {
    let id: NodeId = text
        .parse()
        .map_err(|_| malformed(spec, format!("\"{}\" is not a node id", text.trim())))?;
    graph.get_node(id).ok_or(PortSpecError::UnknownNode(id))?;
    Ok(id)
}

/// Resolves an input spec to a graph-input node.
pub fn parse_input_spec(graph: &Graph, spec: &str) -> Result<NodeId, PortSpecError> {
    let id = parse_node_id(graph, spec, spec)?;
    match graph.get_node(id).and_then(|x| x.as_input_node()) {
        Some(_) => Ok(id),
        None => Err(PortSpecError::NotAnInput(id)),
    }
}

fn parse_port_range(graph: &Graph, spec: &str, item: &str) -> Result<PortRange, PortSpecError> {
    let (node_text, rest) = item
        .split_once('.')
        .ok_or_else(|| malformed(spec, format!("\"{}\" is missing a port", item)))?;
    let node = parse_node_id(graph, spec, node_text)?;

    let (port_text, index_text) = match rest.split_once('[') {
        Some((port, index)) => {
            let index = index
                .strip_suffix(']')
                .ok_or_else(|| malformed(spec, format!("unterminated index in \"{}\"", item)))?;
            (port.trim(), Some(index))
        }
        None => (rest.trim(), None),
    };
    let port = match port_text.parse::<usize>() {
        Ok(x) => x,
        Err(_) => graph
            .find_output_port(node, port_text)
            .ok_or_else(|| PortSpecError::UnknownPort {
                node,
                port: port_text.to_string(),
            })?,
    };
    let size = graph
        .output_port(node, port)
        .ok_or_else(|| PortSpecError::UnknownPort {
            node,
            port: port_text.to_string(),
        })?
        .size();

    let parse_index = |text: &str| -> Result<usize, PortSpecError> {
        text.trim()
            .parse()
            .map_err(|_| malformed(spec, format!("\"{}\" is not an element index", text.trim())))
    };
    let (start, end) = match index_text {
        None => (0, size),
        Some(text) => match text.split_once(':') {
            Some((start, end)) => {
                let start = if start.trim().is_empty() { 0 } else { parse_index(start)? };
                let end = if end.trim().is_empty() { size } else { parse_index(end)? };
                (start, end)
            }
            None => {
                let i = parse_index(text)?;
                let end = i.checked_add(1).ok_or_else(|| PortSpecError::OutOfRange {
                    node,
                    port,
                    start: i,
                    end: i,
                    size,
                })?;
                (i, end)
            }
        },
    };
    if start > end || end > size {
        return Err(PortSpecError::OutOfRange {
            node,
            port,
            start,
            end,
            size,
        });
    }
    Ok(PortRange::new(node, port, start, end - start))
}

/// Resolves an output spec to the elements it names, in order.
pub fn parse_output_spec(graph: &Graph, spec: &str) -> Result<PortElements, PortSpecError> {
    let mut body = spec.trim();
    if let Some(inner) = body.strip_prefix('{') {
        body = inner
            .strip_suffix('}')
            .ok_or_else(|| malformed(spec, "unbalanced braces"))?;
    }
    let mut elements = PortElements::new();
    if body.trim().is_empty() {
        return Ok(elements);
    }
    for item in body.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(malformed(spec, "empty element"));
        }
        elements.push(parse_port_range(graph, spec, item)?);
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{InputNode, OutputNode};

    fn graph() -> Graph {
        let mut graph = Graph::new();
        let input = graph.add_node(InputNode::<f64>::new(4));
        graph.add_node(OutputNode::<f64>::new(graph.port_elements(input, 0).unwrap()));
        graph
    }

    #[test]
    fn input_spec() {
        let graph = graph();
        assert_eq!(parse_input_spec(&graph, "0"), Ok(NodeId(0)));
        assert_eq!(parse_input_spec(&graph, " 0 "), Ok(NodeId(0)));
        assert_eq!(parse_input_spec(&graph, "1"), Err(PortSpecError::NotAnInput(NodeId(1))));
        assert_eq!(parse_input_spec(&graph, "7"), Err(PortSpecError::UnknownNode(NodeId(7))));
        assert!(matches!(parse_input_spec(&graph, "x"), Err(PortSpecError::Malformed { .. })));
    }

    #[test]
    fn whole_port() {
        let graph = graph();
        let elements = parse_output_spec(&graph, "1.output").unwrap();
        assert_eq!(elements.ranges(), &[PortRange::new(NodeId(1), 0, 0, 4)]);
        assert_eq!(parse_output_spec(&graph, "1.0").unwrap(), elements);
    }

    #[test]
    fn indexed_and_sliced_ports() {
        let graph = graph();
        let elements = parse_output_spec(&graph, "{1.output[3], 0.output[0:2], 0.output[2:]}").unwrap();
        assert_eq!(
            elements.ranges(),
            &[
                PortRange::new(NodeId(1), 0, 3, 1),
                PortRange::new(NodeId(0), 0, 0, 2),
                PortRange::new(NodeId(0), 0, 2, 2),
            ]
        );
        assert_eq!(elements.size(), 5);
    }

    #[test]
    fn bad_output_specs() {
        let graph = graph();
        assert!(matches!(
            parse_output_spec(&graph, "1.input"),
            Err(PortSpecError::UnknownPort { .. })
        ));
        assert!(matches!(
            parse_output_spec(&graph, "1.output[2:9]"),
            Err(PortSpecError::OutOfRange { end: 9, size: 4, .. })
        ));
        assert!(matches!(parse_output_spec(&graph, "1"), Err(PortSpecError::Malformed { .. })));
        assert!(matches!(parse_output_spec(&graph, "{1.output"), Err(PortSpecError::Malformed { .. })));
        assert!(matches!(parse_output_spec(&graph, "1.output,,"), Err(PortSpecError::Malformed { .. })));
        assert!(parse_output_spec(&graph, "{}").unwrap().is_empty());
        assert!(matches!(
            parse_output_spec(&graph, &format!("1.output[{}]", usize::MAX)),
            Err(PortSpecError::OutOfRange { size: 4, .. })
        ));
    }
}
