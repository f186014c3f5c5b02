use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::graph::ports::{InputPort, OutputPort, PortElements, PortRange};
use graph_archive::graph::{Graph, Node, NodeId, TypeName};
use graph_archive::nodes::{InputNode, OutputNode, SliceNode, SpliceNode};
use graph_archive::{LoadError, TypeRegistry, load_graph, read_graph, register_core_types, save_graph};
use serde_json::json;
use std::sync::Once;

static INIT: Once = Once::new();

fn registry() -> TypeRegistry {
    INIT.call_once(|| {
        env_logger::init();
    });
    let mut registry = TypeRegistry::new();
    register_core_types(&mut registry).unwrap();
    registry.add_node_type::<GainNode>().unwrap();
    registry.add_node_alias::<GainNode>("LegacyGainNode").unwrap();
    registry
}

/// Multiplies its input by a constant.
#[derive(Debug, Clone, PartialEq)]
struct GainNode {
    input: InputPort,
    output: OutputPort,
    gain: f64,
}

impl GainNode {
    fn new(elements: PortElements, gain: f64) -> Self {
        let size = elements.size();
        Self {
            input: InputPort::new("input", graph_archive::dtype::DType::F64, elements),
            output: OutputPort::new("output", graph_archive::dtype::DType::F64, size),
            gain,
        }
    }
}

impl Default for GainNode {
    fn default() -> Self {
        Self::new(PortElements::new(), 1.0)
    }
}

impl TypeName for GainNode {
    fn type_name() -> String {
        "GainNode".to_string()
    }
}

impl Archivable for GainNode {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())?;
        archiver.write("gain", &self.gain)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        *self = Self::new(unarchiver.read_port_elements("input")?, unarchiver.read("gain")?);
        Ok(())
    }
}

impl Node for GainNode {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}

fn id(text: &str) -> NodeId {
    text.parse().unwrap()
}

fn read_json(registry: &TypeRegistry, document: serde_json::Value) -> Result<Graph, LoadError> {
    read_graph(registry, document.to_string().as_bytes())
}

#[test]
fn graph_round_trips_through_a_file() {
    let registry = registry();
    let mut graph = Graph::new();
    let input = graph.add_node(InputNode::<f64>::new(4));
    let whole = graph.port_elements(input, 0).unwrap();
    let slice = graph.add_node(SliceNode::<f64>::new(whole.clone(), 1, 2));
    let gain = graph.add_node(GainNode::new(graph.port_elements(slice, 0).unwrap(), 0.5));
    let splice = graph.add_node(SpliceNode::<f64>::new(vec![
        whole,
        graph.port_elements(gain, 0).unwrap(),
    ]));
    graph.add_node(OutputNode::<f64>::new(graph.port_elements(splice, 0).unwrap()));
    graph.validate().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    save_graph(&graph, &path).unwrap();
    let loaded = load_graph(&registry, &path).unwrap();

    assert_eq!(loaded.len(), graph.len());
    for ((_, a), (_, b)) in graph.iter().zip(loaded.iter()) {
        assert_eq!(a.type_tag(), b.type_tag());
        let a_inputs: Vec<_> = a.input_ports().iter().map(|x| x.elements().clone()).collect();
        let b_inputs: Vec<_> = b.input_ports().iter().map(|x| x.elements().clone()).collect();
        assert_eq!(a_inputs, b_inputs);
        let a_sizes: Vec<_> = a.output_ports().iter().map(|x| x.size()).collect();
        let b_sizes: Vec<_> = b.output_ports().iter().map(|x| x.size()).collect();
        assert_eq!(a_sizes, b_sizes);
    }
    assert_eq!(loaded.get_node_as::<GainNode>(gain).unwrap().gain, 0.5);
    let loaded_slice = loaded.get_node_as::<SliceNode<f64>>(slice).unwrap();
    assert_eq!((loaded_slice.start(), loaded_slice.count()), (1, 2));
    assert_eq!(loaded.output_port(splice, 0).unwrap().size(), 6);
    assert_eq!(loaded.consumers_of(input), vec![slice, splice]);
}

#[test]
fn forward_references_resolve_in_either_order() {
    let registry = registry();
    let input = json!({"_type": "InputNode<double>", "_version": 0, "id": "in", "size": 3});
    let output = json!({
        "_type": "OutputNode<double>",
        "_version": 0,
        "id": "out",
        "input": [{"node": "in", "port": 0, "start": 0, "count": 3}]
    });

    let forward = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [output.clone(), input.clone()]}),
    )
    .unwrap();
    let backward = read_json(&registry, json!({"_type": "Model", "_version": 1, "nodes": [input, output]})).unwrap();

    // Nodes keep document order, so the output is node 0 in the first graph.
    let (_, forward_output) = forward.output_nodes().next().unwrap();
    assert_eq!(
        forward_output.input().elements().ranges(),
        &[PortRange::new(id("1"), 0, 0, 3)]
    );
    let (_, backward_output) = backward.output_nodes().next().unwrap();
    assert_eq!(
        backward_output.input().elements().ranges(),
        &[PortRange::new(id("0"), 0, 0, 3)]
    );
    assert_eq!(forward_output.size(), 3);
    assert_eq!(backward_output.size(), 3);
}

#[test]
fn dangling_reference_is_reported() {
    let registry = registry();
    let result = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [{
            "_type": "OutputNode<double>",
            "id": "N1",
            "input": [{"node": "N99", "port": 0, "start": 0, "count": 1}]
        }]}),
    );
    match result {
        Err(LoadError::Archive(ArchiveError::DanglingReference { id, path })) => {
            assert_eq!(id, "N99");
            assert_eq!(path, "nodes[0].input[0].node");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn unknown_type_is_reported() {
    let registry = registry();
    let result = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [{"_type": "NoSuchNode", "id": "N1"}]}),
    );
    assert!(matches!(
        result,
        Err(LoadError::Archive(ArchiveError::UnknownType { ref tag, .. })) if tag == "NoSuchNode"
    ));
}

#[test]
fn aliases_produce_identical_nodes() {
    let registry = registry();
    let node = |tag: &str, id: &str| {
        json!({
            "_type": tag,
            "id": id,
            "input": [{"node": "in", "port": 0, "start": 0, "count": 2}],
            "gain": 2.0
        })
    };
    let input = json!({"_type": "InputNode<double>", "id": "in", "size": 2});
    let graph = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [input, node("GainNode", "a"), node("LegacyGainNode", "b")]}),
    )
    .unwrap();
    let a = graph.get_node_as::<GainNode>(id("1")).unwrap();
    let b = graph.get_node_as::<GainNode>(id("2")).unwrap();
    assert_eq!(a, b);
    // Written back under the current tag.
    assert_eq!(graph.get_node(id("2")).unwrap().type_tag(), "GainNode");
}

#[test]
fn malformed_documents_are_rejected() {
    let registry = registry();
    let newer = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [{"_type": "InputNode<double>", "_version": 3, "id": "a", "size": 1}]}),
    );
    assert!(matches!(newer, Err(LoadError::Archive(ArchiveError::MalformedArchive { .. }))));

    let duplicate = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            {"_type": "InputNode<double>", "id": "a", "size": 1},
            {"_type": "InputNode<double>", "id": "a", "size": 1}
        ]}),
    );
    assert!(matches!(duplicate, Err(LoadError::Archive(ArchiveError::MalformedArchive { .. }))));

    let missing_field = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [{"_type": "InputNode<double>", "id": "a"}]}),
    );
    match missing_field {
        Err(LoadError::Archive(ArchiveError::MalformedArchive { path, .. })) => assert_eq!(path, "nodes[0].size"),
        other => panic!("unexpected result {:?}", other),
    }

    let wrong_root = read_json(&registry, json!({"_type": "Map", "_version": 1}));
    assert!(matches!(wrong_root, Err(LoadError::Archive(ArchiveError::MalformedArchive { .. }))));

    let not_json = read_graph(&registry, "{ nodes".as_bytes());
    assert!(matches!(not_json, Err(LoadError::Archive(ArchiveError::Document(_)))));
}

#[test]
fn out_of_range_reference_is_rejected_after_linking() {
    let registry = registry();
    let result = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            {"_type": "InputNode<double>", "id": "in", "size": 2},
            {"_type": "OutputNode<double>", "id": "out", "input": [{"node": "in", "port": 0, "start": 1, "count": 2}]}
        ]}),
    );
    assert!(matches!(result, Err(LoadError::Archive(ArchiveError::MalformedArchive { .. }))));
}

#[test]
fn overflowing_ranges_are_rejected() {
    let registry = registry();
    let input = json!({"_type": "InputNode<double>", "id": "in", "size": 2});
    let malformed_path = |result: Result<Graph, LoadError>| match result {
        Err(LoadError::Archive(ArchiveError::MalformedArchive { path, .. })) => path,
        other => panic!("unexpected result {:?}", other),
    };

    let wrapping_end = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input.clone(),
            {"_type": "OutputNode<double>", "id": "out", "input": [{"node": "in", "port": 0, "start": usize::MAX, "count": 2}]}
        ]}),
    );
    assert_eq!(malformed_path(wrapping_end), "nodes[1].input[0].count");

    let half = usize::MAX / 2 + 1;
    let wrapping_total = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input.clone(),
            {"_type": "OutputNode<double>", "id": "out", "input": [
                {"node": "in", "port": 0, "start": 0, "count": half},
                {"node": "in", "port": 0, "start": 0, "count": half}
            ]}
        ]}),
    );
    assert_eq!(malformed_path(wrapping_total), "nodes[1].input");

    let wrapping_slice = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input,
            {
                "_type": "SliceNode<double>",
                "id": "slice",
                "input": [{"node": "in", "port": 0, "start": 0, "count": 2}],
                "start": usize::MAX,
                "count": 1
            }
        ]}),
    );
    assert_eq!(malformed_path(wrapping_slice), "nodes[1].count");
}

#[test]
fn wrapping_range_fails_validation() {
    let mut graph = Graph::new();
    let input = graph.add_node(InputNode::<f64>::new(2));
    graph.add_node(OutputNode::<f64>::new(PortElements::from_range(PortRange::new(
        input,
        0,
        usize::MAX,
        2,
    ))));
    assert!(matches!(
        graph.validate(),
        Err(graph_archive::GraphError::RangeOutOfBounds { start: usize::MAX, size: 2, .. })
    ));
}

#[test]
fn one_registry_serves_concurrent_loads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TypeRegistry>();

    let registry = registry();
    let document = json!({"_type": "Model", "_version": 1, "nodes": [
        {"_type": "InputNode<double>", "id": "in", "size": 3},
        {"_type": "GainNode", "id": "gain", "input": [{"node": "in", "port": 0, "start": 0, "count": 3}], "gain": 0.5},
        {"_type": "OutputNode<double>", "id": "out", "input": [{"node": "gain", "port": 0, "start": 0, "count": 3}]}
    ]})
    .to_string();
    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| read_graph(&registry, document.as_bytes()).map(|x| x.len())))
            .collect();
        handles.into_iter().map(|x| x.join().unwrap().unwrap()).collect()
    });
    assert_eq!(counts, vec![3, 3]);
}
