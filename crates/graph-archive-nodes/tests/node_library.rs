use graph_archive::archive::ArchiveError;
use graph_archive::graph::{Graph, NodeId};
use graph_archive::nodes::{InputNode, OutputNode};
use graph_archive::{Archivable, LoadError, TypeRegistry, read_graph, write_graph};
use graph_archive_nodes::*;
use serde_json::json;
use std::sync::Once;

static INIT: Once = Once::new();

fn registry() -> TypeRegistry {
    INIT.call_once(|| {
        env_logger::init();
    });
    let mut registry = TypeRegistry::new();
    register_node_types(&mut registry).unwrap();
    registry
}

fn id(text: &str) -> NodeId {
    text.parse().unwrap()
}

fn read_json(registry: &TypeRegistry, document: serde_json::Value) -> Result<Graph, LoadError> {
    read_graph(registry, document.to_string().as_bytes())
}

#[test]
fn registration_is_repeatable() {
    let mut registry = registry();
    let count = registry.len();
    register_node_types(&mut registry).unwrap();
    assert_eq!(registry.len(), count);
    assert!(registry.contains::<dyn graph_archive::Node>("TypeCastNode<int,double>"));
    assert!(registry.contains::<dyn graph_archive::Node>("ActivationLayerNode<float,HardSigmoidActivation>"));
    assert!(registry.contains::<dyn Activation>("ParametricReLUActivation<double>"));
}

#[test]
fn library_graph_round_trips() {
    let registry = registry();
    let mut graph = Graph::new();
    let input = graph.add_node(InputNode::<f64>::new(3));
    let x = graph.port_elements(input, 0).unwrap();
    let constant = graph.add_node(ConstantNode::<f64>::new(vec![1.0, 2.0, 3.0]));
    let c = graph.port_elements(constant, 0).unwrap();
    let product = graph.add_node(BinaryOperationNode::<f64>::new(x.clone(), c.clone(), WhichBinaryOperation::Mul));
    let dot = graph.add_node(DotProductNode::<f64>::new(x.clone(), c));
    let layer = graph.add_node(ActivationLayerNode::<f64>::new(
        graph.port_elements(product, 0).unwrap(),
        Box::new(LeakyReLUActivation::<f64>::new(0.25)),
    ));
    let buffer = graph.add_node(BufferNode::<f64>::new(graph.port_elements(layer, 0).unwrap(), 12));
    let delay = graph.add_node(DelayNode::<f64>::new(graph.port_elements(dot, 0).unwrap(), 4));
    let cast = graph.add_node(TypeCastNode::<f64, f32>::new(graph.port_elements(delay, 0).unwrap()));
    let exp = graph.add_node(UnaryOperationNode::<f32>::new(
        graph.port_elements(cast, 0).unwrap(),
        WhichUnaryOperation::Exp,
    ));
    graph.add_node(OutputNode::<f32>::new(graph.port_elements(exp, 0).unwrap()));
    graph.add_node(OutputNode::<f64>::new(graph.port_elements(buffer, 0).unwrap()));
    graph.validate().unwrap();

    let mut buffer_bytes = Vec::new();
    write_graph(&graph, &mut buffer_bytes).unwrap();
    let loaded = read_graph(&registry, buffer_bytes.as_slice()).unwrap();

    assert_eq!(loaded.len(), graph.len());
    for ((_, a), (_, b)) in graph.iter().zip(loaded.iter()) {
        assert_eq!(a.type_tag(), b.type_tag());
    }
    assert_eq!(
        loaded.get_node_as::<ConstantNode<f64>>(constant).unwrap().values(),
        &[1.0, 2.0, 3.0]
    );
    assert_eq!(
        loaded.get_node_as::<BinaryOperationNode<f64>>(product).unwrap().which(),
        WhichBinaryOperation::Mul
    );
    let activation = loaded.get_node_as::<ActivationLayerNode<f64>>(layer).unwrap().activation();
    assert_eq!(
        activation.as_any().downcast_ref::<LeakyReLUActivation<f64>>().unwrap().alpha(),
        0.25
    );
    let buffers: Vec<_> = loaded.sample_buffers().map(|(id, x)| (id, x.window_size())).collect();
    assert_eq!(buffers, vec![(buffer, 12), (delay, 4)]);
    assert_eq!(loaded.output_port(cast, 0).unwrap().dtype(), graph_archive::dtype::DType::F32);
    assert_eq!(loaded.output_nodes().count(), 2);
}

#[test]
fn legacy_activation_layers_load_as_current_layers() {
    let registry = registry();
    let input = json!({"_type": "InputNode<double>", "id": "in", "size": 2});
    let range = json!([{"node": "in", "port": 0, "start": 0, "count": 2}]);
    let graph = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input,
            {"_type": "ActivationLayerNode<double,LeakyReLUActivation>", "id": "old", "input": range, "alpha": 0.1},
            {
                "_type": "ActivationLayerNode<double>",
                "id": "new",
                "input": range,
                "activation": {"_type": "LeakyReLUActivation<double>", "_version": 0, "alpha": 0.1}
            }
        ]}),
    )
    .unwrap();
    let alpha = |node: NodeId| {
        graph
            .get_node_as::<ActivationLayerNode<f64>>(node)
            .unwrap()
            .activation()
            .as_any()
            .downcast_ref::<LeakyReLUActivation<f64>>()
            .unwrap()
            .alpha()
    };
    assert_eq!(alpha(id("1")), 0.1);
    assert_eq!(alpha(id("2")), 0.1);
    assert_eq!(graph.get_node(id("1")).unwrap().type_tag(), "ActivationLayerNode<double>");
}

#[test]
fn inconsistent_records_are_rejected() {
    let registry = registry();
    let input = json!({"_type": "InputNode<double>", "id": "in", "size": 2});
    let two = json!([{"node": "in", "port": 0, "start": 0, "count": 2}]);
    let one = json!([{"node": "in", "port": 0, "start": 0, "count": 1}]);

    let mismatched_operands = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input.clone(),
            {"_type": "BinaryOperationNode<double>", "id": "op", "input1": two, "input2": one, "operation": "Add"}
        ]}),
    );
    assert!(matches!(
        mismatched_operands,
        Err(LoadError::Archive(ArchiveError::MalformedArchive { .. }))
    ));

    let short_alpha = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input.clone(),
            {
                "_type": "ActivationLayerNode<double>",
                "id": "act",
                "input": two,
                "activation": {"_type": "ParametricReLUActivation<double>", "alpha": [0.5]}
            }
        ]}),
    );
    assert!(matches!(short_alpha, Err(LoadError::Archive(ArchiveError::MalformedArchive { .. }))));

    let unknown_activation = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input,
            {"_type": "ActivationLayerNode<double>", "id": "act", "input": two, "activation": {"_type": "SwishActivation<double>"}}
        ]}),
    );
    match unknown_activation {
        Err(LoadError::Archive(ArchiveError::UnknownType { tag, path, .. })) => {
            assert_eq!(tag, "SwishActivation<double>");
            assert_eq!(path, "nodes[1].activation");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn legacy_activation_fields_honor_the_record_version() {
    let registry = registry();
    let input = json!({"_type": "InputNode<double>", "id": "in", "size": 2});
    let range = json!([{"node": "in", "port": 0, "start": 0, "count": 2}]);
    let result = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            input,
            {"_type": "ActivationLayerNode<double,LeakyReLUActivation>", "_version": 1, "id": "old", "input": range, "alpha": 0.1}
        ]}),
    );
    match result {
        Err(LoadError::Archive(ArchiveError::MalformedArchive { path, reason })) => {
            assert_eq!(path, "nodes[1]._version");
            assert!(reason.contains("LeakyReLUActivation<double>"), "{}", reason);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn overflowing_concatenation_shape_is_rejected() {
    let registry = registry();
    let result = read_json(
        &registry,
        json!({"_type": "Model", "_version": 1, "nodes": [
            {"_type": "InputNode<double>", "id": "in", "size": 2},
            {
                "_type": "ConcatenationNode<double>",
                "id": "cat",
                "input": [{"node": "in", "port": 0, "start": 0, "count": 2}],
                "shape": [usize::MAX, 2]
            }
        ]}),
    );
    match result {
        Err(LoadError::Archive(ArchiveError::MalformedArchive { path, .. })) => assert_eq!(path, "nodes[1].shape"),
        other => panic!("unexpected result {:?}", other),
    }
}
