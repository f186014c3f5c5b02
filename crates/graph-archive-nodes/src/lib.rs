//! Concrete node library for `graph-archive` models.
pub mod activation;
mod buffer;
mod constant;
mod operations;
mod reduce;
mod type_cast;

pub use activation::{
    Activation, ActivationLayerNode, HardSigmoidActivation, LeakyReLUActivation, ParametricReLUActivation,
    ReLUActivation, SigmoidActivation, TanhActivation,
};
pub use buffer::*;
pub use constant::*;
pub use operations::*;
pub use reduce::*;
pub use type_cast::*;

use graph_archive::dtype::Element;
use graph_archive::registry::{RegistryError, TypeRegistry};

fn register_common_types<T: Element>(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    registry.add_node_type::<ConstantNode<T>>()?;
    registry.add_node_type::<ConcatenationNode<T>>()?;
    registry.add_node_type::<DelayNode<T>>()?;
    registry.add_node_type::<BufferNode<T>>()?;
    registry.add_node_type::<BinaryOperationNode<T>>()?;
    Ok(())
}

fn register_numeric_types<T: Element>(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    register_common_types::<T>(registry)?;
    registry.add_node_type::<UnaryOperationNode<T>>()?;
    registry.add_node_type::<SumNode<T>>()?;
    registry.add_node_type::<DotProductNode<T>>()?;
    Ok(())
}

fn register_casts_from<I: Element>(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    registry.add_node_type::<TypeCastNode<I, f64>>()?;
    registry.add_node_type::<TypeCastNode<I, f32>>()?;
    registry.add_node_type::<TypeCastNode<I, i64>>()?;
    registry.add_node_type::<TypeCastNode<I, i32>>()?;
    registry.add_node_type::<TypeCastNode<I, bool>>()?;
    Ok(())
}

/// Registers every node and activation type of this library, along with the
/// core model nodes and legacy tags.
pub fn register_node_types(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    graph_archive::register_core_types(registry)?;

    register_numeric_types::<f64>(registry)?;
    register_numeric_types::<f32>(registry)?;
    register_numeric_types::<i64>(registry)?;
    register_numeric_types::<i32>(registry)?;
    register_common_types::<bool>(registry)?;
    registry.add_node_type::<UnaryOperationNode<bool>>()?;

    register_casts_from::<f64>(registry)?;
    register_casts_from::<f32>(registry)?;
    register_casts_from::<i64>(registry)?;
    register_casts_from::<i32>(registry)?;
    register_casts_from::<bool>(registry)?;

    activation::register_activation_types::<f64>(registry)?;
    activation::register_activation_types::<f32>(registry)?;
    log::debug!("Registered {} types", registry.len());
    Ok(())
}
