mod input;
mod output;
mod slice;
mod splice;

pub use input::*;
pub use output::*;
pub use slice::*;
pub use splice::*;

use crate::dtype::Element;
use crate::registry::{RegistryError, TypeRegistry};

fn register_core_types_for<T: Element>(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    registry.add_node_type::<InputNode<T>>()?;
    registry.add_node_type::<OutputNode<T>>()?;
    registry.add_node_type::<SliceNode<T>>()?;
    registry.add_node_type::<SpliceNode<T>>()?;
    Ok(())
}

/// Registers the model-level nodes for every element type.
pub fn register_core_types(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    register_core_types_for::<f64>(registry)?;
    register_core_types_for::<f32>(registry)?;
    register_core_types_for::<i64>(registry)?;
    register_core_types_for::<i32>(registry)?;
    register_core_types_for::<bool>(registry)?;
    Ok(())
}
