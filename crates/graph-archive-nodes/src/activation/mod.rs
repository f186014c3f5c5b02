//! Activation layers. Activations are a polymorphic base of their own, so a
//! layer archives its activation as a nested record.
mod functions;

pub use functions::*;

use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::dtype::{DType, Element};
use graph_archive::graph::ports::{InputPort, OutputPort, PortElements};
use graph_archive::graph::{AsAny, Node, TypeName};
use graph_archive::registry::{Factory, RegistryError, TypeRegistry};
use std::fmt::Debug;
use std::marker::PhantomData;

pub trait Activation: Archivable + AsAny + Debug + Send + Sync {
    fn dtype(&self) -> DType;

    /// Input size this activation is tied to, if any.
    fn expected_size(&self) -> Option<usize> {
        None
    }
}

pub fn activation_factory<A: Activation + Default + 'static>() -> Factory<dyn Activation> {
    Factory::new::<A>(|| Box::new(A::default()))
}

pub fn add_activation_type<A: Activation + TypeName + Default + 'static>(
    registry: &mut TypeRegistry,
) -> Result<(), RegistryError> {
    registry.register(A::type_name(), activation_factory::<A>())
}

const ACTIVATION_NAMES: [&str; 6] = [
    "ReLUActivation",
    "LeakyReLUActivation",
    "SigmoidActivation",
    "HardSigmoidActivation",
    "TanhActivation",
    "ParametricReLUActivation",
];

/// Applies an activation to every element of its input.
#[derive(Debug)]
pub struct ActivationLayerNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    activation: Box<dyn Activation>,
    _phantom: PhantomData<T>,
}

impl<T: Element> ActivationLayerNode<T> {
    pub fn new(input: PortElements, activation: Box<dyn Activation>) -> Self {
        let size = input.size();
        Self {
            input: InputPort::new("input", T::DTYPE, input),
            output: OutputPort::new("output", T::DTYPE, size),
            activation,
            _phantom: PhantomData,
        }
    }

    pub fn activation(&self) -> &dyn Activation {
        self.activation.as_ref()
    }

    /// Tag of the activation named by a `ActivationLayerNode<T,XActivation>` tag.
    fn legacy_activation_tag(node_tag: &str) -> Option<String> {
        let (_, name) = node_tag
            .strip_prefix("ActivationLayerNode<")?
            .strip_suffix('>')?
            .split_once(',')?;
        Some(format!("{}<{}>", name.trim(), T::DTYPE.type_name()))
    }

    fn read_activation(unarchiver: &Unarchiver<'_>) -> Result<Box<dyn Activation>, ArchiveError> {
        if unarchiver.has("activation") {
            return unarchiver.read_object::<dyn Activation>("activation");
        }
        // Older records carry the activation in the node tag, with its fields inline.
        let node_tag = unarchiver.type_tag()?;
        let tag = Self::legacy_activation_tag(node_tag)
            .ok_or_else(|| ArchiveError::malformed(unarchiver.field_path("activation"), "missing required field"))?;
        let mut activation = unarchiver.instantiate_as::<dyn Activation>(&tag)?;
        activation.unarchive(unarchiver)?;
        log::debug!("Read activation {} from legacy tag {}", tag, node_tag);
        Ok(activation)
    }
}

impl<T: Element> Default for ActivationLayerNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), Box::new(ReLUActivation::<T>::new()))
    }
}

impl<T: Element> TypeName for ActivationLayerNode<T> {
    fn type_name() -> String {
        format!("ActivationLayerNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for ActivationLayerNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    /// Version 1 nests the activation as its own record.
    fn archive_version(&self) -> u32 {
        1
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())?;
        archiver.write_object("activation", self.activation.as_ref())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        let input = unarchiver.read_port_elements("input")?;
        let activation = Self::read_activation(unarchiver)?;
        if activation.dtype() != T::DTYPE {
            return Err(ArchiveError::malformed(
                unarchiver.field_path("activation"),
                format!("activation {} does not operate on {}", activation.type_tag(), T::DTYPE),
            ));
        }
        if let Some(expected) = activation.expected_size() {
            if expected != input.size() {
                return Err(ArchiveError::malformed(
                    unarchiver.field_path("activation"),
                    format!("activation expects {} elements, input has {}", expected, input.size()),
                ));
            }
        }
        *self = Self::new(input, activation);
        Ok(())
    }
}

impl<T: Element> Node for ActivationLayerNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}

/// Registers the activations, the layer node and its legacy tags for `T`.
pub fn register_activation_types<T: Element>(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    add_activation_type::<ReLUActivation<T>>(registry)?;
    add_activation_type::<LeakyReLUActivation<T>>(registry)?;
    add_activation_type::<SigmoidActivation<T>>(registry)?;
    add_activation_type::<HardSigmoidActivation<T>>(registry)?;
    add_activation_type::<TanhActivation<T>>(registry)?;
    add_activation_type::<ParametricReLUActivation<T>>(registry)?;

    registry.add_node_type::<ActivationLayerNode<T>>()?;
    for name in ACTIVATION_NAMES {
        registry.add_node_alias::<ActivationLayerNode<T>>(format!(
            "ActivationLayerNode<{},{}>",
            T::DTYPE.type_name(),
            name
        ))?;
    }
    Ok(())
}
