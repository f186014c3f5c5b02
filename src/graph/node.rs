use crate::archive::Archivable;
use crate::dtype::DType;
use crate::graph::ports::{InputPort, OutputPort};
use crate::registry::{Factory, RegistryError, TypeRegistry};
use std::any::Any;
use std::fmt::Debug;

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Static counterpart of `Archivable::type_tag`, used when registering.
pub trait TypeName {
    fn type_name() -> String;
}

/// A unit of a computation graph with typed input and output ports.
pub trait Node: Archivable + AsAny + Debug + Send + Sync {
    fn input_ports(&self) -> Vec<&InputPort>;
    fn output_ports(&self) -> Vec<&OutputPort>;

    fn as_input_node(&self) -> Option<&dyn InputNodeBase> {
        None
    }
    fn as_output_node(&self) -> Option<&dyn OutputNodeBase> {
        None
    }
    fn as_sample_buffer(&self) -> Option<&dyn SampleBuffer> {
        None
    }
}

/// Capability of nodes that feed external data into a graph.
pub trait InputNodeBase: Debug {
    fn output(&self) -> &OutputPort;

    fn size(&self) -> usize {
        self.output().size()
    }
    fn dtype(&self) -> DType {
        self.output().dtype()
    }
}

/// Capability of nodes that mark a graph result.
pub trait OutputNodeBase: Debug {
    fn input(&self) -> &InputPort;
    fn output(&self) -> &OutputPort;

    fn size(&self) -> usize {
        self.output().size()
    }
    fn dtype(&self) -> DType {
        self.output().dtype()
    }
}

/// Capability of nodes that keep a sliding window of past samples.
pub trait SampleBuffer: Debug {
    fn window_size(&self) -> usize;
    fn dtype(&self) -> DType;
}

pub fn node_factory<N: Node + Default + 'static>() -> Factory<dyn Node> {
    Factory::new::<N>(|| Box::new(N::default()))
}

impl TypeRegistry {
    /// Registers `N` under its own type name for the `dyn Node` base.
    pub fn add_node_type<N: Node + TypeName + Default + 'static>(
        &mut self,
    ) -> Result<(), RegistryError> {
        self.register(N::type_name(), node_factory::<N>())
    }

    /// Registers `N` under an additional, usually historical, tag.
    pub fn add_node_alias<N: Node + Default + 'static>(
        &mut self,
        alias: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.register(alias, node_factory::<N>())
    }
}
