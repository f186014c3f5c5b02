use crate::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use crate::dtype::Element;
use crate::graph::ports::{InputPort, OutputPort};
use crate::graph::{InputNodeBase, Node, TypeName};
use std::marker::PhantomData;

/// Entry point of a graph: exposes `size` externally supplied elements.
#[derive(Debug, Clone, PartialEq)]
pub struct InputNode<T: Element> {
    output: OutputPort,
    _phantom: PhantomData<T>,
}

impl<T: Element> InputNode<T> {
    pub fn new(size: usize) -> Self {
        Self {
            output: OutputPort::new("output", T::DTYPE, size),
            _phantom: PhantomData,
        }
    }
}

impl<T: Element> Default for InputNode<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Element> TypeName for InputNode<T> {
    fn type_name() -> String {
        format!("InputNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for InputNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write("size", &self.output.size())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        self.output.set_size(unarchiver.read("size")?);
        Ok(())
    }
}

impl<T: Element> Node for InputNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }

    fn as_input_node(&self) -> Option<&dyn InputNodeBase> {
        Some(self)
    }
}

impl<T: Element> InputNodeBase for InputNode<T> {
    fn output(&self) -> &OutputPort {
        &self.output
    }
}
