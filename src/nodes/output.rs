use crate::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use crate::dtype::Element;
use crate::graph::ports::{InputPort, OutputPort, PortElements};
use crate::graph::{Node, OutputNodeBase, TypeName};
use std::marker::PhantomData;

/// Marks the elements it reads as a result of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    _phantom: PhantomData<T>,
}

impl<T: Element> OutputNode<T> {
    pub fn new(elements: PortElements) -> Self {
        let size = elements.size();
        Self {
            input: InputPort::new("input", T::DTYPE, elements),
            output: OutputPort::new("output", T::DTYPE, size),
            _phantom: PhantomData,
        }
    }
}

impl<T: Element> Default for OutputNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new())
    }
}

impl<T: Element> TypeName for OutputNode<T> {
    fn type_name() -> String {
        format!("OutputNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for OutputNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        let elements = unarchiver.read_port_elements("input")?;
        self.output.set_size(elements.size());
        self.input.set_elements(elements);
        Ok(())
    }
}

impl<T: Element> Node for OutputNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }

    fn as_output_node(&self) -> Option<&dyn OutputNodeBase> {
        Some(self)
    }
}

impl<T: Element> OutputNodeBase for OutputNode<T> {
    fn input(&self) -> &InputPort {
        &self.input
    }

    fn output(&self) -> &OutputPort {
        &self.output
    }
}
