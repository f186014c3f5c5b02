use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::dtype::Element;
use graph_archive::graph::ports::{InputPort, OutputPort, PortElements};
use graph_archive::graph::{Node, TypeName};
use std::marker::PhantomData;

/// Converts each element from `I` to `O`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCastNode<I: Element, O: Element> {
    input: InputPort,
    output: OutputPort,
    _phantom: PhantomData<(I, O)>,
}

impl<I: Element, O: Element> TypeCastNode<I, O> {
    pub fn new(input: PortElements) -> Self {
        let size = input.size();
        Self {
            input: InputPort::new("input", I::DTYPE, input),
            output: OutputPort::new("output", O::DTYPE, size),
            _phantom: PhantomData,
        }
    }
}

impl<I: Element, O: Element> Default for TypeCastNode<I, O> {
    fn default() -> Self {
        Self::new(PortElements::new())
    }
}

impl<I: Element, O: Element> TypeName for TypeCastNode<I, O> {
    fn type_name() -> String {
        format!("TypeCastNode<{},{}>", I::DTYPE.type_name(), O::DTYPE.type_name())
    }
}

impl<I: Element, O: Element> Archivable for TypeCastNode<I, O> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        *self = Self::new(unarchiver.read_port_elements("input")?);
        Ok(())
    }
}

impl<I: Element, O: Element> Node for TypeCastNode<I, O> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}
