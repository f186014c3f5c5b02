use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::dtype::Element;
use graph_archive::graph::ports::{InputPort, OutputPort};
use graph_archive::graph::{Node, TypeName};

/// Emits a fixed vector of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantNode<T: Element> {
    values: Vec<T>,
    output: OutputPort,
}

impl<T: Element> ConstantNode<T> {
    pub fn new(values: Vec<T>) -> Self {
        let output = OutputPort::new("output", T::DTYPE, values.len());
        Self { values, output }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Element> Default for ConstantNode<T> {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl<T: Element> TypeName for ConstantNode<T> {
    fn type_name() -> String {
        format!("ConstantNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for ConstantNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write("values", &self.values)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        *self = Self::new(unarchiver.read("values")?);
        Ok(())
    }
}

impl<T: Element> Node for ConstantNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}
