use crate::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use crate::dtype::Element;
use crate::graph::ports::{InputPort, OutputPort, PortElements};
use crate::graph::{Node, TypeName};
use std::marker::PhantomData;

/// Concatenates several inputs into one output.
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceNode<T: Element> {
    inputs: Vec<InputPort>,
    output: OutputPort,
    _phantom: PhantomData<T>,
}

impl<T: Element> SpliceNode<T> {
    pub fn new(inputs: impl IntoIterator<Item = PortElements>) -> Self {
        let inputs: Vec<_> = inputs
            .into_iter()
            .map(|x| InputPort::new("input", T::DTYPE, x))
            .collect();
        let size = inputs.iter().map(|x| x.size()).sum();
        Self {
            inputs,
            output: OutputPort::new("output", T::DTYPE, size),
            _phantom: PhantomData,
        }
    }
}

impl<T: Element> Default for SpliceNode<T> {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl<T: Element> TypeName for SpliceNode<T> {
    fn type_name() -> String {
        format!("SpliceNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for SpliceNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        let inputs: Vec<_> = self.inputs.iter().map(|x| x.elements()).collect();
        archiver.write_port_elements_list("inputs", &inputs)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        *self = Self::new(unarchiver.read_port_elements_list("inputs")?);
        Ok(())
    }
}

impl<T: Element> Node for SpliceNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        self.inputs.iter().collect()
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}
