use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::dtype::Element;
use graph_archive::graph::ports::{InputPort, OutputPort, PortElements};
use graph_archive::graph::{Node, TypeName};
use std::marker::PhantomData;

/// Sums all elements of its input into a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct SumNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    _phantom: PhantomData<T>,
}

impl<T: Element> SumNode<T> {
    pub fn new(input: PortElements) -> Self {
        Self {
            input: InputPort::new("input", T::DTYPE, input),
            output: OutputPort::new("output", T::DTYPE, 1),
            _phantom: PhantomData,
        }
    }
}

impl<T: Element> Default for SumNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new())
    }
}

impl<T: Element> TypeName for SumNode<T> {
    fn type_name() -> String {
        format!("SumNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for SumNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        self.input.set_elements(unarchiver.read_port_elements("input")?);
        Ok(())
    }
}

impl<T: Element> Node for SumNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}

/// Inner product of two inputs of equal size.
#[derive(Debug, Clone, PartialEq)]
pub struct DotProductNode<T: Element> {
    a: InputPort,
    b: InputPort,
    output: OutputPort,
    _phantom: PhantomData<T>,
}

impl<T: Element> DotProductNode<T> {
    pub fn new(a: PortElements, b: PortElements) -> Self {
        Self {
            a: InputPort::new("input1", T::DTYPE, a),
            b: InputPort::new("input2", T::DTYPE, b),
            output: OutputPort::new("output", T::DTYPE, 1),
            _phantom: PhantomData,
        }
    }
}

impl<T: Element> Default for DotProductNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), PortElements::new())
    }
}

impl<T: Element> TypeName for DotProductNode<T> {
    fn type_name() -> String {
        format!("DotProductNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for DotProductNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input1", self.a.elements())?;
        archiver.write_port_elements("input2", self.b.elements())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        let a = unarchiver.read_port_elements("input1")?;
        let b = unarchiver.read_port_elements("input2")?;
        if a.size() != b.size() {
            return Err(ArchiveError::MalformedArchive {
                path: unarchiver.field_path("input2"),
                reason: format!("operand sizes differ: {} and {}", a.size(), b.size()),
            });
        }
        *self = Self::new(a, b);
        Ok(())
    }
}

impl<T: Element> Node for DotProductNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.a, &self.b]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}

/// Gathers its input elements into one output with a declared shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatenationNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    shape: Vec<usize>,
    _phantom: PhantomData<T>,
}

impl<T: Element> ConcatenationNode<T> {
    /// An empty `shape` means a flat vector the size of the input.
    pub fn new(input: PortElements, shape: Vec<usize>) -> Self {
        let size = input.size();
        let shape = if shape.is_empty() { vec![size] } else { shape };
        Self {
            input: InputPort::new("input", T::DTYPE, input),
            output: OutputPort::new("output", T::DTYPE, size),
            shape,
            _phantom: PhantomData,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

impl<T: Element> Default for ConcatenationNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), vec![])
    }
}

impl<T: Element> TypeName for ConcatenationNode<T> {
    fn type_name() -> String {
        format!("ConcatenationNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for ConcatenationNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())?;
        archiver.write("shape", &self.shape)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        let input = unarchiver.read_port_elements("input")?;
        let shape: Vec<usize> = unarchiver.read_optional("shape")?.unwrap_or_default();
        let holds = shape.iter().try_fold(1usize, |acc, x| acc.checked_mul(*x));
        if !shape.is_empty() && holds != Some(input.size()) {
            return Err(ArchiveError::MalformedArchive {
                path: unarchiver.field_path("shape"),
                reason: format!("shape {:?} does not hold {} elements", shape, input.size()),
            });
        }
        *self = Self::new(input, shape);
        Ok(())
    }
}

impl<T: Element> Node for ConcatenationNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}
