use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::dtype::Element;
use graph_archive::graph::ports::{InputPort, OutputPort, PortElements};
use graph_archive::graph::{Node, TypeName};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumIter, Serialize, Deserialize)]
pub enum WhichBinaryOperation {
    #[default]
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumIter, Serialize, Deserialize)]
pub enum WhichUnaryOperation {
    #[default]
    Abs,
    Exp,
    Log,
    Neg,
    Sqrt,
    Square,
    Sin,
    Cos,
    Tanh,
    LogicalNot,
}

/// Element-wise operation on two inputs of equal size.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperationNode<T: Element> {
    a: InputPort,
    b: InputPort,
    output: OutputPort,
    which: WhichBinaryOperation,
    _phantom: PhantomData<T>,
}

impl<T: Element> BinaryOperationNode<T> {
    pub fn new(a: PortElements, b: PortElements, which: WhichBinaryOperation) -> Self {
        let size = a.size();
        Self {
            a: InputPort::new("input1", T::DTYPE, a),
            b: InputPort::new("input2", T::DTYPE, b),
            output: OutputPort::new("output", T::DTYPE, size),
            which,
            _phantom: PhantomData,
        }
    }

    pub fn which(&self) -> WhichBinaryOperation {
        self.which
    }
}

impl<T: Element> Default for BinaryOperationNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), PortElements::new(), WhichBinaryOperation::default())
    }
}

impl<T: Element> TypeName for BinaryOperationNode<T> {
    fn type_name() -> String {
        format!("BinaryOperationNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for BinaryOperationNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input1", self.a.elements())?;
        archiver.write_port_elements("input2", self.b.elements())?;
        archiver.write("operation", &self.which)
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
        *self = Self::new(a, b, unarchiver.read("operation")?);
        Ok(())
    }
}

impl<T: Element> Node for BinaryOperationNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.a, &self.b]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}

/// Element-wise operation on one input.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOperationNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    which: WhichUnaryOperation,
    _phantom: PhantomData<T>,
}

impl<T: Element> UnaryOperationNode<T> {
    pub fn new(input: PortElements, which: WhichUnaryOperation) -> Self {
        let size = input.size();
        Self {
            input: InputPort::new("input", T::DTYPE, input),
            output: OutputPort::new("output", T::DTYPE, size),
            which,
            _phantom: PhantomData,
        }
    }

    pub fn which(&self) -> WhichUnaryOperation {
        self.which
    }
}

impl<T: Element> Default for UnaryOperationNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), WhichUnaryOperation::default())
    }
}

impl<T: Element> TypeName for UnaryOperationNode<T> {
    fn type_name() -> String {
        format!("UnaryOperationNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for UnaryOperationNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())?;
        archiver.write("operation", &self.which)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        *self = Self::new(
            unarchiver.read_port_elements("input")?,
            unarchiver.read("operation")?,
        );
        Ok(())
    }
}

impl<T: Element> Node for UnaryOperationNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}
