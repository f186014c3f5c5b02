use graph_archive::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use graph_archive::dtype::{DType, Element};
use graph_archive::graph::ports::{InputPort, OutputPort, PortElements};
use graph_archive::graph::{Node, SampleBuffer, TypeName};
use std::marker::PhantomData;

/// Outputs its input as it was `window_size` steps ago.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    window_size: usize,
    _phantom: PhantomData<T>,
}

impl<T: Element> DelayNode<T> {
    pub fn new(input: PortElements, window_size: usize) -> Self {
        let size = input.size();
        Self {
            input: InputPort::new("input", T::DTYPE, input),
            output: OutputPort::new("output", T::DTYPE, size),
            window_size,
            _phantom: PhantomData,
        }
    }
}

impl<T: Element> Default for DelayNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), 1)
    }
}

impl<T: Element> TypeName for DelayNode<T> {
    fn type_name() -> String {
        format!("DelayNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for DelayNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())?;
        archiver.write("window_size", &self.window_size)
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        *self = Self::new(
            unarchiver.read_port_elements("input")?,
            unarchiver.read("window_size")?,
        );
        Ok(())
    }
}

impl<T: Element> Node for DelayNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }

    fn as_sample_buffer(&self) -> Option<&dyn SampleBuffer> {
        Some(self)
    }
}

impl<T: Element> SampleBuffer for DelayNode<T> {
    fn window_size(&self) -> usize {
        self.window_size
    }

    fn dtype(&self) -> DType {
        T::DTYPE
    }
}

/// Keeps the most recent `window_size` input elements, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    _phantom: PhantomData<T>,
}

impl<T: Element> BufferNode<T> {
    pub fn new(input: PortElements, window_size: usize) -> Self {
        Self {
            input: InputPort::new("input", T::DTYPE, input),
            output: OutputPort::new("output", T::DTYPE, window_size),
            _phantom: PhantomData,
        }
    }
}

impl<T: Element> Default for BufferNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), 0)
    }
}

impl<T: Element> TypeName for BufferNode<T> {
    fn type_name() -> String {
        format!("BufferNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for BufferNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())?;
        archiver.write("window_size", &self.output.size())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        let input = unarchiver.read_port_elements("input")?;
        let window_size: usize = unarchiver.read("window_size")?;
        if window_size < input.size() {
            return Err(ArchiveError::MalformedArchive {
                path: unarchiver.field_path("window_size"),
                reason: format!("window of {} cannot hold an input of {}", window_size, input.size()),
            });
        }
        *self = Self::new(input, window_size);
        Ok(())
    }
}

impl<T: Element> Node for BufferNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }

    fn as_sample_buffer(&self) -> Option<&dyn SampleBuffer> {
        Some(self)
    }
}

impl<T: Element> SampleBuffer for BufferNode<T> {
    fn window_size(&self) -> usize {
        self.output.size()
    }

    fn dtype(&self) -> DType {
        T::DTYPE
    }
}
