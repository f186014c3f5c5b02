use crate::archive::{ArchiveError, Archivable, Archiver, Unarchiver};
use crate::dtype::Element;
use crate::graph::ports::{InputPort, OutputPort, PortElements};
use crate::graph::{Node, TypeName};
use std::marker::PhantomData;

/// Selects `count` consecutive elements of its input, starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceNode<T: Element> {
    input: InputPort,
    output: OutputPort,
    start: usize,
    _phantom: PhantomData<T>,
}

impl<T: Element> SliceNode<T> {
    pub fn new(elements: PortElements, start: usize, count: usize) -> Self {
        Self {
            input: InputPort::new("input", T::DTYPE, elements),
            output: OutputPort::new("output", T::DTYPE, count),
            start,
            _phantom: PhantomData,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn count(&self) -> usize {
        self.output.size()
    }
}

impl<T: Element> Default for SliceNode<T> {
    fn default() -> Self {
        Self::new(PortElements::new(), 0, 0)
    }
}

impl<T: Element> TypeName for SliceNode<T> {
    fn type_name() -> String {
        format!("SliceNode<{}>", T::DTYPE.type_name())
    }
}

impl<T: Element> Archivable for SliceNode<T> {
    fn type_tag(&self) -> String {
        Self::type_name()
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        archiver.write_port_elements("input", self.input.elements())?;
        archiver.write("start", &self.start)?;
        archiver.write("count", &self.count())
    }

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError> {
        let elements = unarchiver.read_port_elements("input")?;
        let start: usize = unarchiver.read("start")?;
        let count: usize = unarchiver.read("count")?;
        match start.checked_add(count) {
            Some(end) if end <= elements.size() => {}
            _ => {
                return Err(ArchiveError::MalformedArchive {
                    path: unarchiver.field_path("count"),
                    reason: format!(
                        "slice of {} elements at {} exceeds input of size {}",
                        count,
                        start,
                        elements.size()
                    ),
                });
            }
        }
        *self = Self::new(elements, start, count);
        Ok(())
    }
}

impl<T: Element> Node for SliceNode<T> {
    fn input_ports(&self) -> Vec<&InputPort> {
        vec![&self.input]
    }

    fn output_ports(&self) -> Vec<&OutputPort> {
        vec![&self.output]
    }
}
