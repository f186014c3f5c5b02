use crate::archive::{ArchiveError, Archivable, ArchivedRange, ID_FIELD, TYPE_FIELD, VERSION_FIELD};
use crate::graph::NodeId;
use crate::graph::ports::PortElements;
use serde::Serialize;
use serde_json::{Map, Value};

/// Builds one archive record. Nested objects get their own child archiver.
#[derive(Debug)]
pub struct Archiver {
    record: Map<String, Value>,
    path: String,
}

impl Archiver {
    pub fn new_record(path: impl Into<String>, type_tag: &str, version: u32) -> Self {
        let mut record = Map::new();
        record.insert(TYPE_FIELD.to_string(), Value::String(type_tag.to_string()));
        record.insert(VERSION_FIELD.to_string(), Value::from(version));
        Self {
            record,
            path: path.into(),
        }
    }

    /// Record for `object`, with all of its fields written.
    pub fn archive_object<B: Archivable + ?Sized>(
        path: impl Into<String>,
        object: &B,
    ) -> Result<Self, ArchiveError> {
        let mut archiver = Self::new_record(path, &object.type_tag(), object.archive_version());
        object.archive(&mut archiver)?;
        Ok(archiver)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn field_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), ArchiveError> {
        let value = serde_json::to_value(value).map_err(|source| ArchiveError::Unserializable {
            path: self.field_path(name),
            source,
        })?;
        self.record.insert(name.to_string(), value);
        Ok(())
    }

    pub fn write_object<B: Archivable + ?Sized>(&mut self, name: &str, object: &B) -> Result<(), ArchiveError> {
        let child = Self::archive_object(self.field_path(name), object)?;
        self.record.insert(name.to_string(), child.into_value());
        Ok(())
    }

    pub fn write_objects<'b, B: Archivable + ?Sized + 'b>(
        &mut self,
        name: &str,
        objects: impl IntoIterator<Item = &'b B>,
    ) -> Result<(), ArchiveError> {
        let mut values = Vec::new();
        for (i, object) in objects.into_iter().enumerate() {
            let path = format!("{}[{}]", self.field_path(name), i);
            values.push(Self::archive_object(path, object)?.into_value());
        }
        self.record.insert(name.to_string(), Value::Array(values));
        Ok(())
    }

    pub fn write_node_id(&mut self, name: &str, id: NodeId) -> Result<(), ArchiveError> {
        self.write(name, &id.to_string())
    }

    pub fn write_node_ids(&mut self, name: &str, ids: &[NodeId]) -> Result<(), ArchiveError> {
        let ids: Vec<String> = ids.iter().map(|x| x.to_string()).collect();
        self.write(name, &ids)
    }

    pub fn write_port_elements(&mut self, name: &str, elements: &PortElements) -> Result<(), ArchiveError> {
        self.write(name, &archived_ranges(elements))
    }

    pub fn write_port_elements_list(&mut self, name: &str, list: &[&PortElements]) -> Result<(), ArchiveError> {
        let ranges: Vec<Vec<ArchivedRange>> = list.iter().map(|x| archived_ranges(x)).collect();
        self.write(name, &ranges)
    }

    pub(crate) fn write_id(&mut self, id: NodeId) -> Result<(), ArchiveError> {
        self.write_node_id(ID_FIELD, id)
    }

    pub(crate) fn write_value(&mut self, name: &str, value: Value) {
        self.record.insert(name.to_string(), value);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.record)
    }
}

fn archived_ranges(elements: &PortElements) -> Vec<ArchivedRange> {
    elements
        .ranges()
        .iter()
        .map(|x| ArchivedRange {
            node: x.node.to_string(),
            port: x.port,
            start: x.start,
            count: x.count,
        })
        .collect()
}
