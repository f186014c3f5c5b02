use crate::archive::{ArchiveError, Archivable, ArchivedRange, ID_FIELD, TYPE_FIELD, VERSION_FIELD};
use crate::graph::NodeId;
use crate::graph::ports::{PortElements, PortRange};
use crate::registry::TypeRegistry;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Archived node id -> node handle, valid for a single unarchive pass.
pub type NodeIdTable = HashMap<String, NodeId>;

/// Reads fields out of one archive record.
#[derive(Clone, Copy)]
pub struct Unarchiver<'a> {
    registry: &'a TypeRegistry,
    record: &'a Map<String, Value>,
    node_ids: Option<&'a NodeIdTable>,
    path: &'a str,
}

impl<'a> Unarchiver<'a> {
    pub fn new(registry: &'a TypeRegistry, value: &'a Value, path: &'a str) -> Result<Self, ArchiveError> {
        let record = value
            .as_object()
            .ok_or_else(|| ArchiveError::malformed(path, "expected an object record"))?;
        Ok(Self {
            registry,
            record,
            node_ids: None,
            path,
        })
    }

    pub fn with_node_ids<'b>(self, node_ids: &'b NodeIdTable) -> Unarchiver<'b>
    where
        'a: 'b,
    {
        Unarchiver {
            registry: self.registry,
            record: self.record,
            node_ids: Some(node_ids),
            path: self.path,
        }
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn field_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.record.contains_key(name)
    }

    fn field(&self, name: &str) -> Result<&'a Value, ArchiveError> {
        self.record
            .get(name)
            .ok_or_else(|| ArchiveError::malformed(self.field_path(name), "missing required field"))
    }

    pub fn type_tag(&self) -> Result<&'a str, ArchiveError> {
        self.field(TYPE_FIELD)?
            .as_str()
            .ok_or_else(|| ArchiveError::malformed(self.field_path(TYPE_FIELD), "type tag must be a string"))
    }

    /// Missing versions read as 0.
    pub fn archived_version(&self) -> Result<u32, ArchiveError> {
        if self.has(VERSION_FIELD) {
            self.read(VERSION_FIELD)
        } else {
            Ok(0)
        }
    }

    /// The archived `id` of this record.
    pub fn archived_id(&self) -> Result<String, ArchiveError> {
        let value = self.field(ID_FIELD)?;
        match value {
            Value::String(x) => Ok(x.clone()),
            Value::Number(x) => Ok(x.to_string()),
            _ => Err(ArchiveError::malformed(self.field_path(ID_FIELD), "id must be a string or number")),
        }
    }

    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArchiveError> {
        let value = self.field(name)?;
        T::deserialize(value).map_err(|e| ArchiveError::malformed(self.field_path(name), e.to_string()))
    }

    pub fn read_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ArchiveError> {
        match self.record.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.read(name).map(Some),
        }
    }

    /// Runs `f` on an unarchiver for the nested record `name`.
    pub fn with_child<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Unarchiver<'_>) -> Result<T, ArchiveError>,
    ) -> Result<T, ArchiveError> {
        let path = self.field_path(name);
        let mut child = Unarchiver::new(self.registry, self.field(name)?, &path)?;
        child.node_ids = self.node_ids;
        f(&child)
    }

    /// Runs `f` on an unarchiver for each record of the array `name`.
    pub fn with_children<T>(
        &self,
        name: &str,
        mut f: impl FnMut(usize, &Unarchiver<'_>) -> Result<T, ArchiveError>,
    ) -> Result<Vec<T>, ArchiveError> {
        let items = self
            .field(name)?
            .as_array()
            .ok_or_else(|| ArchiveError::malformed(self.field_path(name), "expected an array"))?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let path = format!("{}[{}]", self.field_path(name), i);
            let mut child = Unarchiver::new(self.registry, item, &path)?;
            child.node_ids = self.node_ids;
            out.push(f(i, &child)?);
        }
        Ok(out)
    }

    /// Builds a blank instance of the concrete type this record names,
    /// looked up under base `B`.
    pub fn instantiate<B: Archivable + ?Sized + 'static>(&self) -> Result<Box<B>, ArchiveError> {
        self.instantiate_as::<B>(self.type_tag()?)
    }

    /// Like `instantiate`, but for a type named by `tag` instead of this
    /// record's `_type`. The record's `_version` still applies.
    pub fn instantiate_as<B: Archivable + ?Sized + 'static>(&self, tag: &str) -> Result<Box<B>, ArchiveError> {
        let object = self
            .registry
            .create::<B>(tag)
            .map_err(|e| ArchiveError::from_registry(self.path, e))?;
        let version = self.archived_version()?;
        if version > object.archive_version() {
            return Err(ArchiveError::malformed(
                self.field_path(VERSION_FIELD),
                format!(
                    "version {} of \"{}\" is newer than supported version {}",
                    version,
                    tag,
                    object.archive_version()
                ),
            ));
        }
        Ok(object)
    }

    /// Instantiates and fills this record as a `B`.
    pub fn read_self<B: Archivable + ?Sized + 'static>(&self) -> Result<Box<B>, ArchiveError> {
        let mut object = self.instantiate::<B>()?;
        object.unarchive(self)?;
        Ok(object)
    }

    pub fn read_object<B: Archivable + ?Sized + 'static>(&self, name: &str) -> Result<Box<B>, ArchiveError> {
        self.with_child(name, |child| child.read_self::<B>())
    }

    pub fn read_objects<B: Archivable + ?Sized + 'static>(&self, name: &str) -> Result<Vec<Box<B>>, ArchiveError> {
        self.with_children(name, |_, child| child.read_self::<B>())
    }

    fn resolve_node(&self, id: &str, path: String) -> Result<NodeId, ArchiveError> {
        let table = self.node_ids.ok_or_else(|| {
            ArchiveError::malformed(path.clone(), "node references are only valid inside a model")
        })?;
        table
            .get(id)
            .copied()
            .ok_or_else(|| ArchiveError::DanglingReference {
                path,
                id: id.to_string(),
            })
    }

    pub fn read_node_id(&self, name: &str) -> Result<NodeId, ArchiveError> {
        let id: String = self.read(name)?;
        self.resolve_node(&id, self.field_path(name))
    }

    pub fn read_node_ids(&self, name: &str) -> Result<Vec<NodeId>, ArchiveError> {
        let ids: Vec<String> = self.read(name)?;
        ids.iter()
            .enumerate()
            .map(|(i, id)| self.resolve_node(id, format!("{}[{}]", self.field_path(name), i)))
            .collect()
    }

    fn resolve_ranges(&self, ranges: &[ArchivedRange], path: &str) -> Result<PortElements, ArchiveError> {
        let mut elements = PortElements::new();
        for (i, range) in ranges.iter().enumerate() {
            let node = self.resolve_node(&range.node, format!("{}[{}].node", path, i))?;
            let range = PortRange::new(node, range.port, range.start, range.count);
            if range.end().is_none() {
                return Err(ArchiveError::malformed(
                    format!("{}[{}].count", path, i),
                    format!("range starting at {} with {} elements overflows", range.start, range.count),
                ));
            }
            elements.push(range);
        }
        if elements.checked_size().is_none() {
            return Err(ArchiveError::malformed(path, "total element count overflows"));
        }
        Ok(elements)
    }

    pub fn read_port_elements(&self, name: &str) -> Result<PortElements, ArchiveError> {
        let ranges: Vec<ArchivedRange> = self.read(name)?;
        self.resolve_ranges(&ranges, &self.field_path(name))
    }

    pub fn read_port_elements_list(&self, name: &str) -> Result<Vec<PortElements>, ArchiveError> {
        let list: Vec<Vec<ArchivedRange>> = self.read(name)?;
        list.iter()
            .enumerate()
            .map(|(i, ranges)| self.resolve_ranges(ranges, &format!("{}[{}]", self.field_path(name), i)))
            .collect()
    }
}
