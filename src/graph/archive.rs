use crate::archive::{ArchiveError, Archivable, Archiver, NodeIdTable, Unarchiver, expect_record};
use crate::graph::{Graph, GraphError, Node, NodeId};
use serde_json::Value;

pub const GRAPH_TYPE_TAG: &str = "Model";
pub const GRAPH_ARCHIVE_VERSION: u32 = 1;

impl Graph {
    /// Writes every node as a record in a `nodes` array. Cross-references are
    /// written as node ids, never as nested copies.
    pub fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError> {
        let nodes_path = if archiver.path().is_empty() {
            "nodes".to_string()
        } else {
            format!("{}.nodes", archiver.path())
        };
        let mut records = Vec::with_capacity(self.len());
        for (id, node) in self.iter() {
            let mut record = Archiver::new_record(
                format!("{}[{}]", nodes_path, id),
                &node.type_tag(),
                node.archive_version(),
            );
            record.write_id(id)?;
            node.archive(&mut record)?;
            records.push(record.into_value());
        }
        archiver.write_value("nodes", Value::Array(records));
        Ok(())
    }

    pub fn to_archive(&self) -> Result<Archiver, ArchiveError> {
        let mut archiver = Archiver::new_record("", GRAPH_TYPE_TAG, GRAPH_ARCHIVE_VERSION);
        self.archive(&mut archiver)?;
        Ok(archiver)
    }

    pub fn unarchive(unarchiver: &Unarchiver<'_>) -> Result<Self, ArchiveError> {
        Ok(Self::unarchive_with_ids(unarchiver)?.0)
    }

    /// Rebuilds a graph and also returns the archived-id table, for records
    /// (such as maps) that refer into the graph from outside it.
    pub fn unarchive_with_ids(unarchiver: &Unarchiver<'_>) -> Result<(Self, NodeIdTable), ArchiveError> {
        expect_record(unarchiver, GRAPH_TYPE_TAG, GRAPH_ARCHIVE_VERSION)?;

        // Allocate every node blank, in document order.
        let mut graph = Graph::new();
        let mut ids = NodeIdTable::new();
        unarchiver.with_children("nodes", |_, record| {
            let node = record.instantiate::<dyn Node>()?;
            let archived_id = record.archived_id()?;
            let id = graph.add_boxed_node(node);
            if ids.insert(archived_id.clone(), id).is_some() {
                return Err(ArchiveError::MalformedArchive {
                    path: record.field_path("id"),
                    reason: format!("duplicate node id \"{}\"", archived_id),
                });
            }
            Ok(())
        })?;

        // Fill in fields, resolving references against the complete table.
        let linked = unarchiver.with_node_ids(&ids);
        linked.with_children("nodes", |i, record| {
            let node = graph
                .get_node_mut(NodeId(i))
                .ok_or_else(|| ArchiveError::malformed(record.path(), "node vanished between passes"))?;
            node.unarchive(record)?;
            log::debug!("Unarchived {} as node {}", record.type_tag()?, i);
            Ok(())
        })?;

        graph
            .validate()
            .map_err(|e| graph_error_to_archive_error(unarchiver, &ids, e))?;
        log::debug!("Unarchived model with {} nodes", graph.len());
        Ok((graph, ids))
    }
}

fn graph_error_to_archive_error(unarchiver: &Unarchiver<'_>, ids: &NodeIdTable, err: GraphError) -> ArchiveError {
    let archived_id = |target: NodeId| {
        ids.iter()
            .find(|(_, id)| **id == target)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| target.to_string())
    };
    match err {
        GraphError::DanglingReference { node, referenced } => ArchiveError::DanglingReference {
            path: format!("{}[{}]", unarchiver.field_path("nodes"), node),
            id: archived_id(referenced),
        },
        GraphError::MissingPort { node, .. }
        | GraphError::RangeOutOfBounds { node, .. }
        | GraphError::TypeMismatch { node, .. } => ArchiveError::MalformedArchive {
            path: format!("{}[{}]", unarchiver.field_path("nodes"), node),
            reason: err.to_string(),
        },
    }
}
