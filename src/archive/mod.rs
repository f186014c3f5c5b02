//! Self-describing JSON archives of polymorphic object graphs.
//!
//! Every polymorphic record is a JSON object carrying `_type` (the type tag
//! looked up in the [`TypeRegistry`](crate::registry::TypeRegistry)) and
//! `_version`, next to its own named fields. Node records also carry an `id`
//! that sibling records use to refer to their outputs.
mod archiver;
mod unarchiver;

pub use archiver::Archiver;
pub use unarchiver::{NodeIdTable, Unarchiver};

use crate::registry::RegistryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};

pub const TYPE_FIELD: &str = "_type";
pub const VERSION_FIELD: &str = "_version";
pub const ID_FIELD: &str = "id";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Malformed archive at \"{path}\": {reason}")]
    MalformedArchive { path: String, reason: String },
    #[error("Unknown type \"{tag}\" for base {base} at \"{path}\"")]
    UnknownType {
        path: String,
        base: &'static str,
        tag: String,
    },
    #[error("Dangling reference to node \"{id}\" at \"{path}\"")]
    DanglingReference { path: String, id: String },
    #[error("Unable to serialize field \"{path}\"")]
    Unserializable {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unable to parse archive document")]
    Document(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ArchiveError::MalformedArchive {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn from_registry(path: impl Into<String>, err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownType { base, tag } => ArchiveError::UnknownType {
                path: path.into(),
                base,
                tag,
            },
            other => ArchiveError::malformed(path, other.to_string()),
        }
    }
}

/// An object that can write itself into, and fill itself from, an archive record.
///
/// `unarchive` is called on a blank instance produced by the registry.
pub trait Archivable {
    fn type_tag(&self) -> String;

    /// Newest record layout this type writes and understands.
    fn archive_version(&self) -> u32 {
        0
    }

    fn archive(&self, archiver: &mut Archiver) -> Result<(), ArchiveError>;

    fn unarchive(&mut self, unarchiver: &Unarchiver<'_>) -> Result<(), ArchiveError>;
}

/// Archived form of a [`PortRange`](crate::graph::ports::PortRange): the node is
/// named by its archived id rather than by an in-memory handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedRange {
    pub node: String,
    pub port: usize,
    pub start: usize,
    pub count: usize,
}

/// Checks that a fixed-type record (a model or a map) is what the caller expects.
pub fn expect_record(unarchiver: &Unarchiver<'_>, type_tag: &str, version: u32) -> Result<(), ArchiveError> {
    let found = unarchiver.type_tag()?;
    if found != type_tag {
        return Err(ArchiveError::malformed(
            unarchiver.field_path(TYPE_FIELD),
            format!("expected a \"{}\" record, found \"{}\"", type_tag, found),
        ));
    }
    let archived = unarchiver.archived_version()?;
    if archived > version {
        return Err(ArchiveError::malformed(
            unarchiver.field_path(VERSION_FIELD),
            format!("version {} of \"{}\" is newer than supported version {}", archived, type_tag, version),
        ));
    }
    Ok(())
}

pub fn read_document(reader: impl Read) -> Result<Value, ArchiveError> {
    serde_json::from_reader(reader).map_err(ArchiveError::Document)
}

pub fn write_document(document: &Value, mut writer: impl Write) -> Result<(), ArchiveError> {
    serde_json::to_writer_pretty(&mut writer, document).map_err(ArchiveError::Document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
