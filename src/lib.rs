pub mod archive;
pub mod dtype;
pub mod files;
pub mod graph;
pub mod load;
pub mod map;
pub mod nodes;
pub mod port_spec;
pub mod registry;

pub use archive::{ArchiveError, Archivable, Archiver, Unarchiver};
pub use graph::{Graph, GraphError, Node, NodeId};
pub use load::{
    LoadError, MapLoadArguments, load_graph, load_map, load_map_from_arguments, read_graph, read_map, save_graph,
    save_map, write_graph, write_map,
};
pub use map::{Map, MapError};
pub use nodes::register_core_types;
pub use registry::{RegistryError, TypeRegistry};
