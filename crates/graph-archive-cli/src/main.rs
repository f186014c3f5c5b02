use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use graph_archive::{Archivable, Map, MapLoadArguments, TypeRegistry, load_map_from_arguments, save_map};
use graph_archive_nodes::{Activation, register_node_types};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "graph-archive", version)]
#[command(about = "Inspect and assemble archived computation graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct MapArgs {
    /// JSON file with map load arguments; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Archived map to load, ignoring every other source
    #[arg(long)]
    map: Option<PathBuf>,
    /// Archived model to wrap in a map
    #[arg(long)]
    model: Option<PathBuf>,
    /// Input node of the model, e.g. "3"
    #[arg(long)]
    inputs: Option<String>,
    /// Output elements of the model, e.g. "{3.output[0:2], 5.output}"
    #[arg(long)]
    outputs: Option<String>,
    /// Width of the pass-through map used when no map or model is given
    #[arg(long)]
    default_input_size: Option<usize>,
}

impl MapArgs {
    fn load_arguments(&self) -> anyhow::Result<MapLoadArguments> {
        let mut arguments = match &self.config {
            Some(path) => MapLoadArguments::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => MapLoadArguments::default(),
        };
        if let Some(map) = &self.map {
            arguments.map_filename = Some(map.clone());
        }
        if let Some(model) = &self.model {
            arguments.model_filename = Some(model.clone());
        }
        if let Some(inputs) = &self.inputs {
            arguments.model_inputs = Some(inputs.clone());
        }
        if let Some(outputs) = &self.outputs {
            arguments.model_outputs = Some(outputs.clone());
        }
        if let Some(size) = self.default_input_size {
            arguments.default_input_size = size;
        }
        Ok(arguments)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the anchors and nodes of a map
    Describe {
        #[command(flatten)]
        map: MapArgs,
    },
    /// Assemble a map and write it as an archive
    Convert {
        #[command(flatten)]
        map: MapArgs,
        /// Where to write the map archive
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List every registered type tag
    Types,
}

fn describe(map: &Map) {
    println!("Inputs:");
    for (name, id) in map.inputs() {
        let size = map.input(name).map(|x| x.size()).unwrap_or_default();
        println!("  {}: node {} ({} elements)", name, id, size);
    }
    println!("Outputs:");
    for (name, elements) in map.outputs() {
        let ranges: Vec<String> = elements
            .ranges()
            .iter()
            .map(|x| format!("{}.{}[{}:{}]", x.node, x.port, x.start, x.start.saturating_add(x.count)))
            .collect();
        println!("  {}: {{{}}} ({} elements)", name, ranges.join(", "), elements.size());
    }
    println!("Nodes:");
    for (id, node) in map.graph().iter() {
        let sizes: Vec<String> = node
            .output_ports()
            .iter()
            .map(|x| format!("{}: {} x {}", x.name(), x.size(), x.dtype()))
            .collect();
        println!("  {} {} -> [{}]", id, node.type_tag(), sizes.join(", "));
        for input in node.input_ports() {
            let sources: Vec<String> = input
                .elements()
                .referenced_nodes()
                .iter()
                .map(|x| x.to_string())
                .collect();
            println!("      {} <- {}", input.name(), sources.join(", "));
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut registry = TypeRegistry::new();
    register_node_types(&mut registry)?;
    log::debug!("Registry holds {} type tags", registry.len());

    match cli.command {
        Commands::Describe { map } => {
            let map = load_map_from_arguments(&registry, &map.load_arguments()?)?;
            describe(&map);
        }
        Commands::Convert { map, output } => {
            let map = load_map_from_arguments(&registry, &map.load_arguments()?)?;
            save_map(&map, &output).with_context(|| format!("writing {}", output.display()))?;
            log::info!(
                "Wrote map with {} inputs and {} outputs to {}",
                map.inputs().len(),
                map.outputs().len(),
                output.display()
            );
        }
        Commands::Types => {
            println!("Nodes:");
            for tag in registry.tags::<dyn graph_archive::Node>() {
                println!("  {}", tag);
            }
            println!("Activations:");
            for tag in registry.tags::<dyn Activation>() {
                println!("  {}", tag);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"model_filename": "a.json", "default_input_size": 4}"#).unwrap();
        let args = MapArgs {
            config: Some(config),
            model: Some(PathBuf::from("b.json")),
            ..Default::default()
        };
        let arguments = args.load_arguments().unwrap();
        assert_eq!(arguments.model_filename, Some(PathBuf::from("b.json")));
        assert_eq!(arguments.default_input_size, 4);
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::parse_from(["graph-archive", "convert", "--default-input-size", "8", "-o", "out.json"]);
        match cli.command {
            Commands::Convert { map, output } => {
                assert_eq!(map.default_input_size, Some(8));
                assert_eq!(output, PathBuf::from("out.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
