pub mod build;
pub mod completions;
pub mod init;
pub mod layers;

use clap::{Parser, Subcommand};

/// orasprite - OpenRaster sprite pipeline
#[derive(Parser, Debug)]
#[command(name = "orasprite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build images, frames and sheets from a pipeline config
    Build(build::BuildArgs),

    /// List the layers of OpenRaster files
    Layers(layers::LayersArgs),

    /// Initialize an orasprite project (generates orasprite.json)
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
