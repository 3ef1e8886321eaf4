use clap::Parser;
use miette::Result;
use orasprite::cli::{Cli, Commands};
use orasprite::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new();

    match cli.command {
        Commands::Build(args) => orasprite::cli::build::run(args, &printer)?,
        Commands::Layers(args) => orasprite::cli::layers::run(args, &printer)?,
        Commands::Init(args) => orasprite::cli::init::run(args, &printer)?,
        Commands::Completions(args) => orasprite::cli::completions::run(args)?,
    }

    Ok(())
}
