//! Matiz CLI - layered ImageMagick effect pipelines for wallpapers.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "matiz")]
#[command(author, version, about = "Matiz wallpaper effects CLI", long_about = None)]
struct Cli {
    /// Project config file (replaces project-root discovery)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override a config value by dotted path
    /// (e.g. effects.effects.blur.parameters.blur.default=0x20)
    #[arg(long = "set", global = true, value_name = "PATH=VALUE")]
    set: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an effect, composite, or preset to an image
    Apply(commands::apply::ApplyArgs),

    /// Apply many catalog items to one image
    Batch(commands::batch::BatchArgs),

    /// List available effects and their parameters
    Effects(commands::effects::EffectsArgs),

    /// List composites and presets
    Presets(commands::presets::PresetsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = commands::common::catalog_context(cli.config.as_deref(), &cli.set)?;

    match cli.command {
        Commands::Apply(args) => commands::apply::run(&context, args),
        Commands::Batch(args) => commands::batch::run(&context, args),
        Commands::Effects(args) => commands::effects::run(&context, args),
        Commands::Presets(args) => commands::presets::run(&context, args),
    }
}
