//! Shared helpers for command implementations.

use clap::{Args, ValueEnum};
use matiz_config::layers::{discover_layers, parse_override, LayerSource};
use matiz_config::CatalogContext;
use matiz_core::{CommandExecutor, ContainerEngine, ContainerRelay};
use serde_json::Value;
use std::path::Path;

/// Build the catalog context from the global CLI flags.
///
/// With `--config` the given file takes the project layer's slot; without
/// it the project layer is discovered from the current directory. `--set`
/// overrides apply last.
pub fn catalog_context(config: Option<&Path>, sets: &[String]) -> anyhow::Result<CatalogContext> {
    let mut overrides = Vec::with_capacity(sets.len());
    for set in sets {
        overrides.push(parse_override(set)?);
    }

    let context = match config {
        Some(path) => {
            anyhow::ensure!(
                path.is_file(),
                "config file '{}' does not exist",
                path.display()
            );
            let mut sources = discover_layers(None, None);
            sources.insert(1, LayerSource::file(path));
            CatalogContext::new(sources, overrides)
        }
        None => CatalogContext::discover(Some(Path::new(".")), overrides),
    };
    tracing::debug!("layer stack: {} source(s)", context.sources().len());
    Ok(context)
}

/// Parse a `key=value` effect parameter. The value side is interpreted as
/// JSON when it parses (numbers, booleans) and kept as a string otherwise.
pub fn parse_param(s: &str) -> Result<(String, Value), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid parameter format: '{}' (expected key=value)",
            s
        ));
    }
    let value =
        serde_json::from_str(parts[1]).unwrap_or_else(|_| Value::String(parts[1].to_string()));
    Ok((parts[0].to_string(), value))
}

/// Container engine choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    /// Rootless podman.
    Podman,
    /// Docker daemon.
    Docker,
}

impl From<EngineArg> for ContainerEngine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Podman => ContainerEngine::Podman,
            EngineArg::Docker => ContainerEngine::Docker,
        }
    }
}

/// Containerized-execution flags shared by apply and batch.
#[derive(Args)]
pub struct ContainerOpts {
    /// Run commands inside a container instead of on the host
    #[arg(long)]
    pub container: bool,

    /// Container engine
    #[arg(long, value_enum, default_value = "podman")]
    pub engine: EngineArg,

    /// Container image providing the image tool
    #[arg(long, default_value = "docker.io/dpokidov/imagemagick")]
    pub image: String,
}

impl ContainerOpts {
    /// Build the executor these flags describe.
    pub fn executor(&self) -> CommandExecutor {
        if self.container {
            CommandExecutor::with_relay(ContainerRelay::new(
                self.engine.into(),
                self.image.clone(),
            ))
        } else {
            CommandExecutor::new()
        }
    }
}
