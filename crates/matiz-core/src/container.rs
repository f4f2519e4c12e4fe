//! Containerized command relay.
//!
//! The relay re-expresses a fully resolved host command as an equivalent
//! invocation inside an isolated container: the input file is mounted
//! read-only, the output directory read-write, and host paths inside the
//! command are rewritten to their container mounts. The relay changes
//! nothing about parameter resolution or chain sequencing.

use std::path::Path;

/// Mount point for the read-only input file.
const INPUT_MOUNT_DIR: &str = "/data/in";

/// Mount point for the read-write output directory.
const OUTPUT_MOUNT_DIR: &str = "/data/out";

/// Supported container engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEngine {
    /// Rootless-friendly engine; gets `--userns=keep-id` so output files
    /// land with the invoking user's ownership.
    Podman,
    /// Docker daemon.
    Docker,
}

impl ContainerEngine {
    /// Binary name of the engine.
    pub const fn binary(self) -> &'static str {
        match self {
            ContainerEngine::Podman => "podman",
            ContainerEngine::Docker => "docker",
        }
    }

    /// Engine-specific user-namespace flags, with a leading space when
    /// non-empty.
    const fn userns_flags(self) -> &'static str {
        match self {
            ContainerEngine::Podman => " --userns=keep-id",
            ContainerEngine::Docker => "",
        }
    }
}

/// Relays resolved commands into a container.
#[derive(Debug, Clone)]
pub struct ContainerRelay {
    engine: ContainerEngine,
    image: String,
}

impl ContainerRelay {
    /// Create a relay for the given engine and image.
    pub fn new(engine: ContainerEngine, image: impl Into<String>) -> Self {
        Self {
            engine,
            image: image.into(),
        }
    }

    /// The image this relay runs.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Re-express `command` as a containerized invocation.
    ///
    /// `input` and `output` are the host paths the command already refers
    /// to; occurrences inside the command are rewritten to the container
    /// mounts. Longer path first, so nested paths never partially rewrite.
    pub fn relay(&self, command: &str, input: &Path, output: &Path) -> String {
        let host_input = input.display().to_string();
        let host_output = output.display().to_string();
        let input_name = file_name_or(input, "input");
        let output_name = file_name_or(output, "output");
        let container_input = format!("{INPUT_MOUNT_DIR}/{input_name}");
        let container_output = format!("{OUTPUT_MOUNT_DIR}/{output_name}");
        let host_output_dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .display()
            .to_string();

        let mut translations = [
            (host_input.as_str(), container_input.as_str()),
            (host_output.as_str(), container_output.as_str()),
        ];
        translations.sort_by_key(|(host, _)| std::cmp::Reverse(host.len()));

        let mut inner = command.to_string();
        for (host, container) in translations {
            inner = inner.replace(host, container);
        }

        format!(
            "{engine} run --rm{userns} -v {host_input}:{container_input}:ro -v {host_output_dir}:{OUTPUT_MOUNT_DIR}:rw {image} sh -c {inner}",
            engine = self.engine.binary(),
            userns = self.engine.userns_flags(),
            image = self.image,
            inner = single_quote(&inner),
        )
    }
}

fn file_name_or(path: &Path, fallback: &str) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(fallback)
        .to_string()
}

/// Single-quote a string for the host shell, escaping embedded quotes.
fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
