//! Layer discovery and loading.
//!
//! Configuration comes from up to four tiers, lowest to highest priority:
//! the package-bundled defaults (required), an optional project-root file,
//! an optional user-config file or directory of files, and CLI overrides
//! applied last through dotted-path assignment.
//!
//! Two encodings exist. The bundled defaults are **flat**: the catalog
//! fields sit at the top level. Project and user files are **namespaced**:
//! the catalog lives under the `effects` key so the files can coexist with
//! unrelated tool settings. The loader wraps flat content under the
//! namespace key before merging, so every loaded tree has the same shape.
//! TOML and YAML are interchangeable, detected by extension.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::ConfigError;
use crate::paths;

/// Top-level key namespaced layers keep the catalog under.
pub const NAMESPACE: &str = "effects";

/// Project-root file names probed in order.
const PROJECT_FILE_NAMES: &[&str] = &["matiz.toml", "matiz.yaml", "matiz.yml"];

/// User-config file names probed in order.
const USER_FILE_NAMES: &[&str] = &["effects.toml", "effects.yaml", "effects.yml"];

/// Subdirectory of the user config dir holding split layer files.
const USER_DIR_NAME: &str = "effects.d";

/// How a layer's on-disk content maps onto the namespaced tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEncoding {
    /// Catalog fields at the top level; wrapped under [`NAMESPACE`] on load.
    Flat,
    /// Catalog already nested under [`NAMESPACE`].
    Namespaced,
}

/// Where a layer's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOrigin {
    /// The defaults embedded in the package. Always present.
    Bundled,
    /// A file discovered on disk.
    File(PathBuf),
}

/// One discovered configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSource {
    /// Content origin.
    pub origin: LayerOrigin,
    /// Encoding of the content.
    pub encoding: LayerEncoding,
}

impl LayerSource {
    /// The bundled package-defaults layer.
    pub fn bundled() -> Self {
        Self {
            origin: LayerOrigin::Bundled,
            encoding: LayerEncoding::Flat,
        }
    }

    /// A namespaced file layer.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: LayerOrigin::File(path.into()),
            encoding: LayerEncoding::Namespaced,
        }
    }
}

/// Discover the layer stack, lowest to highest priority.
///
/// The bundled defaults always come first. The project layer is the first
/// of `matiz.{toml,yaml,yml}` found in `project_root`. The user tier
/// contributes `effects.{toml,yaml,yml}` from `user_config_dir` (first
/// found), then every recognized file in `user_config_dir/effects.d/`
/// sorted lexicographically. Missing optional layers are skipped silently.
///
/// `user_config_dir` defaults to [`paths::user_config_dir`] when `None`;
/// tests inject a temp dir instead.
pub fn discover_layers(
    project_root: Option<&Path>,
    user_config_dir: Option<&Path>,
) -> Vec<LayerSource> {
    let mut sources = vec![LayerSource::bundled()];

    if let Some(root) = project_root
        && let Some(path) = first_existing(root, PROJECT_FILE_NAMES)
    {
        tracing::debug!("project layer: {}", path.display());
        sources.push(LayerSource::file(path));
    }

    let user_dir = user_config_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(paths::user_config_dir);

    if let Some(path) = first_existing(&user_dir, USER_FILE_NAMES) {
        tracing::debug!("user layer: {}", path.display());
        sources.push(LayerSource::file(path));
    }

    for path in sorted_layer_files(&user_dir.join(USER_DIR_NAME)) {
        tracing::debug!("user layer (effects.d): {}", path.display());
        sources.push(LayerSource::file(path));
    }

    sources
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|p| p.is_file())
}

/// List recognized layer files in a directory, sorted by file name.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
fn sorted_layer_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && detect_format(path).is_some())
        .collect();
    files.sort_by_key(|path| path.file_name().map(std::ffi::OsStr::to_os_string));
    files
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerFormat {
    Toml,
    Yaml,
}

fn detect_format(path: &Path) -> Option<LayerFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Some(LayerFormat::Toml),
        Some("yaml") | Some("yml") => Some(LayerFormat::Yaml),
        _ => None,
    }
}

/// Load one layer into a namespaced tree.
///
/// A missing or unparsable bundled layer is a [`ConfigError::BrokenDefaults`]
/// (it ships inside the binary, so this only fires on a packaging mistake).
/// A parse error in a file layer is fatal and names the offending path.
pub fn load_layer(source: &LayerSource) -> Result<Value, ConfigError> {
    let tree = match &source.origin {
        LayerOrigin::Bundled => toml::from_str::<toml::Value>(defaults::PACKAGE_DEFAULTS)
            .map_err(|e| ConfigError::BrokenDefaults(e.to_string()))
            .and_then(|v| {
                serde_json::to_value(v).map_err(|e| ConfigError::BrokenDefaults(e.to_string()))
            })?,
        LayerOrigin::File(path) => {
            let format = detect_format(path).ok_or_else(|| ConfigError::UnsupportedEncoding {
                path: path.clone(),
            })?;
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
            match format {
                LayerFormat::Toml => toml::from_str::<toml::Value>(&content)
                    .map_err(|e| ConfigError::toml_parse(path, &e))
                    .and_then(|v| {
                        serde_json::to_value(v).map_err(|e| ConfigError::Schema(e.to_string()))
                    })?,
                LayerFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(&content)
                    .map_err(|e| ConfigError::yaml_parse(path, &e))
                    .and_then(|v| {
                        serde_json::to_value(v).map_err(|e| ConfigError::Schema(e.to_string()))
                    })?,
            }
        }
    };

    Ok(match source.encoding {
        LayerEncoding::Flat => {
            let mut wrapped = Map::new();
            wrapped.insert(NAMESPACE.to_string(), tree);
            Value::Object(wrapped)
        }
        LayerEncoding::Namespaced => tree,
    })
}

/// Assign `value` at a dotted path inside `tree`, creating intermediate
/// maps as needed. Non-map values in the way are replaced; the override
/// tier always wins.
pub fn set_dotted(tree: &mut Value, path: &str, value: Value) -> Result<(), ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::InvalidOverride {
            path: path.to_string(),
            reason: "empty path segment".to_string(),
        });
    }

    let mut cursor = tree;
    for segment in &segments[..segments.len() - 1] {
        if !cursor.is_object() {
            *cursor = Value::Object(Map::new());
        }
        cursor = cursor
            .as_object_mut()
            .expect("cursor was just coerced to an object")
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !cursor.is_object() {
        *cursor = Value::Object(Map::new());
    }
    cursor
        .as_object_mut()
        .expect("cursor was just coerced to an object")
        .insert(segments[segments.len() - 1].to_string(), value);
    Ok(())
}

/// Parse a `path=value` override as supplied on the command line.
///
/// The value side is interpreted as JSON when it parses (numbers, booleans,
/// quoted strings) and kept as a plain string otherwise.
pub fn parse_override(spec: &str) -> Result<(String, Value), ConfigError> {
    let Some((path, raw)) = spec.split_once('=') else {
        return Err(ConfigError::InvalidOverride {
            path: spec.to_string(),
            reason: "expected path=value".to_string(),
        });
    };
    Ok((path.to_string(), parse_override_value(raw)))
}

fn parse_override_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn bundled_layer_is_always_first() {
        let sources = discover_layers(None, Some(Path::new("/nonexistent/config/dir")));
        assert_eq!(sources[0], LayerSource::bundled());
        assert_eq!(sources.len(), 1, "missing optional layers are skipped");
    }

    #[test]
    fn project_layer_discovered_when_present() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("matiz.toml"), "[effects]\n").unwrap();

        let sources = discover_layers(
            Some(project.path()),
            Some(Path::new("/nonexistent/config/dir")),
        );
        assert_eq!(sources.len(), 2);
        assert_eq!(
            sources[1],
            LayerSource::file(project.path().join("matiz.toml"))
        );
    }

    #[test]
    fn yaml_project_file_found_when_toml_absent() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("matiz.yaml"), "effects: {}\n").unwrap();

        let sources = discover_layers(Some(project.path()), Some(Path::new("/nonexistent")));
        assert_eq!(
            sources[1],
            LayerSource::file(project.path().join("matiz.yaml"))
        );
    }

    #[test]
    fn user_dir_files_sorted_lexicographically() {
        let user = TempDir::new().unwrap();
        let dropins = user.path().join("effects.d");
        fs::create_dir(&dropins).unwrap();
        fs::write(dropins.join("20-extra.toml"), "[effects]\n").unwrap();
        fs::write(dropins.join("10-base.yaml"), "effects: {}\n").unwrap();
        fs::write(dropins.join("notes.txt"), "ignored").unwrap();

        let sources = discover_layers(None, Some(user.path()));
        let names: Vec<_> = sources[1..]
            .iter()
            .map(|s| match &s.origin {
                LayerOrigin::File(p) => p.file_name().unwrap().to_str().unwrap().to_string(),
                LayerOrigin::Bundled => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["10-base.yaml", "20-extra.toml"]);
    }

    #[test]
    fn user_file_precedes_dropin_dir() {
        let user = TempDir::new().unwrap();
        fs::write(user.path().join("effects.toml"), "[effects]\n").unwrap();
        let dropins = user.path().join("effects.d");
        fs::create_dir(&dropins).unwrap();
        fs::write(dropins.join("00-first.toml"), "[effects]\n").unwrap();

        let sources = discover_layers(None, Some(user.path()));
        assert_eq!(sources.len(), 3);
        assert_eq!(
            sources[1],
            LayerSource::file(user.path().join("effects.toml"))
        );
        assert_eq!(
            sources[2],
            LayerSource::file(dropins.join("00-first.toml"))
        );
    }

    #[test]
    fn bundled_layer_loads_and_is_namespaced() {
        let tree = load_layer(&LayerSource::bundled()).unwrap();
        assert!(tree.get(NAMESPACE).is_some(), "flat content gets wrapped");
        assert!(tree[NAMESPACE].get("effects").is_some());
    }

    #[test]
    fn namespaced_toml_layer_loads_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matiz.toml");
        fs::write(
            &path,
            "[effects.effects.posterize]\ncommand = 'magick \"$INPUT\" -posterize 4 \"$OUTPUT\"'\n",
        )
        .unwrap();

        let tree = load_layer(&LayerSource::file(&path)).unwrap();
        assert_eq!(
            tree[NAMESPACE]["effects"]["posterize"]["command"],
            json!("magick \"$INPUT\" -posterize 4 \"$OUTPUT\"")
        );
    }

    #[test]
    fn yaml_layer_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("effects.yaml");
        fs::write(
            &path,
            "effects:\n  effects:\n    posterize:\n      command: magick in out\n",
        )
        .unwrap();

        let tree = load_layer(&LayerSource::file(&path)).unwrap();
        assert_eq!(
            tree[NAMESPACE]["effects"]["posterize"]["command"],
            json!("magick in out")
        );
    }

    #[test]
    fn toml_parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "= not toml").unwrap();

        let err = load_layer(&LayerSource::file(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.toml"), "got: {err}");
    }

    #[test]
    fn yaml_parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "effects: [unclosed").unwrap();

        let err = load_layer(&LayerSource::file(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"), "got: {err}");
    }

    #[test]
    fn missing_file_layer_is_a_read_error() {
        let err = load_layer(&LayerSource::file("/nonexistent/layer.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn set_dotted_creates_intermediates() {
        let mut tree = json!({});
        set_dotted(&mut tree, "effects.effects.blur.parameters.blur.default", json!("0x20"))
            .unwrap();
        assert_eq!(
            tree["effects"]["effects"]["blur"]["parameters"]["blur"]["default"],
            json!("0x20")
        );
    }

    #[test]
    fn set_dotted_replaces_scalar_in_the_way() {
        let mut tree = json!({"effects": 1});
        set_dotted(&mut tree, "effects.version", json!(9)).unwrap();
        assert_eq!(tree["effects"]["version"], json!(9));
    }

    #[test]
    fn set_dotted_rejects_empty_segments() {
        let mut tree = json!({});
        assert!(set_dotted(&mut tree, "a..b", json!(1)).is_err());
        assert!(set_dotted(&mut tree, "", json!(1)).is_err());
    }

    #[test]
    fn parse_override_interprets_json_scalars() {
        let (path, value) = parse_override("effects.version=3").unwrap();
        assert_eq!(path, "effects.version");
        assert_eq!(value, json!(3));

        let (_, value) = parse_override("a.b=true").unwrap();
        assert_eq!(value, json!(true));

        let (_, value) = parse_override("a.b=0x20").unwrap();
        assert_eq!(value, json!("0x20"), "non-JSON stays a string");
    }

    #[test]
    fn parse_override_requires_equals() {
        assert!(parse_override("no-equals-here").is_err());
    }
}
