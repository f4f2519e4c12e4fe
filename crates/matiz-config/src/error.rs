//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading layers or building the catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a TOML layer
    #[error("failed to parse TOML '{path}': {message}")]
    TomlParse {
        /// Path of the offending file (`<bundled>` for the embedded layer).
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Failed to parse a YAML layer
    #[error("failed to parse YAML '{path}': {message}")]
    YamlParse {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A layer file uses an extension the loader does not recognize
    #[error("unsupported layer encoding for '{path}' (expected .toml, .yaml, or .yml)")]
    UnsupportedEncoding {
        /// Path of the unrecognized file.
        path: PathBuf,
    },

    /// The required package-defaults layer is missing or broken
    #[error("package defaults layer is invalid: {0}")]
    BrokenDefaults(String),

    /// The merged tree does not satisfy the catalog schema
    #[error("invalid effects configuration: {0}")]
    Schema(String),

    /// Validation errors against a structurally sound tree
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A dotted-path override could not be applied
    #[error("invalid override path '{path}': {reason}")]
    InvalidOverride {
        /// The dotted path as supplied by the caller.
        path: String,
        /// Why it could not be applied.
        reason: String,
    },

    /// Failed to create a directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a TOML parse error for the given file.
    pub fn toml_parse(path: impl Into<PathBuf>, err: &toml::de::Error) -> Self {
        ConfigError::TomlParse {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a YAML parse error for the given file.
    pub fn yaml_parse(path: impl Into<PathBuf>, err: &serde_yaml::Error) -> Self {
        ConfigError::YamlParse {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

/// Catalog validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A command template references a placeholder with no matching parameter.
    #[error("effect '{effect}' command references ${placeholder} but declares no parameter '{param}'")]
    UnknownPlaceholder {
        /// Name of the effect.
        effect: String,
        /// The placeholder token as written in the template.
        placeholder: String,
        /// The parameter name the placeholder would need.
        param: String,
    },

    /// A parameter references an undefined parameter type.
    #[error("parameter '{param}' of effect '{effect}' references unknown type '{type_name}'")]
    UnknownParameterType {
        /// Name of the effect.
        effect: String,
        /// Name of the parameter.
        param: String,
        /// The unresolved type name.
        type_name: String,
    },

    /// A parameter type carries a pattern that does not compile.
    #[error("parameter type '{type_name}' has an invalid pattern: {reason}")]
    BadPattern {
        /// Name of the parameter type.
        type_name: String,
        /// Regex compile error.
        reason: String,
    },

    /// A parameter type declares min > max.
    #[error("parameter type '{type_name}' has min {min} greater than max {max}")]
    InvertedBounds {
        /// Name of the parameter type.
        type_name: String,
        /// Declared minimum.
        min: f64,
        /// Declared maximum.
        max: f64,
    },

    /// A supplied value fails its parameter's pattern or bounds.
    #[error("invalid value for parameter '{param}': {reason}")]
    InvalidValue {
        /// Name of the parameter.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },
}
