//! Typed catalog schema.
//!
//! The merged layer tree deserializes into [`EffectsConfig`], the read-only
//! in-memory catalog every downstream component consumes. Parameter values
//! stay as [`serde_json::Value`] scalars; commands stringify them at
//! substitution time.
//!
//! # TOML Shape (flat encoding)
//!
//! ```toml
//! version = 2
//!
//! [parameter_types.blur_geometry]
//! type = "string"
//! pattern = '^\d+x\d+$'
//! default = "0x8"
//!
//! [effects.blur]
//! description = "Gaussian blur"
//! command = 'magick "$INPUT" -blur "$BLUR" "$OUTPUT"'
//! [effects.blur.parameters.blur]
//! type = "blur_geometry"
//!
//! [composites.soft_dim]
//! chain = [
//!     { effect = "brightness", params = { brightness = 70 } },
//!     { effect = "blur" },
//! ]
//!
//! [presets.lockscreen]
//! composite = "soft_dim"
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameter values keyed by parameter name.
///
/// A BTreeMap keeps iteration deterministic, which in turn keeps command
/// substitution and CLI listings stable.
pub type ParamMap = BTreeMap<String, Value>;

/// Primitive kind of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Free-form string, optionally constrained by a pattern.
    String,
    /// Whole number.
    Integer,
    /// Floating-point number.
    Float,
    /// true/false flag.
    Boolean,
}

impl ParamKind {
    /// Parse an inline primitive kind name as used in `ParameterDefinition.type`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ParamKind::String),
            "integer" => Some(ParamKind::Integer),
            "float" => Some(ParamKind::Float),
            "boolean" => Some(ParamKind::Boolean),
            _ => None,
        }
    }

    /// Human-readable kind name.
    pub const fn name(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Float => "float",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// Reusable parameter type descriptor, referenced by name from
/// [`ParameterDefinition::param_type`]. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterType {
    /// Primitive kind of values of this type.
    #[serde(rename = "type")]
    pub kind: ParamKind,

    /// Validation regex, meaningful for string kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Lower bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Fallback value when neither an override nor an effect-level default
    /// supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterType {
    /// Create a parameter type of the given kind.
    pub fn new(kind: ParamKind) -> Self {
        Self {
            kind,
            pattern: None,
            min: None,
            max: None,
            default: None,
            description: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the validation pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set numeric bounds.
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Per-effect parameter binding. Owned by exactly one [`Effect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Name of a [`ParameterType`], or an inline primitive kind name
    /// (`string`, `integer`, `float`, `boolean`).
    #[serde(rename = "type")]
    pub param_type: String,

    /// CLI flag exposing this parameter (e.g. `--blur`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_flag: Option<String>,

    /// Effect-level default, overriding the type default when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterDefinition {
    /// Create a definition referencing the given type name.
    pub fn of_type(param_type: impl Into<String>) -> Self {
        Self {
            param_type: param_type.into(),
            cli_flag: None,
            default: None,
            description: None,
        }
    }

    /// Set the effect-level default.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Atomic named image transform backed by one external-command template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Command template with `$INPUT`, `$OUTPUT`, and `$<PARAM_NAME>`
    /// placeholders (parameter names upper-cased).
    pub command: String,

    /// Declared parameters by name.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterDefinition>,
}

impl Effect {
    /// Create an effect from a command template.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            command: command.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a parameter.
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        definition: ParameterDefinition,
    ) -> Self {
        self.parameters.insert(name.into(), definition);
        self
    }
}

/// One link in a composite: an effect name plus literal parameter overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    /// Name of the effect to run; resolved against the catalog at
    /// execution time.
    pub effect: String,

    /// Literal overrides for this step. Keys need not cover all of the
    /// effect's parameters.
    #[serde(default)]
    pub params: ParamMap,
}

impl ChainStep {
    /// Create a step for the named effect.
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            effect: effect.into(),
            params: ParamMap::new(),
        }
    }

    /// Add a parameter override.
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Named ordered chain of effects applied via intermediate files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeEffect {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Ordered steps. Must hold at least one step to be executable; an
    /// empty chain is a defined execution-time error, not a load error.
    #[serde(default)]
    pub chain: Vec<ChainStep>,
}

impl CompositeEffect {
    /// Create a composite from ordered steps.
    pub fn new(chain: Vec<ChainStep>) -> Self {
        Self {
            description: String::new(),
            chain,
        }
    }
}

/// Named shortcut binding to a composite, or to an effect with fixed params.
///
/// `composite` and `effect` are mutually exclusive by convention; the
/// schema does not enforce it, and a preset with neither set is an
/// execution-time error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Name of the composite this preset runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<String>,

    /// Name of the effect this preset runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,

    /// Parameter overrides, meaningful when `effect` is set.
    #[serde(default)]
    pub params: ParamMap,
}

impl Preset {
    /// Create a preset bound to a composite.
    pub fn for_composite(name: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            composite: Some(name.into()),
            effect: None,
            params: ParamMap::new(),
        }
    }

    /// Create a preset bound to an effect.
    pub fn for_effect(name: impl Into<String>) -> Self {
        Self {
            description: String::new(),
            composite: None,
            effect: Some(name.into()),
            params: ParamMap::new(),
        }
    }

    /// Add a parameter override.
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

fn default_version() -> u32 {
    1
}

/// The fully merged, validated effects catalog.
///
/// Built once per [`CatalogContext`](crate::CatalogContext) and shared as
/// an `Arc`; treated as read-only by every consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectsConfig {
    /// Catalog format version. Taken exclusively from the package-defaults
    /// layer; higher layers cannot override it.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Reusable parameter types by name.
    #[serde(default)]
    pub parameter_types: BTreeMap<String, ParameterType>,

    /// Atomic effects by name.
    #[serde(default)]
    pub effects: BTreeMap<String, Effect>,

    /// Composites by name.
    #[serde(default)]
    pub composites: BTreeMap<String, CompositeEffect>,

    /// Presets by name.
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            parameter_types: BTreeMap::new(),
            effects: BTreeMap::new(),
            composites: BTreeMap::new(),
            presets: BTreeMap::new(),
        }
    }
}

impl EffectsConfig {
    /// Look up an effect by name.
    pub fn effect(&self, name: &str) -> Option<&Effect> {
        self.effects.get(name)
    }

    /// Look up a composite by name.
    pub fn composite(&self, name: &str) -> Option<&CompositeEffect> {
        self.composites.get(name)
    }

    /// Look up a preset by name.
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Look up a parameter type by name.
    pub fn parameter_type(&self, name: &str) -> Option<&ParameterType> {
        self.parameter_types.get(name)
    }
}

/// Extract the placeholder tokens of a command template, in order of first
/// appearance and without duplicates.
///
/// A placeholder is `$` followed by an upper-case identifier
/// (`[A-Z][A-Z0-9_]*`). `$INPUT` and `$OUTPUT` are included; callers filter
/// them as needed.
pub fn command_placeholders(command: &str) -> Vec<String> {
    let bytes = command.as_bytes();
    let mut tokens: Vec<String> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_uppercase() {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len()
                && (bytes[end].is_ascii_uppercase()
                    || bytes[end].is_ascii_digit()
                    || bytes[end] == b'_')
            {
                end += 1;
            }
            let token = &command[start..end];
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
            i = end;
        } else {
            i += 1;
        }
    }
    tokens
}
