//! Catalog construction and caching.
//!
//! [`CatalogContext`] owns a discovered layer stack plus CLI overrides and
//! builds the merged, validated [`EffectsConfig`] exactly once, handing out
//! the same `Arc` until an explicit [`reload`](CatalogContext::reload) or
//! [`reset`](CatalogContext::reset). The context is passed to consumers
//! explicitly; there is no process-global catalog.

use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{ConfigError, ValidationError};
use crate::layers::{self, LayerSource, NAMESPACE};
use crate::merge::merge_layers;
use crate::schema::{command_placeholders, EffectsConfig, ParamKind};

/// Handle to a lazily built, memoized effects catalog.
pub struct CatalogContext {
    sources: Vec<LayerSource>,
    overrides: Vec<(String, Value)>,
    cache: Mutex<Option<Arc<EffectsConfig>>>,
}

impl CatalogContext {
    /// Create a context over an explicit layer stack (lowest priority
    /// first) and dotted-path overrides (applied last, in order).
    pub fn new(sources: Vec<LayerSource>, overrides: Vec<(String, Value)>) -> Self {
        Self {
            sources,
            overrides,
            cache: Mutex::new(None),
        }
    }

    /// Create a context by discovering layers on disk.
    ///
    /// See [`layers::discover_layers`] for the discovery order.
    pub fn discover(project_root: Option<&Path>, overrides: Vec<(String, Value)>) -> Self {
        Self::new(layers::discover_layers(project_root, None), overrides)
    }

    /// The layer stack this context builds from.
    pub fn sources(&self) -> &[LayerSource] {
        &self.sources
    }

    /// Return the catalog, building it on first use.
    ///
    /// Subsequent calls return the same cached `Arc`. Concurrent callers
    /// during the uncached state serialize on an internal lock, so exactly
    /// one build runs and every caller sees the same instance.
    pub fn catalog(&self) -> Result<Arc<EffectsConfig>, ConfigError> {
        let mut guard = self.cache.lock().expect("catalog cache lock poisoned");
        if let Some(cached) = guard.as_ref() {
            return Ok(Arc::clone(cached));
        }
        let built = Arc::new(self.build()?);
        *guard = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Force a rebuild, replacing the cached instance.
    pub fn reload(&self) -> Result<Arc<EffectsConfig>, ConfigError> {
        let built = Arc::new(self.build()?);
        let mut guard = self.cache.lock().expect("catalog cache lock poisoned");
        *guard = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Drop the cached instance; the next [`catalog`](Self::catalog) call
    /// rebuilds.
    pub fn reset(&self) {
        let mut guard = self.cache.lock().expect("catalog cache lock poisoned");
        *guard = None;
    }

    fn build(&self) -> Result<EffectsConfig, ConfigError> {
        let mut trees = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            trees.push(layers::load_layer(source)?);
        }

        // version comes exclusively from the lowest-priority layer; capture
        // it before merging so higher layers cannot override it.
        let pinned_version = trees
            .first()
            .and_then(|tree| tree.get(NAMESPACE))
            .and_then(|ns| ns.get("version"))
            .cloned();

        let mut merged = merge_layers(&trees);
        for (path, value) in &self.overrides {
            layers::set_dotted(&mut merged, path, value.clone())?;
        }

        let mut subtree = merged
            .get(NAMESPACE)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        if let Some(object) = subtree.as_object_mut() {
            match pinned_version {
                Some(version) => {
                    object.insert("version".to_string(), version);
                }
                None => {
                    object.remove("version");
                }
            }
        }

        let config: EffectsConfig =
            serde_json::from_value(subtree).map_err(|e| ConfigError::Schema(e.to_string()))?;
        validate(&config)?;
        tracing::debug!(
            "catalog built: {} effects, {} composites, {} presets",
            config.effects.len(),
            config.composites.len(),
            config.presets.len()
        );
        Ok(config)
    }
}

/// Validate a structurally sound catalog.
///
/// Checks placeholder/parameter agreement, parameter-type references,
/// pattern compilation, and bound ordering. Composite step references and
/// preset targets are deliberately left to execution time, where they
/// surface as non-exceptional error results.
pub fn validate(config: &EffectsConfig) -> Result<(), ValidationError> {
    for (type_name, parameter_type) in &config.parameter_types {
        if let Some(pattern) = &parameter_type.pattern {
            regex_lite::Regex::new(pattern).map_err(|e| ValidationError::BadPattern {
                type_name: type_name.clone(),
                reason: e.to_string(),
            })?;
        }
        if let (Some(min), Some(max)) = (parameter_type.min, parameter_type.max)
            && min > max
        {
            return Err(ValidationError::InvertedBounds {
                type_name: type_name.clone(),
                min,
                max,
            });
        }
    }

    for (effect_name, effect) in &config.effects {
        for placeholder in command_placeholders(&effect.command) {
            if placeholder == "INPUT" || placeholder == "OUTPUT" {
                continue;
            }
            let declared = effect
                .parameters
                .keys()
                .any(|name| name.to_uppercase() == placeholder);
            if !declared {
                return Err(ValidationError::UnknownPlaceholder {
                    effect: effect_name.clone(),
                    param: placeholder.to_lowercase(),
                    placeholder,
                });
            }
        }

        for (param_name, definition) in &effect.parameters {
            let resolves = ParamKind::from_name(&definition.param_type).is_some()
                || config.parameter_types.contains_key(&definition.param_type);
            if !resolves {
                return Err(ValidationError::UnknownParameterType {
                    effect: effect_name.clone(),
                    param: param_name.clone(),
                    type_name: definition.param_type.clone(),
                });
            }
        }
    }

    Ok(())
}
