//! Layered configuration and effect catalog for matiz.
//!
//! This crate turns a stack of configuration layers (package defaults →
//! project file → user config → CLI overrides) into a single validated,
//! immutable catalog of image effects, composites, and presets.
//!
//! # Features
//!
//! - **Layer loading**: TOML and YAML layers, discovered in a fixed
//!   priority order, missing optional layers skipped silently
//! - **Deep merge**: maps recurse, lists and scalars replace wholesale
//! - **Catalog**: typed effect/composite/preset schema with build-time
//!   validation of command placeholders and parameter types
//! - **Caching**: one build per context, explicit `reload()`/`reset()`
//! - **Bundled defaults**: a complete wallpaper-effects catalog embedded
//!   in the binary as the required lowest layer
//!
//! # Example
//!
//! ```rust,no_run
//! use matiz_config::CatalogContext;
//!
//! let context = CatalogContext::discover(None, Vec::new());
//! let catalog = context.catalog().unwrap();
//!
//! for (name, effect) in &catalog.effects {
//!     println!("{name}: {}", effect.description);
//! }
//! ```

mod catalog;
mod error;
mod merge;
mod schema;

/// Layer discovery, loading, and dotted-path overrides.
pub mod layers;

/// Platform-specific configuration paths.
pub mod paths;

/// Package-bundled default catalog.
pub mod defaults;

pub use catalog::{validate, CatalogContext};
pub use error::{ConfigError, ValidationError};
pub use merge::{deep_merge, merge_layers};
pub use schema::{
    command_placeholders, ChainStep, CompositeEffect, Effect, EffectsConfig, ParamKind, ParamMap,
    ParameterDefinition, ParameterType, Preset,
};
