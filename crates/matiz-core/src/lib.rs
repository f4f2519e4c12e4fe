//! Effect resolution and execution engine for matiz.
//!
//! This crate takes a built [`EffectsConfig`](matiz_config::EffectsConfig)
//! catalog and runs its effects against wallpaper images: parameter
//! resolution, command substitution, single-process execution, ordered
//! chain execution through scoped intermediates, and sequential/parallel
//! batch fan-out. Optionally every command is relayed through a container
//! engine.
//!
//! Everything downstream of a built catalog communicates failure through
//! result values ([`ExecutionResult`] and [`BatchResult`]), never through
//! errors, so aggregation logic needs no error handling to keep its
//! invariants.
//!
//! # Example
//!
//! ```rust,no_run
//! use matiz_config::{CatalogContext, ParamMap};
//! use matiz_core::{run_effect, CommandExecutor};
//! use std::path::Path;
//!
//! let context = CatalogContext::discover(None, Vec::new());
//! let catalog = context.catalog().unwrap();
//! let executor = CommandExecutor::new();
//!
//! let result = run_effect(
//!     &catalog,
//!     &executor,
//!     "blur",
//!     &ParamMap::new(),
//!     Path::new("wall.png"),
//!     Path::new("wall-blurred.png"),
//! );
//! if !result.success {
//!     eprintln!("{}", result.stderr);
//! }
//! ```

mod batch;
mod chain;
mod container;
mod executor;
mod resolver;

pub use batch::{
    item_output_path, run_batch, run_batch_observed, run_composite, run_effect, run_preset,
    BatchItem, BatchMode, BatchOptions, BatchResult, ItemKind,
};
pub use chain::execute_chain;
pub use container::{ContainerEngine, ContainerRelay};
pub use executor::{stringify, substitute, CommandExecutor, ExecutionResult};
pub use resolver::{resolve_params, validate_overrides};
