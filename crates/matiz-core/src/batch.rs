//! Batch fan-out across effects, composites, and presets.
//!
//! The engine takes a list of named items, dispatches each through the
//! resolver/executor/chain machinery, and aggregates an overall
//! [`BatchResult`]. Sequential mode processes items in order; parallel
//! mode fans out over a bounded worker pool and collects results in
//! completion order. Under `strict`, the first failure stops the batch:
//! immediately in sequential mode, best-effort in parallel mode (work
//! already in flight finishes but is no longer awaited or counted).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use matiz_config::{EffectsConfig, ParamMap};

use crate::chain::execute_chain;
use crate::executor::{CommandExecutor, ExecutionResult};
use crate::resolver::resolve_params;

/// What a batch item's name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// An atomic effect.
    Effect,
    /// A composite chain.
    Composite,
    /// A preset shortcut.
    Preset,
}

impl ItemKind {
    /// Output subdirectory used by the kinded (non-flat) layout.
    pub const fn subdir(self) -> &'static str {
        match self {
            ItemKind::Effect => "effects",
            ItemKind::Composite => "composites",
            ItemKind::Preset => "presets",
        }
    }
}

/// One named unit of batch work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Catalog name the item resolves against.
    pub name: String,
    /// How the name is interpreted.
    pub kind: ItemKind,
}

impl BatchItem {
    /// An effect item.
    pub fn effect(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Effect,
        }
    }

    /// A composite item.
    pub fn composite(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Composite,
        }
    }

    /// A preset item.
    pub fn preset(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Preset,
        }
    }
}

/// How batch items are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Items run one at a time, in the given order.
    #[default]
    Sequential,
    /// Items fan out over a bounded worker pool.
    Parallel,
}

/// Batch scheduling options.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Scheduling mode.
    pub mode: BatchMode,
    /// Stop after the first failure.
    pub strict: bool,
    /// Worker cap for parallel mode; 0 picks the available hardware
    /// parallelism.
    pub max_concurrency: usize,
    /// Drop the per-kind subdirectory from output paths.
    pub flat_layout: bool,
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Number of items requested, fixed at dispatch time regardless of
    /// early termination.
    pub total: usize,
    /// Items that completed successfully.
    pub succeeded: usize,
    /// Items that completed with a failure.
    pub failed: usize,
    /// Per-item results; holds entries only for items that actually ran
    /// to completion before any early stop.
    pub results: HashMap<String, ExecutionResult>,
    /// Base directory outputs were written under.
    pub output_dir: PathBuf,
}

impl BatchResult {
    /// A batch succeeds iff nothing failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    fn empty(total: usize, output_dir: &Path) -> Self {
        Self {
            total,
            succeeded: 0,
            failed: 0,
            results: HashMap::new(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    fn record(&mut self, name: String, result: ExecutionResult) {
        if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.insert(name, result);
    }
}

/// Run a single effect by name with parameter overrides.
///
/// An unknown effect name yields a failed result, never an error.
pub fn run_effect(
    catalog: &EffectsConfig,
    executor: &CommandExecutor,
    name: &str,
    overrides: &ParamMap,
    input: &Path,
    output: &Path,
) -> ExecutionResult {
    let Some(effect) = catalog.effect(name) else {
        return ExecutionResult::failure(name, format!("unknown effect '{name}'"));
    };
    let params = resolve_params(catalog, name, overrides);
    executor.execute(&effect.command, input, output, &params)
}

/// Run a composite by name.
pub fn run_composite(
    catalog: &EffectsConfig,
    executor: &CommandExecutor,
    name: &str,
    input: &Path,
    output: &Path,
) -> ExecutionResult {
    let Some(composite) = catalog.composite(name) else {
        return ExecutionResult::failure(name, format!("unknown composite '{name}'"));
    };
    execute_chain(catalog, executor, &composite.chain, input, output)
}

/// Run a preset by name: its composite when set, otherwise its effect
/// with the preset params as overrides.
pub fn run_preset(
    catalog: &EffectsConfig,
    executor: &CommandExecutor,
    name: &str,
    input: &Path,
    output: &Path,
) -> ExecutionResult {
    let Some(preset) = catalog.preset(name) else {
        return ExecutionResult::failure(name, format!("unknown preset '{name}'"));
    };
    if let Some(composite) = &preset.composite {
        run_composite(catalog, executor, composite, input, output)
    } else if let Some(effect) = &preset.effect {
        run_effect(catalog, executor, effect, &preset.params, input, output)
    } else {
        ExecutionResult::failure(
            name,
            format!("preset '{name}' names neither a composite nor an effect"),
        )
    }
}

fn run_item(
    catalog: &EffectsConfig,
    executor: &CommandExecutor,
    item: &BatchItem,
    input: &Path,
    output: &Path,
) -> ExecutionResult {
    match item.kind {
        ItemKind::Effect => {
            run_effect(catalog, executor, &item.name, &ParamMap::new(), input, output)
        }
        ItemKind::Composite => run_composite(catalog, executor, &item.name, input, output),
        ItemKind::Preset => run_preset(catalog, executor, &item.name, input, output),
    }
}

/// Output path policy:
/// `output_dir / <input stem> / [<kind subdir> /] <item name>.<input suffix>`,
/// falling back to `png` when the input has no suffix. The kind
/// subdirectory is dropped under the flat layout.
pub fn item_output_path(
    input: &Path,
    output_dir: &Path,
    item: &BatchItem,
    flat_layout: bool,
) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    let suffix = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");

    let mut dir = output_dir.join(stem);
    if !flat_layout {
        dir = dir.join(item.kind.subdir());
    }
    dir.join(format!("{}.{suffix}", item.name))
}

/// Run a batch of items against one input image.
pub fn run_batch(
    catalog: &EffectsConfig,
    executor: &CommandExecutor,
    items: &[BatchItem],
    input: &Path,
    output_dir: &Path,
    options: &BatchOptions,
) -> BatchResult {
    run_batch_observed(catalog, executor, items, input, output_dir, options, |_, _| {})
}

/// [`run_batch`] with a completion observer, called once per completed
/// item from the collecting thread (progress bars hook in here).
#[allow(clippy::too_many_arguments)]
pub fn run_batch_observed(
    catalog: &EffectsConfig,
    executor: &CommandExecutor,
    items: &[BatchItem],
    input: &Path,
    output_dir: &Path,
    options: &BatchOptions,
    mut observer: impl FnMut(&str, &ExecutionResult),
) -> BatchResult {
    let mut batch = BatchResult::empty(items.len(), output_dir);
    if items.is_empty() {
        return batch;
    }

    match options.mode {
        BatchMode::Sequential => {
            for item in items {
                let output = item_output_path(input, output_dir, item, options.flat_layout);
                let result = run_item(catalog, executor, item, input, &output);
                observer(&item.name, &result);
                let failed = !result.success;
                batch.record(item.name.clone(), result);
                if failed && options.strict {
                    tracing::debug!("strict batch stop after '{}'", item.name);
                    break;
                }
            }
        }
        BatchMode::Parallel => {
            let workers = effective_concurrency(options.max_concurrency).min(items.len());
            let next = AtomicUsize::new(0);
            let stop = AtomicBool::new(false);
            let (sender, receiver) = crossbeam_channel::unbounded();

            std::thread::scope(|scope| {
                for _ in 0..workers {
                    let sender = sender.clone();
                    let next = &next;
                    let stop = &stop;
                    scope.spawn(move || {
                        loop {
                            if stop.load(Ordering::SeqCst) {
                                break;
                            }
                            let index = next.fetch_add(1, Ordering::SeqCst);
                            let Some(item) = items.get(index) else {
                                break;
                            };
                            let output =
                                item_output_path(input, output_dir, item, options.flat_layout);
                            let result = run_item(catalog, executor, item, input, &output);
                            if sender.send((item.name.clone(), result)).is_err() {
                                break;
                            }
                        }
                    });
                }
                drop(sender);

                // results arrive in completion order, not submission order
                while let Ok((name, result)) = receiver.recv() {
                    observer(&name, &result);
                    let failed = !result.success;
                    batch.record(name, result);
                    if failed && options.strict {
                        // best-effort cancel: in-flight work finishes but no
                        // further completions are accepted
                        stop.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            });
        }
    }

    batch
}

fn effective_concurrency(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4)
    }
}
