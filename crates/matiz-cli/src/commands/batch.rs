//! Batch application command.

use crate::commands::common::ContainerOpts;
use anyhow::bail;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use matiz_config::CatalogContext;
use matiz_core::{run_batch_observed, BatchItem, BatchMode, BatchOptions};
use std::path::PathBuf;

#[derive(Args)]
pub struct BatchArgs {
    /// Input image
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Base directory for outputs
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Effects to include (repeatable)
    #[arg(short, long = "effect")]
    effects: Vec<String>,

    /// Composites to include (repeatable)
    #[arg(short, long = "composite")]
    composites: Vec<String>,

    /// Presets to include (repeatable)
    #[arg(short, long = "preset")]
    presets: Vec<String>,

    /// Include every effect in the catalog
    #[arg(long)]
    all_effects: bool,

    /// Include every composite in the catalog
    #[arg(long)]
    all_composites: bool,

    /// Include every preset in the catalog
    #[arg(long)]
    all_presets: bool,

    /// Run items concurrently
    #[arg(long)]
    parallel: bool,

    /// Worker cap for --parallel (0 picks the hardware parallelism)
    #[arg(long, default_value = "0")]
    jobs: usize,

    /// Stop at the first failure
    #[arg(long)]
    strict: bool,

    /// Write outputs without per-kind subdirectories
    #[arg(long)]
    flat: bool,

    #[command(flatten)]
    container: ContainerOpts,
}

pub fn run(context: &CatalogContext, args: BatchArgs) -> anyhow::Result<()> {
    let catalog = context.catalog()?;
    let executor = args.container.executor();

    let mut items: Vec<BatchItem> = Vec::new();
    if args.all_effects {
        items.extend(catalog.effects.keys().map(BatchItem::effect));
    } else {
        items.extend(args.effects.iter().map(BatchItem::effect));
    }
    if args.all_composites {
        items.extend(catalog.composites.keys().map(BatchItem::composite));
    } else {
        items.extend(args.composites.iter().map(BatchItem::composite));
    }
    if args.all_presets {
        items.extend(catalog.presets.keys().map(BatchItem::preset));
    } else {
        items.extend(args.presets.iter().map(BatchItem::preset));
    }

    if items.is_empty() {
        bail!("Nothing to run. Use --effect/--composite/--preset or an --all-* flag");
    }

    println!(
        "Applying {} item(s) to {}...",
        items.len(),
        args.input.display()
    );

    let options = BatchOptions {
        mode: if args.parallel {
            BatchMode::Parallel
        } else {
            BatchMode::Sequential
        },
        strict: args.strict,
        max_concurrency: args.jobs,
        flat_layout: args.flat,
    };

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("##-"),
    );

    let batch = run_batch_observed(
        &catalog,
        &executor,
        &items,
        &args.input,
        &args.output_dir,
        &options,
        |_, _| pb.inc(1),
    );
    pb.finish_and_clear();

    println!(
        "{} succeeded, {} failed (of {})",
        batch.succeeded, batch.failed, batch.total
    );
    let mut failures: Vec<_> = batch
        .results
        .iter()
        .filter(|(_, result)| !result.success)
        .collect();
    failures.sort_by_key(|(name, _)| name.as_str());
    for (name, result) in failures {
        let reason = result.stderr.lines().next().unwrap_or("unknown error");
        println!("  {name}: {reason}");
    }

    if !batch.success() {
        bail!("batch failed");
    }
    println!("Outputs under {}", batch.output_dir.display());
    Ok(())
}
