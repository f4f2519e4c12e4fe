//! Single-item application command.

use crate::commands::common::{parse_param, ContainerOpts};
use anyhow::bail;
use clap::Args;
use matiz_config::{CatalogContext, ChainStep, EffectsConfig, ParamMap};
use matiz_core::{
    execute_chain, resolve_params, run_effect, run_preset, substitute, validate_overrides,
    ExecutionResult,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ApplyArgs {
    /// Input image
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Effect to apply
    #[arg(short, long)]
    effect: Option<String>,

    /// Composite chain to apply
    #[arg(short, long)]
    composite: Option<String>,

    /// Preset to apply
    #[arg(short, long)]
    preset: Option<String>,

    /// Effect parameters (e.g. --param blur=0x20)
    #[arg(long, value_parser = parse_param, number_of_values = 1)]
    param: Vec<(String, Value)>,

    /// Print the resolved command(s) without running anything
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    container: ContainerOpts,
}

pub fn run(context: &CatalogContext, args: ApplyArgs) -> anyhow::Result<()> {
    let catalog = context.catalog()?;
    let executor = args.container.executor();
    let overrides: ParamMap = args.param.iter().cloned().collect();

    match (&args.effect, &args.composite, &args.preset) {
        (Some(name), None, None) => {
            let Some(effect) = catalog.effect(name) else {
                bail!("Unknown effect: {name}");
            };
            validate_overrides(&catalog, name, &overrides)?;

            if args.dry_run {
                let params = resolve_params(&catalog, name, &overrides);
                println!(
                    "{}",
                    substitute(&effect.command, &args.input, &args.output, &params)
                );
                return Ok(());
            }

            report(run_effect(
                &catalog, &executor, name, &overrides, &args.input, &args.output,
            ))
        }
        (None, Some(name), None) => {
            let Some(composite) = catalog.composite(name) else {
                bail!("Unknown composite: {name}");
            };

            if args.dry_run {
                print_chain_plan(&catalog, &composite.chain, &args.input, &args.output);
                return Ok(());
            }

            report(execute_chain(
                &catalog,
                &executor,
                &composite.chain,
                &args.input,
                &args.output,
            ))
        }
        (None, None, Some(name)) => {
            let Some(preset) = catalog.preset(name) else {
                bail!("Unknown preset: {name}");
            };

            if args.dry_run {
                return dry_run_preset(&catalog, name, preset, &args.input, &args.output);
            }

            report(run_preset(
                &catalog, &executor, name, &args.input, &args.output,
            ))
        }
        _ => bail!("select exactly one of --effect, --composite, or --preset"),
    }
}

fn dry_run_preset(
    catalog: &EffectsConfig,
    name: &str,
    preset: &matiz_config::Preset,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    if let Some(composite_name) = &preset.composite {
        let Some(composite) = catalog.composite(composite_name) else {
            bail!("Preset '{name}' references unknown composite: {composite_name}");
        };
        print_chain_plan(catalog, &composite.chain, input, output);
    } else if let Some(effect_name) = &preset.effect {
        let Some(effect) = catalog.effect(effect_name) else {
            bail!("Preset '{name}' references unknown effect: {effect_name}");
        };
        let params = resolve_params(catalog, effect_name, &preset.params);
        println!("{}", substitute(&effect.command, input, output, &params));
    } else {
        bail!("Preset '{name}' names neither a composite nor an effect");
    }
    Ok(())
}

/// Print each step's substituted command, with symbolic intermediate
/// paths standing in for the chain's temp files.
fn print_chain_plan(catalog: &EffectsConfig, chain: &[ChainStep], input: &Path, output: &Path) {
    let extension = output
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");
    let total = chain.len();
    let mut current_input = input.to_path_buf();

    for (index, step) in chain.iter().enumerate() {
        let step_number = index + 1;
        let step_output = if step_number == total {
            output.to_path_buf()
        } else {
            PathBuf::from(format!("<tmp>/step-{step_number}.{extension}"))
        };

        match catalog.effect(&step.effect) {
            Some(effect) => {
                let params = resolve_params(catalog, &step.effect, &step.params);
                println!(
                    "{step_number}. {}",
                    substitute(&effect.command, &current_input, &step_output, &params)
                );
            }
            None => println!("{step_number}. (unknown effect '{}')", step.effect),
        }
        current_input = step_output;
    }
}

/// Render an execution result for a human; failures exit nonzero.
fn report(result: ExecutionResult) -> anyhow::Result<()> {
    if result.success {
        println!("Done in {:.2}s", result.duration);
        Ok(())
    } else {
        eprintln!("command: {}", result.command);
        bail!("failed: {}", result.stderr.trim_end());
    }
}
