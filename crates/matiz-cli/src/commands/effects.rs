//! Effect listing and information command.

use clap::Args;
use matiz_config::{CatalogContext, EffectsConfig, ParameterDefinition};
use matiz_core::stringify;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,
}

pub fn run(context: &CatalogContext, args: EffectsArgs) -> anyhow::Result<()> {
    let catalog = context.catalog()?;

    if let Some(effect_name) = &args.effect {
        let effect = catalog
            .effect(effect_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect: {}", effect_name))?;

        println!("{}", effect_name);
        println!("{}", "=".repeat(effect_name.len()));
        println!();
        println!("{}", effect.description);
        println!();
        println!("Command template:");
        println!("  {}", effect.command);
        println!();

        if effect.parameters.is_empty() {
            println!("No parameters.");
        } else {
            println!("Parameters:");
            println!();
            println!("  {:12}  {:14}  {:12}  {}", "Name", "Type", "Default", "Flag");
            println!("  {:12}  {:14}  {:12}  {}", "----", "----", "-------", "----");
            for (name, definition) in &effect.parameters {
                println!(
                    "  {:12}  {:14}  {:12}  {}",
                    name,
                    definition.param_type,
                    effective_default(&catalog, definition),
                    definition.cli_flag.as_deref().unwrap_or("-"),
                );
            }
        }

        println!();
        println!("Example usage:");
        println!();
        match effect.parameters.iter().next() {
            Some((name, definition)) => println!(
                "  matiz apply wall.png out.png --effect {} --param {}={}",
                effect_name,
                name,
                effective_default(&catalog, definition),
            ),
            None => println!("  matiz apply wall.png out.png --effect {}", effect_name),
        }
    } else {
        println!("Available Effects");
        println!("=================");
        println!();

        for (name, effect) in &catalog.effects {
            println!("  {:15} - {}", name, effect.description);
        }

        println!();
        println!("Use 'matiz effects <name>' for detailed parameter info.");
    }

    Ok(())
}

/// The default that parameter resolution would pick: effect-level first,
/// then the parameter type's.
fn effective_default(catalog: &EffectsConfig, definition: &ParameterDefinition) -> String {
    definition
        .default
        .as_ref()
        .or_else(|| {
            catalog
                .parameter_type(&definition.param_type)
                .and_then(|parameter_type| parameter_type.default.as_ref())
        })
        .map(stringify)
        .unwrap_or_else(|| "-".to_string())
}
