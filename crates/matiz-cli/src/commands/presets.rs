//! Preset and composite listing command.

use clap::Args;
use matiz_config::CatalogContext;
use matiz_core::stringify;

#[derive(Args)]
pub struct PresetsArgs {
    /// Show details for a specific preset or composite
    #[arg(value_name = "NAME")]
    name: Option<String>,
}

pub fn run(context: &CatalogContext, args: PresetsArgs) -> anyhow::Result<()> {
    let catalog = context.catalog()?;

    if let Some(name) = &args.name {
        if let Some(preset) = catalog.preset(name) {
            println!("{name} (preset)");
            println!("{}", "=".repeat(name.len()));
            println!();
            println!("{}", preset.description);
            println!();
            match (&preset.composite, &preset.effect) {
                (Some(composite), _) => println!("Runs composite: {composite}"),
                (None, Some(effect)) => {
                    println!("Runs effect: {effect}");
                    for (param, value) in &preset.params {
                        println!("  {param} = {}", stringify(value));
                    }
                }
                (None, None) => println!("(names neither a composite nor an effect)"),
            }
            println!();
            println!("  matiz apply wall.png out.png --preset {name}");
        } else if let Some(composite) = catalog.composite(name) {
            println!("{name} (composite)");
            println!("{}", "=".repeat(name.len()));
            println!();
            println!("{}", composite.description);
            println!();
            println!("Chain:");
            for (index, step) in composite.chain.iter().enumerate() {
                let params: Vec<String> = step
                    .params
                    .iter()
                    .map(|(param, value)| format!("{param}={}", stringify(value)))
                    .collect();
                if params.is_empty() {
                    println!("  {}. {}", index + 1, step.effect);
                } else {
                    println!("  {}. {} ({})", index + 1, step.effect, params.join(", "));
                }
            }
            println!();
            println!("  matiz apply wall.png out.png --composite {name}");
        } else {
            anyhow::bail!("Unknown preset or composite: {}", name);
        }
    } else {
        println!("Presets:");
        println!("========");
        for (name, preset) in &catalog.presets {
            let target = match (&preset.composite, &preset.effect) {
                (Some(composite), _) => format!("composite {composite}"),
                (None, Some(effect)) => format!("effect {effect}"),
                (None, None) => "unbound".to_string(),
            };
            println!("  {:15} - {} [{}]", name, preset.description, target);
        }

        println!();
        println!("Composites:");
        println!("===========");
        for (name, composite) in &catalog.composites {
            println!(
                "  {:15} - {} ({} steps)",
                name,
                composite.description,
                composite.chain.len()
            );
        }

        println!();
        println!("Use 'matiz presets <name>' for details.");
    }

    Ok(())
}
