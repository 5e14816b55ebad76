//! Factory preset commands.

use clap::{Args, Subcommand};
use patchbay_config::factory_presets;

use super::common::resolve_preset;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List factory presets
    List,

    /// Show the chain of a preset
    Show {
        /// Preset id, name, or path to a preset TOML file
        name: String,

        /// Print the preset as TOML
        #[arg(long)]
        toml: bool,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List => {
            list_presets();
            Ok(())
        }
        PresetsCommand::Show { name, toml } => show_preset(&name, toml),
    }
}

fn list_presets() {
    println!("Factory Presets:");
    println!("================");
    for preset in factory_presets() {
        let desc = preset.description.as_deref().unwrap_or("");
        println!("  {:16} {:20} - {}", preset.id, preset.name, desc);
    }
}

fn show_preset(name: &str, as_toml: bool) -> anyhow::Result<()> {
    let preset = resolve_preset(name)?;
    if as_toml {
        print!("{}", preset.to_toml()?);
        return Ok(());
    }

    println!("{}", preset.name);
    println!("{}", "=".repeat(preset.name.chars().count()));
    if let Some(desc) = &preset.description {
        println!("{desc}");
    }
    println!();
    println!("Chain: sources -> {} -> master", chain_ids(&preset.chain));
    println!();
    for step in &preset.chain {
        let params = step.to_params()?;
        let values: Vec<String> = params
            .values()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        let bypass = if step.bypassed { " (bypassed)" } else { "" };
        println!("  {:6} {:12}{} {}", step.key, step.effect, bypass, values.join(" "));
    }
    Ok(())
}

fn chain_ids(chain: &[patchbay_config::ChainStep]) -> String {
    chain
        .iter()
        .map(|s| s.effect.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
