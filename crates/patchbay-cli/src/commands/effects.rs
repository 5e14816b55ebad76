//! Effect catalog listing and details.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use patchbay_core::{DeviceScale, EffectKind, EffectScope};

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let Some(name) = &args.effect else {
        list_effects();
        return Ok(());
    };

    let kind = EffectKind::from_id(name)
        .or_else(|| {
            EffectKind::ALL
                .iter()
                .copied()
                .find(|k| k.label().eq_ignore_ascii_case(name))
        })
        .ok_or_else(|| anyhow::anyhow!("Unknown effect: {name}"))?;

    let title = format!("{} ({})", kind.label(), kind.id());
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count()));
    println!();
    println!("{}", kind.description());
    println!();
    println!("Category: {}", kind.category().name());
    let scope = match kind.scope() {
        EffectScope::PerChannel => "per channel",
        EffectScope::Global => "device-wide",
    };
    println!("Scope:    {scope}");
    println!();

    println!("Parameters:");
    println!();
    println!(
        "  {:10}  {:14}  {:12}  {:24}  {}",
        "Key", "Name", "Default", "Range", "Device"
    );
    println!(
        "  {:10}  {:14}  {:12}  {:24}  {}",
        "---", "----", "-------", "-----", "------"
    );
    for desc in kind.params() {
        let range = if desc.is_enumerated() {
            desc.choices.join(" | ")
        } else {
            format!("{} .. {}", desc.format_value(desc.min), desc.format_value(desc.max))
        };
        let device = match desc.device {
            DeviceScale::AsIs => "as is".to_string(),
            DeviceScale::Round => "rounded".to_string(),
            DeviceScale::Linear { lo, hi } => format!("{lo} .. {hi}"),
        };
        println!(
            "  {:10}  {:14}  {:12}  {:24}  {}",
            desc.key,
            desc.name,
            desc.format_value(desc.default),
            range,
            device
        );
    }
    Ok(())
}

fn list_effects() {
    println!("Available Effects");
    println!("=================");
    println!();
    for kind in EffectKind::ALL {
        println!(
            "  {:12} {:12} {:12} - {}",
            kind.id(),
            kind.label(),
            kind.category().name(),
            kind.description()
        );
    }
    println!();
    println!("Use 'patchbay effects <id>' for detailed parameter info.");
}
