//! Saved scene commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use patchbay_config::{DirStore, SceneLibrary, scenes_dir};

use super::common::{load_settings, resolve_preset};

#[derive(Args)]
pub struct ScenesArgs {
    /// Scene directory (defaults to the user config directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: ScenesCommand,
}

#[derive(Subcommand)]
enum ScenesCommand {
    /// List saved scenes
    List,

    /// Print a saved scene as JSON
    Show {
        /// Scene name
        name: String,
    },

    /// Save a preset's expansion as a named scene
    Save {
        /// Scene name
        name: String,

        /// Preset id, name, or path to a preset TOML file
        #[arg(short, long)]
        preset: String,

        /// Settings file (defaults to the user config file)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overwrite an existing scene
        #[arg(long)]
        force: bool,
    },

    /// Delete a saved scene
    Delete {
        /// Scene name
        name: String,
    },

    /// Show the scene directory
    Path,
}

pub fn run(args: ScenesArgs) -> anyhow::Result<()> {
    let dir = args.dir.unwrap_or_else(scenes_dir);
    let mut library = SceneLibrary::new(DirStore::new(&dir));

    match args.command {
        ScenesCommand::List => {
            let names = library.names();
            if names.is_empty() {
                println!("(no saved scenes)");
            }
            for name in names {
                println!("  {name}");
            }
        }
        ScenesCommand::Show { name } => {
            let scene = library
                .load(&name)
                .ok_or_else(|| anyhow::anyhow!("Scene not found: {name}"))?;
            println!("{}", serde_json::to_string_pretty(&scene)?);
        }
        ScenesCommand::Save {
            name,
            preset,
            config,
            force,
        } => {
            if !force && library.load(&name).is_some() {
                anyhow::bail!("Scene '{name}' already exists. Use --force to overwrite.");
            }
            let settings = load_settings(config.as_deref())?;
            let preset = resolve_preset(&preset)?;
            let scene = preset.to_scene(0..settings.channel_count)?;
            library.save(&name, &scene)?;
            println!("Saved scene '{name}' ({} effects)", scene.nodes.len());
        }
        ScenesCommand::Delete { name } => {
            if library.delete(&name)? {
                println!("Deleted scene '{name}'");
            } else {
                anyhow::bail!("Scene not found: {name}");
            }
        }
        ScenesCommand::Path => println!("{}", dir.display()),
    }
    Ok(())
}
