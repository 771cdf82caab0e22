//! Patch management commands.
//!
//! List, show, save and delete patches.

use super::common::{apply_overrides, load_patch, parse_global};
use clap::{Args, Subcommand};
use timbral_config::{
    Patch, ensure_user_patches_dir, factory_patches, is_factory_patch, list_user_patches,
    patch_name_from_path, user_config_dir, user_patches_dir,
};
use timbral_core::GlobalParam;

#[derive(Args)]
pub struct PatchesArgs {
    #[command(subcommand)]
    command: PatchesCommand,
}

#[derive(Subcommand)]
enum PatchesCommand {
    /// List available patches (factory and user)
    List {
        /// Show only factory patches
        #[arg(long)]
        factory: bool,

        /// Show only user patches
        #[arg(long)]
        user: bool,
    },

    /// Show details of a patch
    Show {
        /// Patch name or path
        name: String,

        /// Print the patch as TOML
        #[arg(long)]
        toml: bool,
    },

    /// Save a patch to the user patches directory
    Save {
        /// File name for the new patch
        name: String,

        /// Patch to start from
        #[arg(long, default_value = "init")]
        from: String,

        /// Global parameter override, e.g. "release=2.0"
        #[arg(long = "set", value_parser = parse_global, number_of_values = 1)]
        set: Vec<(String, f32)>,

        /// Description of the patch
        #[arg(short, long)]
        description: Option<String>,

        /// Overwrite if the patch already exists
        #[arg(long)]
        force: bool,
    },

    /// Delete a user patch
    Delete {
        /// Patch name to delete
        name: String,
    },

    /// Show patch directories
    Paths,
}

pub fn run(args: PatchesArgs) -> anyhow::Result<()> {
    match args.command {
        PatchesCommand::List { factory, user } => list_patches(factory, user),
        PatchesCommand::Show { name, toml } => show_patch(&name, toml),
        PatchesCommand::Save {
            name,
            from,
            set,
            description,
            force,
        } => save_patch(&name, &from, &set, description, force),
        PatchesCommand::Delete { name } => delete_patch(&name),
        PatchesCommand::Paths => {
            println!("User config:  {}", user_config_dir().display());
            println!("User patches: {}", user_patches_dir().display());
            Ok(())
        }
    }
}

fn list_patches(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    if !user_only {
        println!("Factory Patches:");
        println!("================");
        for patch in factory_patches() {
            let desc = patch.description.as_deref().unwrap_or("");
            println!("  {:20} - {}", patch.name, desc);
        }
        println!();
    }

    if !factory_only {
        println!("User Patches:");
        println!("=============");
        let user_patches = list_user_patches();
        if user_patches.is_empty() {
            println!("  (none)");
            println!();
            println!("  Create one with: timbral patches save <name> --from soft_pad\n");
        } else {
            for path in user_patches {
                let name = patch_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
                match Patch::load(&path) {
                    Ok(patch) => {
                        let desc = patch.description.as_deref().unwrap_or("");
                        println!("  {name:20} - {desc}");
                    }
                    Err(_) => println!("  {name:20} - (error loading)"),
                }
            }
            println!();
        }
    }

    Ok(())
}

fn show_patch(name: &str, as_toml: bool) -> anyhow::Result<()> {
    let patch = load_patch(Some(name))?;

    if as_toml {
        print!("{}", patch.to_toml()?);
        return Ok(());
    }

    println!("Patch: {}", patch.name);
    println!("{}", "=".repeat(7 + patch.name.len()));
    println!();

    if let Some(desc) = &patch.description {
        println!("Description: {desc}");
        println!();
    }

    let e = &patch.engine;
    println!("Engine:");
    println!("  polyphony        {}", e.polyphony);
    println!("  steal_policy     {}", e.steal_policy);
    println!("  table_length     {}", e.table_length);
    println!("  primary_shape    {}", e.primary_shape);
    println!("  secondary_shape  {}", e.secondary_shape);
    println!("  smoothing_time   {} s", e.smoothing_time);
    println!("  ramp_curve       {}", e.ramp_curve);
    println!("  pressure_depth   {}", e.pressure_depth);
    println!("  timbre_depth     {}", e.timbre_depth);
    println!();

    println!("Globals:");
    for param in GlobalParam::ALL {
        let d = param.descriptor();
        println!(
            "  {:<16} {}{}",
            d.string_id,
            patch.globals.get(param),
            d.unit.suffix()
        );
    }

    Ok(())
}

fn save_patch(
    name: &str,
    from: &str,
    overrides: &[(String, f32)],
    description: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    if is_factory_patch(name) {
        anyhow::bail!("'{name}' is a factory patch name; choose another");
    }

    let path = ensure_user_patches_dir()?.join(format!("{name}.toml"));
    if path.exists() && !force {
        anyhow::bail!("patch '{name}' already exists. Use --force to overwrite.");
    }

    let mut patch = load_patch(Some(from))?;
    apply_overrides(&mut patch, overrides)?;
    patch.name = name.to_string();
    if description.is_some() {
        patch.description = description;
    }
    timbral_config::validate_patch(&patch)?;
    patch.save(&path)?;

    println!("Saved patch '{}' to {}", name, path.display());
    Ok(())
}

fn delete_patch(name: &str) -> anyhow::Result<()> {
    let path = user_patches_dir().join(format!("{name}.toml"));
    if !path.is_file() {
        anyhow::bail!("no user patch named '{name}' in {}", user_patches_dir().display());
    }
    std::fs::remove_file(&path)?;
    println!("Deleted {}", path.display());
    Ok(())
}
