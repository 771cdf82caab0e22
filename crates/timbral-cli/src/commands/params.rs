//! Parameter listing command.

use clap::Args;
use timbral_core::{GlobalParam, ParamScale, RampCurve};
use timbral_synth::{StealPolicy, WaveShape};

#[derive(Args)]
pub struct ParamsArgs {
    /// Show only this parameter
    name: Option<String>,
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let params: Vec<GlobalParam> = match &args.name {
        Some(name) => vec![
            GlobalParam::from_name(name)
                .ok_or_else(|| anyhow::anyhow!("unknown parameter '{name}'"))?,
        ],
        None => GlobalParam::ALL.to_vec(),
    };

    println!("Global Parameters");
    println!("=================\n");
    println!(
        "  {:<12} {:<12} {:>10} {:>10} {:>10}  {}",
        "ID", "Name", "Min", "Max", "Default", "Scale"
    );
    for param in params {
        let d = param.descriptor();
        let unit = d.unit.suffix();
        let scale = match d.scale {
            ParamScale::Linear => "linear",
            ParamScale::Logarithmic => "log",
        };
        println!(
            "  {:<12} {:<12} {:>10} {:>10} {:>10}  {}",
            d.string_id,
            d.name,
            format!("{}{unit}", d.min),
            format!("{}{unit}", d.max),
            format!("{}{unit}", d.default),
            scale
        );
    }

    if args.name.is_none() {
        let join = |names: Vec<&str>| names.join(", ");
        println!();
        println!("Engine Settings");
        println!("===============\n");
        println!(
            "  steal_policy     {}",
            join(StealPolicy::ALL.iter().map(|p| p.name()).collect())
        );
        println!(
            "  primary_shape    {}",
            join(WaveShape::ALL.iter().map(|s| s.name()).collect())
        );
        println!("  secondary_shape  (as primary_shape)");
        println!(
            "  ramp_curve       {}",
            join(RampCurve::ALL.iter().map(|c| c.name()).collect())
        );
        println!("  table_length     power of two, at least 4");
        println!("  pressure_depth   0 to 1");
        println!("  timbre_depth     0 to 1");
        println!();
        println!("Set globals with --set, e.g. timbral render -o out.wav --set cutoff=1200");
    }

    Ok(())
}
