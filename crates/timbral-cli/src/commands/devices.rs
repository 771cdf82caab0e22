//! Audio device listing command.

use clap::{Args, Subcommand};
use timbral_io::{AudioBackend, CpalBackend};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all output devices
    List,

    /// Show default output device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();

    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = backend.list_devices()?;

            if devices.is_empty() {
                println!("No audio output devices found.");
                return Ok(());
            }

            println!("Output Devices ({})", backend.name());
            println!("==============\n");
            for device in &devices {
                let marker = if device.is_default { " (default)" } else { "" };
                println!(
                    "  [{}] {} ({} Hz, {} ch){}",
                    device.index,
                    device.name,
                    device.default_sample_rate,
                    device.default_channels,
                    marker
                );
            }
            println!();
            println!("Tip: Use device index or partial name with --device:");
            println!("  timbral play --device 0");
            println!("  timbral play --device \"USB\" --midi-in 0");
        }

        DevicesCommand::Info => match backend.default_output_device()? {
            Some(device) => {
                println!("Default Output:");
                println!("  Name: {}", device.name);
                println!("  Sample Rate: {} Hz", device.default_sample_rate);
                println!("  Channels: {}", device.default_channels);
            }
            None => println!("Default Output: None"),
        },
    }

    Ok(())
}
