//! Output device discovery via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio output device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Position in the host's output device list.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default channel count.
    pub default_channels: u16,
    /// Whether this is the host's default output.
    pub is_default: bool,
}

fn describe(index: usize, device: &Device, default_name: Option<&str>) -> Option<AudioDevice> {
    let name = device_name(device).ok()?;
    let (sample_rate, channels) = device
        .default_output_config()
        .map(|c| (c.sample_rate(), c.channels()))
        .unwrap_or((48000, 2));
    Some(AudioDevice {
        index,
        is_default: default_name == Some(name.as_str()),
        name,
        default_sample_rate: sample_rate,
        default_channels: channels,
    })
}

/// List the output devices of the default host.
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .enumerate()
        .filter_map(|(i, d)| describe(i, &d, default_name.as_deref()))
        .collect();
    Ok(devices)
}

/// The default host's default output device, if any.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host.default_output_device().and_then(|d| {
        let name = device_name(&d).ok();
        describe(0, &d, name.as_deref())
    }))
}

/// Find an output device by exact name, partial name, or index.
///
/// `None` selects the host default.
pub(crate) fn find_output_device(host: &Host, name_or_index: Option<&str>) -> Result<Device> {
    let Some(query) = name_or_index else {
        return host.default_output_device().ok_or(Error::NoDevice);
    };

    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();

    let index = select_device(&names, query)?;
    devices
        .get(index)
        .cloned()
        .ok_or_else(|| Error::DeviceNotFound(query.to_string()))
}

/// Resolve a device query against a list of names.
///
/// Tries, in order: a numeric index, an exact name, then a case-insensitive
/// substring. Several substring matches resolve to the first with a warning.
pub fn select_device(names: &[String], name_or_index: &str) -> Result<usize> {
    if let Ok(index) = name_or_index.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                names.len()
            )))
        };
    }

    if let Some(index) = names.iter().position(|n| n == name_or_index) {
        return Ok(index);
    }

    let search_lower = name_or_index.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.to_lowercase().contains(&search_lower))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            name_or_index
        ))),
        [only] => Ok(*only),
        [first, ..] => {
            tracing::warn!(
                query = name_or_index,
                count = matches.len(),
                using = names[*first].as_str(),
                "device query is ambiguous"
            );
            Ok(*first)
        }
    }
}
