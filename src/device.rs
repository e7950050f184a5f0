//! Touchpad discovery through `libinput list-devices`.

use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub kernel: PathBuf,
    pub capabilities: Vec<String>,
}

impl DeviceInfo {
    pub fn has_gestures(&self) -> bool {
        self.capabilities.iter().any(|cap| cap == "gesture")
    }
}

/// Which devices `libinput debug-events` should listen to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelection {
    All,
    Node(PathBuf),
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to run libinput list-devices: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("libinput list-devices failed: {0}")]
    Failed(String),
    #[error("no device named '{0}'")]
    NotFound(String),
    #[error("no touchpad with gesture support found")]
    NoTouchpad,
}

/// Split `libinput list-devices` output into device records.
pub fn parse_device_list(listing: &str) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();
    let mut current: Option<DeviceInfo> = None;

    for line in listing.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Device" => {
                devices.extend(current.take());
                current = Some(DeviceInfo {
                    name: value.to_string(),
                    ..DeviceInfo::default()
                });
            }
            "Kernel" => {
                if let Some(device) = current.as_mut() {
                    device.kernel = PathBuf::from(value);
                }
            }
            "Capabilities" => {
                if let Some(device) = current.as_mut() {
                    device.capabilities = value.split_whitespace().map(str::to_string).collect();
                }
            }
            _ => {}
        }
    }
    devices.extend(current);
    devices
}

/// Does the setting pick a device without asking libinput?
pub fn select_directly(setting: Option<&str>) -> Option<DeviceSelection> {
    match setting.map(str::trim) {
        Some(all) if all.eq_ignore_ascii_case("all") => Some(DeviceSelection::All),
        Some(path) if path.starts_with('/') => Some(DeviceSelection::Node(PathBuf::from(path))),
        _ => None,
    }
}

pub fn select_device(
    setting: Option<&str>,
    devices: &[DeviceInfo],
) -> Result<DeviceSelection, DeviceError> {
    if let Some(selection) = select_directly(setting) {
        return Ok(selection);
    }

    let device = match setting.map(str::trim) {
        Some(name) => devices
            .iter()
            .find(|device| device.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DeviceError::NotFound(name.to_string()))?,
        None => devices
            .iter()
            .find(|device| device.has_gestures())
            .ok_or(DeviceError::NoTouchpad)?,
    };
    Ok(DeviceSelection::Node(device.kernel.clone()))
}

pub async fn list_devices() -> Result<Vec<DeviceInfo>, DeviceError> {
    let output = Command::new("libinput").arg("list-devices").output().await?;
    if !output.status.success() {
        return Err(DeviceError::Failed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    let devices = parse_device_list(&String::from_utf8_lossy(&output.stdout));
    debug!(count = devices.len(), "libinput devices listed");
    Ok(devices)
}

pub async fn resolve(setting: Option<&str>) -> Result<DeviceSelection, DeviceError> {
    let selection = match select_directly(setting) {
        Some(selection) => selection,
        None => select_device(setting, &list_devices().await?)?,
    };
    info!(device = ?selection, "using gesture device");
    Ok(selection)
}
