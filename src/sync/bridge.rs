//! Access to attached devices

use std::process::Command;

use log::debug;

use crate::error::{CassetteError, Result};
use crate::topology::PhoneModel;

/// Receiver service started on the device.
pub const RECEIVER_SERVICE: &str = "com.glyph.receiver/.MainService";

/// Attached-device operations needed for live preview.
pub trait DeviceBridge: Send + Sync {
    /// Serials of the devices currently attached.
    fn devices(&self) -> Result<Vec<String>>;

    /// Phone model of a device, `None` for hardware without a known model.
    fn product_model(&self, device: &str) -> Result<Option<PhoneModel>>;

    /// Forward `port` to the device and start the receiver service.
    fn prepare(&self, device: &str, port: u16) -> Result<()>;
}

/// Serials listed by `adb devices`, skipping the header and devices that
/// are not ready.
pub fn parse_device_list(output: &str) -> Vec<String> {
    output
        .trim()
        .lines()
        .skip(1)
        .filter(|line| line.contains("device"))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// [`DeviceBridge`] backed by the `adb` executable.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    adb_path: String,
}

impl AdbBridge {
    pub fn new(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!("{} {}", self.adb_path, args.join(" "));
        let output = Command::new(&self.adb_path)
            .args(args)
            .output()
            .map_err(|e| CassetteError::ExternalTool {
                tool: self.adb_path.clone(),
                stderr: format!("failed to start: {}", e),
            })?;

        if !output.status.success() {
            return Err(CassetteError::ExternalTool {
                tool: self.adb_path.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DeviceBridge for AdbBridge {
    fn devices(&self) -> Result<Vec<String>> {
        self.run(&["start-server"])?;
        Ok(parse_device_list(&self.run(&["devices"])?))
    }

    fn product_model(&self, device: &str) -> Result<Option<PhoneModel>> {
        let product = self.run(&["-s", device, "shell", "getprop", "ro.product.model"])?;
        Ok(PhoneModel::from_product_code(product.trim()))
    }

    fn prepare(&self, device: &str, port: u16) -> Result<()> {
        let forward = format!("tcp:{}", port);
        self.run(&["-s", device, "forward", &forward, &forward])?;
        self.run(&[
            "-s",
            device,
            "shell",
            "settings",
            "put",
            "global",
            "nt_glyph_interface_debug_enable",
            "1",
        ])?;
        self.run(&[
            "-s",
            device,
            "shell",
            "am",
            "start-foreground-service",
            "-n",
            RECEIVER_SERVICE,
        ])?;
        Ok(())
    }
}
