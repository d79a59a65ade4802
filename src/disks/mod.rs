// src/disks/mod.rs

//! Block device listing via `lsblk -J`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

/// One entry of `lsblk -J` output, reduced to the fields the UI shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDevice {
    pub name: String,
    #[serde(default)]
    pub size: serde_json::Value,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub mountpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<BlockDevice>,
}

/// Whether `dev` is a physical disk (not a partition, loop or optical device).
pub fn is_physical_disk(dev: &BlockDevice) -> bool {
    dev.device_type == "disk" && !dev.name.starts_with("loop") && !dev.name.starts_with("sr")
}

/// Parse `lsblk -J` output and keep only physical disks.
pub fn parse_disks(json: &str) -> Result<Vec<BlockDevice>> {
    let output: LsblkOutput = serde_json::from_str(json).context("parsing lsblk JSON output")?;
    Ok(output
        .blockdevices
        .into_iter()
        .filter(is_physical_disk)
        .collect())
}

/// Run the configured listing command and return the physical disks.
pub async fn list_disks(command: &[String]) -> Result<Vec<BlockDevice>> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("disk listing command is empty"))?;

    debug!(program = %program, args = ?args, "listing block devices");
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .with_context(|| format!("running '{program}'"))?;

    if !output.status.success() {
        return Err(anyhow!(
            "'{program}' exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    parse_disks(&String::from_utf8_lossy(&output.stdout))
}
