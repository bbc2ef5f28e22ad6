//! Bateria via `/sys/class/power_supply`.

use super::{Provider, ProviderError, Reading};
use std::path::{Path, PathBuf};

const POWER_SUPPLY: &str = "/sys/class/power_supply";

pub struct BatteryProvider {
    dir: PathBuf,
}

impl BatteryProvider {
    pub fn new(device: &str) -> Self {
        Self::with_dir(Path::new(POWER_SUPPLY).join(device))
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn read(&self) -> Result<String, ProviderError> {
        let capacity = read_trimmed(&self.dir.join("capacity"))?;
        let capacity: u8 = capacity
            .parse()
            .map_err(|_| ProviderError::Parse(capacity.clone()))?;
        let status = read_trimmed(&self.dir.join("status"))?;
        Ok(format_battery(capacity, &status))
    }
}

impl Provider for BatteryProvider {
    fn poll(&mut self) -> Reading {
        Reading::from_result(self.read(), "Battery: ?")
    }
}

fn read_trimmed(path: &Path) -> Result<String, ProviderError> {
    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

/// `Battery: 80% (Charging)`; o estado é omitido quando a bateria está cheia
/// ou o kernel não sabe.
fn format_battery(capacity: u8, status: &str) -> String {
    match status {
        "Full" | "Unknown" | "" => format!("Battery: {capacity}%"),
        other => format!("Battery: {capacity}% ({other})"),
    }
}
