//! RAM, CPU, GPU e rede via `sysinfo`.
//!
//! Cada provider tem suas próprias estruturas `sysinfo`, já que roda na
//! thread da sua task. Temperaturas vêm de `Components`, escolhidas pelo
//! nome do dispositivo hwmon e pelo label do sensor (ex: `k10temp` +
//! `Tdie`).

use super::{Provider, ProviderError, Reading};
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Components, CpuRefreshKind, MemoryRefreshKind, Networks, RefreshKind, System};
use tracing::debug;

// ──────────────────────────────────────────────
// RAM
// ──────────────────────────────────────────────

pub struct RamProvider {
    sys: System,
}

impl RamProvider {
    pub fn new() -> Self {
        Self {
            sys: System::new_with_specifics(
                RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
            ),
        }
    }
}

impl Provider for RamProvider {
    fn poll(&mut self) -> Reading {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Reading::Degraded {
                text: "RAM: ?".into(),
                cause: ProviderError::Parse("memória total = 0".into()),
            };
        }
        let percent = self.sys.used_memory() as f64 / total as f64 * 100.0;
        Reading::Fresh(format!("RAM: {percent:.0}%"))
    }
}

// ──────────────────────────────────────────────
// CPU
// ──────────────────────────────────────────────

pub struct CpuProvider {
    sys: System,
    components: Components,
    device: String,
    label: String,
}

impl CpuProvider {
    pub fn new(device: String, label: String) -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
        );
        // Primeira leitura para inicializar contadores de uso
        sys.refresh_cpu_all();
        Self {
            sys,
            components: Components::new_with_refreshed_list(),
            device,
            label,
        }
    }

    fn read(&mut self) -> Result<String, ProviderError> {
        self.sys.refresh_cpu_all();
        self.components.refresh(true);
        let temp = component_temp(&self.components, &self.device, &self.label)?;
        let usage = self.sys.global_cpu_usage();
        Ok(format!("CPU: {temp:.0}°C {usage:.0}%"))
    }
}

impl Provider for CpuProvider {
    fn poll(&mut self) -> Reading {
        Reading::from_result(self.read(), "CPU: ?")
    }
}

// ──────────────────────────────────────────────
// GPU
// ──────────────────────────────────────────────

pub struct GpuProvider {
    components: Components,
    device: String,
    label: String,
    busy_path: PathBuf,
}

impl GpuProvider {
    pub fn new(device: String, label: String, busy_path: PathBuf) -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
            device,
            label,
            busy_path,
        }
    }

    fn read(&mut self) -> Result<String, ProviderError> {
        self.components.refresh(true);
        let temp = component_temp(&self.components, &self.device, &self.label)?;
        match read_busy_percent(&self.busy_path) {
            Ok(busy) => Ok(format!("GPU: {temp:.0}°C {busy}%")),
            Err(e) => {
                debug!("Utilização da GPU indisponível: {e}");
                Ok(format!("GPU: {temp:.0}°C"))
            }
        }
    }
}

impl Provider for GpuProvider {
    fn poll(&mut self) -> Reading {
        Reading::from_result(self.read(), "GPU: ?")
    }
}

fn read_busy_percent(path: &std::path::Path) -> Result<u32, ProviderError> {
    let raw = std::fs::read_to_string(path)?;
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::Parse(raw.trim().into()))
}

fn component_temp(components: &Components, device: &str, label: &str) -> Result<f32, ProviderError> {
    find_sensor(
        components.iter().map(|c| (c.label(), c.temperature())),
        device,
        label,
    )
    .ok_or_else(|| ProviderError::MissingSensor(format!("{device} {label}")))
}

/// Procura o sensor cujo label contém o dispositivo e o label pedidos.
fn find_sensor<'a>(
    sensors: impl Iterator<Item = (&'a str, Option<f32>)>,
    device: &str,
    label: &str,
) -> Option<f32> {
    let device = device.to_lowercase();
    let label = label.to_lowercase();
    sensors
        .filter(|(name, _)| {
            let name = name.to_lowercase();
            name.contains(&device) && name.contains(&label)
        })
        .find_map(|(_, temp)| temp.filter(|t| t.is_finite() && *t < 150.0))
}

// ──────────────────────────────────────────────
// Rede
// ──────────────────────────────────────────────

pub struct NetProvider {
    networks: Networks,
    /// Bytes do último ciclo (recv, sent, timestamp)
    last: Option<(u64, u64, Instant)>,
}

impl NetProvider {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            last: None,
        }
    }
}

impl Provider for NetProvider {
    fn poll(&mut self) -> Reading {
        self.networks.refresh(true);

        let mut total_recv: u64 = 0;
        let mut total_sent: u64 = 0;
        for (_name, data) in self.networks.iter() {
            total_recv += data.total_received();
            total_sent += data.total_transmitted();
        }

        let now = Instant::now();
        let (down, up) = match self.last {
            Some((last_recv, last_sent, last_time)) => {
                let dt = now.duration_since(last_time).as_secs_f64();
                (
                    rate(last_recv, total_recv, dt),
                    rate(last_sent, total_sent, dt),
                )
            }
            None => (0.0, 0.0),
        };
        self.last = Some((total_recv, total_sent, now));

        Reading::Fresh(format!("Net: ↓{} ↑{}", human_rate(down), human_rate(up)))
    }
}

/// Bytes por segundo entre duas leituras de contador.
fn rate(before: u64, after: u64, dt: f64) -> f64 {
    if dt > 0.0 {
        after.saturating_sub(before) as f64 / dt
    } else {
        0.0
    }
}

fn human_rate(bytes_per_sec: f64) -> String {
    const KIB: f64 = 1024.0;
    if bytes_per_sec < KIB {
        format!("{bytes_per_sec:.0}B")
    } else if bytes_per_sec < KIB * KIB {
        format!("{:.1}K", bytes_per_sec / KIB)
    } else {
        format!("{:.1}M", bytes_per_sec / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sensor_by_device_and_label() {
        let sensors = [
            ("nvme Composite", Some(40.0)),
            ("k10temp Tctl", Some(70.0)),
            ("k10temp Tdie", Some(55.5)),
            ("amdgpu edge", Some(61.0)),
        ];
        let found = find_sensor(sensors.iter().copied(), "k10temp", "Tdie");
        assert_eq!(found, Some(55.5));
        let gpu = find_sensor(sensors.iter().copied(), "amdgpu", "edge");
        assert_eq!(gpu, Some(61.0));
    }

    #[test]
    fn ignores_missing_and_absurd_readings() {
        let sensors = [("k10temp Tdie", None), ("k10temp Tdie", Some(400.0))];
        assert_eq!(find_sensor(sensors.iter().copied(), "k10temp", "Tdie"), None);
    }

    #[test]
    fn rate_handles_counter_reset() {
        assert_eq!(rate(1000, 3048, 2.0), 1024.0);
        assert_eq!(rate(5000, 10, 1.0), 0.0);
        assert_eq!(rate(0, 10, 0.0), 0.0);
    }

    #[test]
    fn human_rate_units() {
        assert_eq!(human_rate(512.0), "512B");
        assert_eq!(human_rate(12.0 * 1024.0), "12.0K");
        assert_eq!(human_rate(3.5 * 1024.0 * 1024.0), "3.5M");
    }

    #[test]
    fn busy_percent_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gpu_busy_percent");
        std::fs::write(&path, "37\n").unwrap();
        assert_eq!(read_busy_percent(&path).unwrap(), 37);
        std::fs::write(&path, "n/a\n").unwrap();
        assert!(matches!(read_busy_percent(&path), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn first_net_poll_reports_zero() {
        let mut net = NetProvider::new();
        assert_eq!(net.poll().into_text(), "Net: ↓0B ↑0B");
    }
}
