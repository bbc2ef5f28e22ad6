//! Volume do PulseAudio/PipeWire via `pactl`.

use super::{Provider, ProviderError, Reading, run_command};

pub struct VolumeProvider {
    sink: String,
}

impl VolumeProvider {
    pub fn new(sink: String) -> Self {
        Self { sink }
    }

    fn read(&self) -> Result<String, ProviderError> {
        let mute = run_command("pactl", &["get-sink-mute", &self.sink])?;
        if parse_mute(&mute)? {
            return Ok("Volume: muted".into());
        }
        let volume = run_command("pactl", &["get-sink-volume", &self.sink])?;
        let percent = parse_volume_percent(&volume)?;
        Ok(format!("Volume: {}", progress_fmt(percent)))
    }
}

impl Provider for VolumeProvider {
    fn poll(&mut self) -> Reading {
        Reading::from_result(self.read(), "Volume: error")
    }
}

/// Barra de 10 posições com o dígito das unidades no fim: 42 → `[####2     ]`.
pub fn progress_fmt(percent: u32) -> String {
    let n = (percent / 10).min(10) as usize;
    let m = percent % 10;
    format!("[{}{m}{}]", "#".repeat(n), " ".repeat(9usize.saturating_sub(n)))
}

/// `Mute: yes` / `Mute: no`.
fn parse_mute(output: &str) -> Result<bool, ProviderError> {
    match output.trim().strip_prefix("Mute:").map(str::trim) {
        Some("yes") => Ok(true),
        Some("no") => Ok(false),
        _ => Err(ProviderError::Parse(output.trim().into())),
    }
}

/// Primeiro percentual de `Volume: front-left: 32768 /  50% / -18.06 dB, ...`.
fn parse_volume_percent(output: &str) -> Result<u32, ProviderError> {
    output
        .split('/')
        .map(str::trim)
        .find_map(|field| field.strip_suffix('%'))
        .and_then(|p| p.trim().parse().ok())
        .ok_or_else(|| ProviderError::Parse(output.trim().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_shapes() {
        assert_eq!(progress_fmt(0), "[0         ]");
        assert_eq!(progress_fmt(29), "[##9       ]");
        assert_eq!(progress_fmt(42), "[####2     ]");
        assert_eq!(progress_fmt(57), "[#####7    ]");
        assert_eq!(progress_fmt(100), "[##########0]");
        assert_eq!(progress_fmt(153), "[##########3]");
    }

    #[test]
    fn parses_pactl_volume() {
        let out = "Volume: front-left: 32768 /  50% / -18.06 dB,   front-right: 32768 /  50% / -18.06 dB\n        balance 0.00\n";
        assert_eq!(parse_volume_percent(out).unwrap(), 50);
    }

    #[test]
    fn parses_mute_flag() {
        assert!(parse_mute("Mute: yes\n").unwrap());
        assert!(!parse_mute("Mute: no\n").unwrap());
        assert!(parse_mute("garbage").is_err());
    }

    #[test]
    fn garbage_volume_is_parse_error() {
        assert!(matches!(
            parse_volume_percent("Volume: n/a"),
            Err(ProviderError::Parse(_))
        ));
    }
}
