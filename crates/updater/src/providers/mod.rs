//! Providers – uma fonte de dados por [`StatusKey`].
//!
//! Cada provider é síncrono e pode bloquear (rede, subprocesso, sysfs).
//! Falhas nunca escapam: viram um [`Reading::Degraded`] com o texto de
//! fallback e a causa tipada, que a task registra em log.

pub mod battery;
pub mod date;
pub mod pacman;
pub mod phone;
pub mod system;
pub mod track;
pub mod volume;
pub mod weather;

use crate::shutdown::ShutdownSignal;
use status_core::{StatusConfig, StatusKey};
use std::process::Command;

/// Erros internos de um provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("`{command}` saiu com status {status}")]
    Exit { command: String, status: i32 },

    #[error("Saída inesperada: {0}")]
    Parse(String),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("Sensor não encontrado: {0}")]
    MissingSensor(String),
}

/// Resultado de uma execução de provider.
#[derive(Debug)]
pub enum Reading {
    /// Valor lido com sucesso (pode ser vazio = omitir)
    Fresh(String),
    /// Falha recuperada: `text` vai para o store no lugar do valor
    Degraded { text: String, cause: ProviderError },
}

impl Reading {
    /// Converte um `Result` interno, usando `fallback` em caso de erro.
    pub fn from_result(result: Result<String, ProviderError>, fallback: impl Into<String>) -> Self {
        match result {
            Ok(text) => Reading::Fresh(text),
            Err(cause) => Reading::Degraded {
                text: fallback.into(),
                cause,
            },
        }
    }

    /// Texto a ser gravado no store.
    pub fn text(&self) -> &str {
        match self {
            Reading::Fresh(text) | Reading::Degraded { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reading::Fresh(text) | Reading::Degraded { text, .. } => text,
        }
    }
}

/// Fonte de dados de uma chave.
pub trait Provider: Send {
    fn poll(&mut self) -> Reading;
}

impl<F> Provider for F
where
    F: FnMut() -> Reading + Send,
{
    fn poll(&mut self) -> Reading {
        self()
    }
}

/// Constrói o provider de uma chave com os argumentos da configuração.
///
/// `shutdown` interrompe esperas internas do provider (retry do clima).
pub fn build(key: StatusKey, config: &StatusConfig, shutdown: &ShutdownSignal) -> Box<dyn Provider> {
    match key {
        StatusKey::Date => Box::new(date::DateProvider::default()),
        StatusKey::Weather => Box::new(weather::WeatherProvider::new(
            weather::HttpFetcher::new(),
            config.weather_url.clone(),
            weather::RetryPolicy {
                attempts: config.weather_attempts,
                delay: config.weather_retry_delay(),
            },
            shutdown.clone(),
        )),
        StatusKey::Volume => Box::new(volume::VolumeProvider::new(config.volume_sink.clone())),
        StatusKey::Ram => Box::new(system::RamProvider::new()),
        StatusKey::Cpu => Box::new(system::CpuProvider::new(
            config.cpu_sensor_dev.clone(),
            config.cpu_sensor_label.clone(),
        )),
        StatusKey::Gpu => Box::new(system::GpuProvider::new(
            config.gpu_sensor_dev.clone(),
            config.gpu_sensor_label.clone(),
            config.gpu_busy_path.clone().into(),
        )),
        StatusKey::Track => Box::new(track::TrackProvider::new(config.mpd_endpoint.clone())),
        StatusKey::Net => Box::new(system::NetProvider::new()),
        StatusKey::Battery => Box::new(battery::BatteryProvider::new(&config.battery_device)),
        StatusKey::Pacman => Box::new(pacman::PacmanProvider),
        StatusKey::Phone => Box::new(phone::PhoneProvider::new(config.phone_device.clone())),
    }
}

/// Roda um comando e retorna stdout; status diferente de zero é erro.
pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<String, ProviderError> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(ProviderError::Exit {
            command: program.into(),
            status: output.status.code().unwrap_or(-1),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_result_keeps_fresh_text() {
        let reading = Reading::from_result(Ok("RAM: 10%".into()), "RAM: ?");
        assert!(matches!(reading, Reading::Fresh(_)));
        assert_eq!(reading.text(), "RAM: 10%");
    }

    #[test]
    fn from_result_degrades_to_fallback() {
        let reading = Reading::from_result(Err(ProviderError::Parse("x".into())), "RAM: ?");
        assert!(matches!(
            reading,
            Reading::Degraded {
                cause: ProviderError::Parse(_),
                ..
            }
        ));
        assert_eq!(reading.into_text(), "RAM: ?");
    }

    #[test]
    fn closures_are_providers() {
        let mut n = 0;
        let mut provider = move || {
            n += 1;
            Reading::Fresh(n.to_string())
        };
        assert_eq!(provider.poll().into_text(), "1");
        assert_eq!(provider.poll().into_text(), "2");
    }

    #[test]
    fn missing_program_is_io_error() {
        let err = run_command("dwmstatus-definitely-not-installed", &[]).unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
    }

    #[test]
    fn every_key_has_a_provider() {
        let config = StatusConfig::default();
        let (_trigger, signal) = crate::shutdown::channel();
        for key in StatusKey::ALL {
            let _ = build(key, &config, &signal);
        }
    }
}
