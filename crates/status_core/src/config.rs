//! Configuração via TOML.
//!
//! Um único arquivo plano com intervalos, identificadores de sensores e
//! flags. Chaves ausentes caem no padrão, chaves desconhecidas são
//! ignoradas. Um arquivo malformado é erro fatal de startup.

use crate::types::{RenderOrder, StatusKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Erros de configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao ler {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Erro ao parsear {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Erro ao serializar configuração: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao salvar {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuração inválida: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Configuração do dwmstatus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Período do renderer e das fontes rápidas (segundos)
    pub update_interval: f64,
    /// Período do relógio (segundos)
    pub date_interval: f64,
    /// Período da rede (segundos)
    pub net_interval: f64,

    /// Página de previsão do tempo
    pub weather_url: String,
    pub weather_interval: f64,
    /// Tentativas por ciclo antes do texto de fallback
    pub weather_attempts: u32,
    /// Espera entre tentativas (segundos)
    pub weather_retry_delay: f64,

    pub cpu_sensor_dev: String,
    pub cpu_sensor_label: String,
    pub gpu_sensor_dev: String,
    pub gpu_sensor_label: String,
    /// Arquivo com a utilização da GPU (0–100)
    pub gpu_busy_path: String,
    /// 0 desabilita
    pub gpu_interval: f64,

    /// Sink do PulseAudio
    pub volume_sink: String,
    /// `host:porta` do MPD
    pub mpd_endpoint: String,

    pub battery: bool,
    pub battery_device: String,
    pub battery_interval: f64,

    /// Checagem de updates do pacman (Arch)
    pub pacman: bool,
    pub pacman_interval: f64,

    /// 0 desabilita
    pub phone_interval: f64,
    /// Nome do dispositivo no KDE Connect (vazio = qualquer pareado)
    pub phone_device: String,

    pub topbar: Vec<StatusKey>,
    pub bottombar: Vec<StatusKey>,
}

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

impl Default for StatusConfig {
    fn default() -> Self {
        let order = RenderOrder::default();
        Self {
            update_interval: 0.25,
            date_interval: 1.0,
            net_interval: 1.0,
            weather_url: "https://weather.com/weather/today/l/f4486c561c03c078e900d35ff13390398a4d73bed67c8b78fbcd1e129491db92".into(),
            weather_interval: 300.0,
            weather_attempts: 3,
            weather_retry_delay: 5.0,
            cpu_sensor_dev: "k10temp".into(),
            cpu_sensor_label: "Tdie".into(),
            gpu_sensor_dev: "amdgpu".into(),
            gpu_sensor_label: "edge".into(),
            gpu_busy_path: "/sys/class/drm/card0/device/gpu_busy_percent".into(),
            gpu_interval: 0.25,
            volume_sink: "@DEFAULT_SINK@".into(),
            mpd_endpoint: "127.0.0.1:6600".into(),
            battery: false,
            battery_device: "BAT0".into(),
            battery_interval: 5.0,
            pacman: false,
            pacman_interval: 3600.0,
            phone_interval: 0.0,
            phone_device: String::new(),
            topbar: order.topbar,
            bottombar: order.bottombar,
        }
    }
}

impl StatusConfig {
    /// Carrega configuração de um arquivo TOML.
    ///
    /// Arquivo inexistente resulta na configuração padrão.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("{} não existe, usando configuração padrão", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StatusConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        info!("Configuração carregada de {}", path.display());
        Ok(config)
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Caminho padrão: `<config dir>/dwmstatus/config.toml`, ou ao lado do
    /// executável se não houver diretório de config do usuário.
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("", "", "dwmstatus") {
            return dirs.config_dir().join("config.toml");
        }
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    ///
    /// Intervalos das chaves estáticas e do renderer são estritamente
    /// positivos; os opcionais aceitam 0 (desabilitado). Todo valor precisa
    /// caber num [`Duration`].
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("update_interval", self.update_interval),
            ("date_interval", self.date_interval),
            ("net_interval", self.net_interval),
            ("weather_interval", self.weather_interval),
        ] {
            if let Err(e) = check_seconds(value, true) {
                errors.push(format!("{name} {e}: {value}"));
            }
        }
        for (name, value) in [
            ("weather_retry_delay", self.weather_retry_delay),
            ("gpu_interval", self.gpu_interval),
            ("battery_interval", self.battery_interval),
            ("pacman_interval", self.pacman_interval),
            ("phone_interval", self.phone_interval),
        ] {
            if let Err(e) = check_seconds(value, false) {
                errors.push(format!("{name} {e}: {value}"));
            }
        }
        if self.weather_attempts == 0 {
            errors.push("weather_attempts deve ser ao menos 1".into());
        }

        errors
    }

    /// Ordem das barras.
    pub fn render_order(&self) -> RenderOrder {
        RenderOrder {
            topbar: self.topbar.clone(),
            bottombar: self.bottombar.clone(),
        }
    }

    /// Período do renderer.
    ///
    /// Um valor fora de faixa (config não validada) cai no padrão.
    pub fn render_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.update_interval)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_UPDATE_INTERVAL)
    }

    /// Espera entre tentativas do clima.
    pub fn weather_retry_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.weather_retry_delay).unwrap_or(DEFAULT_RETRY_DELAY)
    }

    /// Chaves habilitadas e seus intervalos de polling.
    ///
    /// Chaves estáticas estão sempre ligadas. `gpu` e `phone` dependem de
    /// intervalo > 0; `battery` e `pacman` também da flag booleana.
    pub fn enabled_tasks(&self) -> Vec<(StatusKey, Duration)> {
        let fast = self.update_interval;
        let candidates = [
            (StatusKey::Date, true, self.date_interval),
            (StatusKey::Weather, true, self.weather_interval),
            (StatusKey::Volume, true, fast),
            (StatusKey::Ram, true, fast),
            (StatusKey::Cpu, true, fast),
            (StatusKey::Gpu, true, self.gpu_interval),
            (StatusKey::Track, true, fast),
            (StatusKey::Net, true, self.net_interval),
            (StatusKey::Battery, self.battery, self.battery_interval),
            (StatusKey::Pacman, self.pacman, self.pacman_interval),
            (StatusKey::Phone, true, self.phone_interval),
        ];

        candidates
            .into_iter()
            .filter(|(_, flag, _)| *flag)
            .filter_map(|(key, _, interval)| {
                Duration::try_from_secs_f64(interval)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .map(|d| (key, d))
            })
            .collect()
    }
}

/// Confere se `value` segundos é um intervalo representável.
fn check_seconds(value: f64, positive: bool) -> Result<(), &'static str> {
    let duration = Duration::try_from_secs_f64(value).map_err(|_| "fora de faixa")?;
    if positive && duration.is_zero() {
        return Err("deve ser positivo");
    }
    Ok(())
}
