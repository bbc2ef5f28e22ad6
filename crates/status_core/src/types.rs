//! Tipos compartilhados: chaves de status e ordem de renderização.
//!
//! O conjunto de chaves é fechado e conhecido em tempo de compilação; a
//! configuração apenas decide quais delas são habilitadas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separador entre valores de uma mesma barra.
pub const SEPARATOR: &str = " | ";

/// Separador entre a barra de cima e a de baixo no nome da root window.
pub const BAR_DELIMITER: char = ';';

/// Valor gravado quando um provider entra em pânico.
pub const ERROR_PLACEHOLDER: &str = "error";

/// Texto emitido no sink quando a emissão normal falha.
pub const SINK_FALLBACK: &str = "dwmstatus: error";

// ──────────────────────────────────────────────
// StatusKey
// ──────────────────────────────────────────────

/// Identificador de uma linha de status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKey {
    Date,
    Weather,
    Volume,
    Ram,
    Cpu,
    Gpu,
    Track,
    Net,
    Battery,
    Pacman,
    Phone,
}

impl StatusKey {
    /// Todas as chaves conhecidas, em ordem estável.
    pub const ALL: [StatusKey; 11] = [
        StatusKey::Date,
        StatusKey::Weather,
        StatusKey::Volume,
        StatusKey::Ram,
        StatusKey::Cpu,
        StatusKey::Gpu,
        StatusKey::Track,
        StatusKey::Net,
        StatusKey::Battery,
        StatusKey::Pacman,
        StatusKey::Phone,
    ];

    /// Nome usado na configuração e como nome de arquivo no modo arquivo.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKey::Date => "date",
            StatusKey::Weather => "weather",
            StatusKey::Volume => "volume",
            StatusKey::Ram => "ram",
            StatusKey::Cpu => "cpu",
            StatusKey::Gpu => "gpu",
            StatusKey::Track => "track",
            StatusKey::Net => "net",
            StatusKey::Battery => "battery",
            StatusKey::Pacman => "pacman",
            StatusKey::Phone => "phone",
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// RenderOrder
// ──────────────────────────────────────────────

/// Composição das duas barras. Fixada no startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOrder {
    pub topbar: Vec<StatusKey>,
    pub bottombar: Vec<StatusKey>,
}

impl Default for RenderOrder {
    fn default() -> Self {
        Self {
            topbar: vec![StatusKey::Weather, StatusKey::Date],
            bottombar: vec![
                StatusKey::Volume,
                StatusKey::Ram,
                StatusKey::Cpu,
                StatusKey::Gpu,
                StatusKey::Net,
                StatusKey::Battery,
                StatusKey::Pacman,
                StatusKey::Phone,
                StatusKey::Track,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_match_serde() {
        for key in StatusKey::ALL {
            let quoted = format!("\"{}\"", key.as_str());
            let parsed: StatusKey = parse_key(&quoted);
            assert_eq!(parsed, key);
        }
    }

    // toml não aceita um valor solto; embrulha num campo.
    fn parse_key(quoted: &str) -> StatusKey {
        #[derive(Deserialize)]
        struct Wrapper {
            key: StatusKey,
        }
        let w: Wrapper = toml::from_str(&format!("key = {quoted}")).unwrap();
        w.key
    }

    #[test]
    fn all_keys_are_unique() {
        let mut keys = StatusKey::ALL.to_vec();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), StatusKey::ALL.len());
    }
}
