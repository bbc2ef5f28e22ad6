//! Composição das barras a partir do [`StatusStore`].

use crate::store::StatusStore;
use crate::types::{BAR_DELIMITER, RenderOrder, SEPARATOR, StatusKey};

/// Uma leitura do store pronta para o sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub topbar: String,
    pub bottombar: String,
    /// Valor cru de todas as chaves conhecidas (modo arquivo)
    pub values: Vec<(StatusKey, String)>,
}

impl Frame {
    /// Lê o store e monta as duas barras segundo a ordem configurada.
    pub fn capture(store: &StatusStore, order: &RenderOrder) -> Self {
        Self {
            topbar: compose_bar(&store.snapshot(&order.topbar)),
            bottombar: compose_bar(&store.snapshot(&order.bottombar)),
            values: store.snapshot(&StatusKey::ALL),
        }
    }

    /// Texto para o nome da root window: `"<topbar>;<bottombar>"`.
    pub fn root_name(&self) -> String {
        format!("{}{BAR_DELIMITER}{}", self.topbar, self.bottombar)
    }
}

/// Junta os valores não vazios com [`SEPARATOR`].
pub fn compose_bar(values: &[(StatusKey, String)]) -> String {
    values
        .iter()
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}
