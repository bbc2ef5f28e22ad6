//! Cache compartilhado com o último valor renderizado de cada chave.
//!
//! Único estado mutável compartilhado entre as tasks (escritoras) e o
//! renderer (leitor). Cada escrita é uma sobrescrita completa, então um
//! `RwLock` sobre o mapa inteiro basta; não há transações entre chaves.

use crate::types::StatusKey;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Mapa thread-safe `StatusKey → String`.
///
/// Leituras de chaves ausentes retornam string vazia ("omitir").
#[derive(Debug, Default)]
pub struct StatusStore {
    values: RwLock<HashMap<StatusKey, String>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sobrescreve o valor da chave.
    pub fn set(&self, key: StatusKey, value: impl Into<String>) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key, value.into());
    }

    /// Valor atual da chave, ou `""` se ainda não foi escrita.
    pub fn get(&self, key: StatusKey) -> String {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(&key).cloned().unwrap_or_default()
    }

    /// Lê as chaves pedidas, na ordem pedida.
    ///
    /// Cada valor é a escrita mais recente daquela chave; o conjunto não
    /// é atômico entre chaves.
    pub fn snapshot(&self, keys: &[StatusKey]) -> Vec<(StatusKey, String)> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        keys.iter()
            .map(|key| (*key, values.get(key).cloned().unwrap_or_default()))
            .collect()
    }
}
