//! # Status Core
//!
//! Crate compartilhada com as chaves de status, o cache de valores
//! compartilhado entre threads, a configuração TOML e a composição das
//! barras do dwmstatus.
//!
//! ## Módulos
//! - [`types`] – Chaves de status, ordem de renderização e constantes
//! - [`store`] – `StatusStore` thread-safe
//! - [`config`] – Configuração via TOML e chaves habilitadas
//! - [`render`] – Montagem das barras e do frame enviado ao sink

pub mod types;
pub mod store;
pub mod config;
pub mod render;

// Re-exports convenientes
pub use types::{StatusKey, RenderOrder, ERROR_PLACEHOLDER, SEPARATOR};
pub use store::StatusStore;
pub use config::{StatusConfig, ConfigError};
pub use render::{Frame, compose_bar};
