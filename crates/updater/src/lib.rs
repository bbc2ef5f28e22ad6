//! # Status Updater
//!
//! Núcleo concorrente do dwmstatus: uma thread por fonte de dados, cada uma
//! reagendando a si mesma depois de gravar no [`StatusStore`], e um
//! renderer de período fixo que emite as barras para o sink.
//!
//! ## Módulos
//! - [`providers`] – Leitores de cada fonte (sensores, áudio, rede, MPD…)
//! - [`task`] – Loop poll → store → espera de uma chave
//! - [`scheduler`] – Lançamento, liveness e shutdown das threads
//! - [`renderer`] – Loop de renderização e fallback do sink
//! - [`sink`] – `xsetroot -name` ou um arquivo por chave
//! - [`shutdown`] – Cancelamento cooperativo
//! - [`instance`] – Pid file para instância única
//!
//! [`StatusStore`]: status_core::StatusStore

pub mod instance;
pub mod providers;
pub mod renderer;
pub mod scheduler;
pub mod shutdown;
pub mod sink;
pub mod task;

// Re-exports convenientes
pub use renderer::Renderer;
pub use scheduler::{Scheduler, SchedulerHandle};
pub use task::Task;
