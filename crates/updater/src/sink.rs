//! Destinos do frame renderizado: nome da root window (`xsetroot`) ou um
//! arquivo por chave.

use status_core::Frame;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Erros de emissão.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Falha ao executar {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} saiu com status {status}")]
    Exit { program: String, status: i32 },

    #[error("Erro ao escrever {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Destino externo do renderer.
pub trait Sink: Send {
    /// Emite um frame completo.
    fn emit(&mut self, frame: &Frame) -> Result<(), SinkError>;

    /// Emite um texto fixo de erro depois de uma falha em [`Sink::emit`].
    fn emit_fallback(&mut self, message: &str) -> Result<(), SinkError>;
}

// ──────────────────────────────────────────────
// Root window
// ──────────────────────────────────────────────

/// Define o nome da root window, lido pela barra do dwm como
/// `"<topbar>;<bottombar>"`.
#[derive(Debug, Clone)]
pub struct RootNameSink {
    program: String,
}

impl RootNameSink {
    pub fn new() -> Self {
        Self::with_program("xsetroot")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn set_name(&self, name: &str) -> Result<(), SinkError> {
        // Argumento direto, sem shell
        let status = Command::new(&self.program)
            .arg("-name")
            .arg(name)
            .status()
            .map_err(|source| SinkError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(SinkError::Exit {
                program: self.program.clone(),
                status: status.code().unwrap_or(-1),
            })
        }
    }
}

impl Default for RootNameSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for RootNameSink {
    fn emit(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.set_name(&frame.root_name())
    }

    fn emit_fallback(&mut self, message: &str) -> Result<(), SinkError> {
        self.set_name(message)
    }
}

// ──────────────────────────────────────────────
// Arquivos
// ──────────────────────────────────────────────

/// Escreve o valor cru de cada chave conhecida em `<dir>/<chave>`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn write_all<'a>(
        &self,
        entries: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SinkError::Write {
            path: self.dir.clone(),
            source,
        })?;
        for (name, value) in entries {
            let path = self.dir.join(name);
            std::fs::write(&path, value).map_err(|source| SinkError::Write { path, source })?;
        }
        debug!("Arquivos atualizados em {}", self.dir.display());
        Ok(())
    }
}

impl Sink for FileSink {
    fn emit(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.write_all(frame.values.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    fn emit_fallback(&mut self, message: &str) -> Result<(), SinkError> {
        self.write_all(status_core::StatusKey::ALL.iter().map(|k| (k.as_str(), message)))
    }
}
