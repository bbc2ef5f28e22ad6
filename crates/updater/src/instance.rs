//! Instância única via pid file.
//!
//! Garante um único escritor no sink: se o pid file aponta para outro
//! processo vivo com o mesmo nome, ele recebe `SIGTERM` antes das tasks
//! começarem. Tudo aqui é best-effort; falhas são logadas pelo chamador.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Erros do lock de instância.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("Erro ao gravar pid file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Pid file mantido enquanto o processo roda; removido no drop.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    pid: u32,
}

impl InstanceLock {
    /// Caminho padrão: runtime dir do usuário, ou o diretório temporário.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "dwmstatus")
            .and_then(|dirs| dirs.runtime_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| std::env::temp_dir().join("dwmstatus"))
            .join("dwmstatus.pid")
    }

    /// Encerra a instância anterior (se houver) e grava o nosso pid.
    pub fn acquire(path: &Path) -> Result<Self, InstanceError> {
        let pid = std::process::id();
        if let Some(previous) = read_pid(path) {
            terminate_previous(previous, pid);
        }

        let write_err = |source| InstanceError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, pid.to_string()).map_err(write_err)?;
        debug!("Pid {pid} gravado em {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            pid,
        })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Só remove se outra instância não sobrescreveu
        if read_pid(&self.path) == Some(self.pid) {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Não foi possível remover {}: {e}", self.path.display());
            }
        }
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_name(pid: u32) -> Option<String> {
    std::fs::read_to_string(format!("/proc/{pid}/comm"))
        .ok()
        .map(|s| s.trim().to_string())
}

/// `true` quando `other` é outra instância viva deste programa.
fn is_duplicate(other: u32, own: u32, other_name: Option<&str>, own_name: Option<&str>) -> bool {
    other != own && other_name.is_some() && other_name == own_name
}

fn terminate_previous(previous: u32, own: u32) {
    let own_name = process_name(own);
    let other_name = process_name(previous);
    if !is_duplicate(previous, own, other_name.as_deref(), own_name.as_deref()) {
        debug!("Pid file antigo ({previous}) não é outra instância, ignorando");
        return;
    }

    let Ok(raw) = i32::try_from(previous) else {
        return;
    };
    // SAFETY: kill(2) só recebe um pid e um número de sinal.
    let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
    if rc == 0 {
        info!("Instância anterior ({previous}) encerrada");
    } else {
        warn!(
            "Falha ao encerrar instância anterior ({previous}): {}",
            std::io::Error::last_os_error()
        );
    }
}
