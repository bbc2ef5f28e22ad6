//! # dwmstatus
//!
//! Atualiza a barra de status do dwm: cada fonte (relógio, volume, sensores,
//! rede, MPD, clima, bateria, pacman, celular) roda em sua própria thread e
//! grava o último valor num store compartilhado; um renderer de período
//! fixo junta tudo em duas barras e define o nome da root window.
//!
//! ## Uso
//! ```bash
//! dwmstatus                          # Normal (xsetroot -name)
//! dwmstatus --output-dir /tmp/bar    # Um arquivo por chave
//! dwmstatus --write-default-config   # Grava config padrão e sai
//! ```

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{RecvTimeoutError, bounded};
use status_updater::instance::InstanceLock;
use status_updater::sink::{FileSink, RootNameSink, Sink};
use status_updater::{Renderer, Scheduler};
use status_core::{StatusConfig, StatusStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Intervalo da checagem de threads vivas no loop principal.
const LIVENESS_CHECK: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "dwmstatus", version, about = "Status bar updater for dwm")]
struct Cli {
    /// Arquivo de configuração TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nível de log quando RUST_LOG não está definido (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log: String,

    /// Grava a configuração padrão no caminho de config e sai
    #[arg(long)]
    write_default_config: bool,

    /// Escreve um arquivo por chave neste diretório em vez de usar xsetroot
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Não encerra outras instâncias no startup
    #[arg(long)]
    no_lock: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log.to_lowercase().into()),
        )
        .init();

    // ── Config ──
    let config_path = cli.config.clone().unwrap_or_else(StatusConfig::default_path);

    if cli.write_default_config {
        StatusConfig::default()
            .save(&config_path)
            .with_context(|| format!("gravando config padrão em {}", config_path.display()))?;
        println!("Configuração padrão gravada em {}", config_path.display());
        return Ok(());
    }

    let config = StatusConfig::load(&config_path)?;

    // ── Instância única ──
    let _lock = if cli.no_lock {
        None
    } else {
        match InstanceLock::acquire(&InstanceLock::default_path()) {
            Ok(lock) => Some(lock),
            Err(e) => {
                warn!("Lock de instância indisponível: {e}");
                None
            }
        }
    };

    // ── Tasks ──
    let store = Arc::new(StatusStore::new());
    let scheduler = Scheduler::from_config(&config, Arc::clone(&store));
    if scheduler.is_empty() {
        warn!("Nenhuma chave habilitada na configuração");
    }
    let task_count = scheduler.len();
    let mut handle = scheduler.start()?;

    // ── Renderer ──
    let sink: Box<dyn Sink> = match &cli.output_dir {
        Some(dir) => Box::new(FileSink::new(dir.clone())),
        None => Box::new(RootNameSink::new()),
    };
    let renderer = Renderer::new(
        Arc::clone(&store),
        config.render_order(),
        sink,
        config.render_interval(),
    );
    handle.spawn("renderer".into(), move |signal| renderer.run(signal))?;

    info!(
        "dwmstatus ativo: {task_count} tasks, render a cada {:.2}s, saída {}",
        config.update_interval,
        cli.output_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "xsetroot".into()),
    );

    // ── Sinais ──
    let (signal_tx, signal_rx) = bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = signal_tx.try_send(());
    }) {
        warn!("Falha ao instalar handler de sinal: {e}");
    }

    // ── Loop principal: vivo enquanto houver task viva ──
    loop {
        match signal_rx.recv_timeout(LIVENESS_CHECK) {
            Ok(()) => {
                info!("Sinal de término recebido");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            // Handler não instalado: só resta a checagem periódica
            Err(RecvTimeoutError::Disconnected) => std::thread::sleep(LIVENESS_CHECK),
        }
        if handle.live_tasks() == 0 {
            warn!("Nenhuma task viva, encerrando");
            break;
        }
    }

    handle.shutdown();
    info!("dwmstatus encerrado");
    Ok(())
}
