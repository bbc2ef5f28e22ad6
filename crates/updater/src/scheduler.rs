//! Scheduler – cria uma task por chave habilitada e lança todas em
//! threads próprias.
//!
//! Depois do lançamento não há coordenação entre tasks: cada uma só
//! conversa com o [`StatusStore`]. O handle devolvido controla o shutdown
//! e o join de todas as threads (tasks e renderer).

use crate::providers;
use crate::shutdown::{self, ShutdownSignal, ShutdownTrigger};
use crate::task::{StateCell, Task, TaskState};
use status_core::{StatusConfig, StatusKey, StatusStore};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Erros do scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Falha ao criar thread {name}: {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },
}

/// Conjunto de tasks ainda não lançadas.
///
/// O canal de shutdown nasce aqui, antes das tasks, para que providers
/// possam ser construídos já ligados a ele.
pub struct Scheduler {
    tasks: Vec<Task>,
    trigger: ShutdownTrigger,
    signal: ShutdownSignal,
}

impl Scheduler {
    pub fn new() -> Self {
        let (trigger, signal) = shutdown::channel();
        Self {
            tasks: Vec::new(),
            trigger,
            signal,
        }
    }

    /// Uma task por chave habilitada na configuração.
    pub fn from_config(config: &StatusConfig, store: Arc<StatusStore>) -> Self {
        let mut scheduler = Self::new();
        for (key, interval) in config.enabled_tasks() {
            let provider = providers::build(key, config, scheduler.signal());
            scheduler.add(Task::new(key, interval, provider, Arc::clone(&store)));
        }
        scheduler
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let mut scheduler = Self::new();
        tasks.into_iter().for_each(|task| scheduler.add(task));
        scheduler
    }

    pub fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Sinal de shutdown que as threads lançadas vão receber.
    pub fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Lança todas as tasks. Se uma thread não puder ser criada, as já
    /// lançadas são encerradas antes de devolver o erro.
    pub fn start(self) -> Result<SchedulerHandle, SchedulerError> {
        let mut handle = SchedulerHandle {
            trigger: Some(self.trigger),
            signal: self.signal,
            tasks: Vec::with_capacity(self.tasks.len()),
            workers: Vec::new(),
        };

        for task in self.tasks {
            let key = task.key();
            let state = task.state_cell();
            let name = format!("task-{key}");
            info!("Iniciando {name} (intervalo {:?})", task.interval());
            match handle.spawn_thread(name, move |signal| task.run(signal)) {
                Ok(thread) => handle.tasks.push(TaskWorker { key, state, thread }),
                Err(e) => {
                    handle.shutdown();
                    return Err(e);
                }
            }
        }

        Ok(handle)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

struct TaskWorker {
    key: StatusKey,
    state: StateCell,
    thread: JoinHandle<()>,
}

/// Threads em execução e o gatilho de shutdown compartilhado.
pub struct SchedulerHandle {
    trigger: Option<ShutdownTrigger>,
    signal: ShutdownSignal,
    tasks: Vec<TaskWorker>,
    /// Threads extras (ex: o renderer)
    workers: Vec<(String, JoinHandle<()>)>,
}

impl SchedulerHandle {
    /// Lança mais uma thread ligada ao mesmo shutdown (ex: o renderer).
    pub fn spawn<F>(&mut self, name: String, body: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(ShutdownSignal) + Send + 'static,
    {
        let thread = self.spawn_thread(name.clone(), body)?;
        self.workers.push((name, thread));
        Ok(())
    }

    fn spawn_thread<F>(&self, name: String, body: F) -> Result<JoinHandle<()>, SchedulerError>
    where
        F: FnOnce(ShutdownSignal) + Send + 'static,
    {
        let signal = self.signal.clone();
        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || body(signal))
            .map_err(|source| SchedulerError::Spawn { name, source })
    }

    /// Quantas threads (tasks e extras) ainda estão vivas.
    pub fn live(&self) -> usize {
        self.live_tasks()
            + self
                .workers
                .iter()
                .filter(|(_, h)| !h.is_finished())
                .count()
    }

    /// Quantas threads de task ainda estão vivas.
    pub fn live_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.thread.is_finished()).count()
    }

    /// Estado atual de cada task.
    pub fn task_states(&self) -> Vec<(StatusKey, TaskState)> {
        self.tasks.iter().map(|t| (t.key, t.state.get())).collect()
    }

    /// Acorda todas as threads e espera cada uma terminar.
    pub fn shutdown(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            info!(
                "Encerrando {} threads",
                self.tasks.len() + self.workers.len()
            );
            for (key, state) in self.task_states() {
                debug!("{key}: {state:?}");
            }
            trigger.fire();
        }
        let tasks = self
            .tasks
            .drain(..)
            .map(|t| (format!("task-{}", t.key), t.thread));
        for (name, thread) in tasks.chain(self.workers.drain(..)) {
            if thread.join().is_err() {
                warn!("Thread {name} terminou com pânico");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
