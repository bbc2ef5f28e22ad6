//! Loop de polling de uma chave.
//!
//! Cada ciclo roda o provider, grava o resultado no store e só então dorme
//! pelo intervalo. O próximo ciclo parte do fim do anterior, então nunca há
//! duas execuções do mesmo provider ao mesmo tempo; o período observado é
//! `intervalo + latência do provider`.

use crate::providers::{Provider, Reading};
use crate::shutdown::ShutdownSignal;
use status_core::{ERROR_PLACEHOLDER, StatusKey, StatusStore};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Estado do loop: `Idle → Running → Sleeping → Running → …`, e `Stopped`
/// depois do shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Idle = 0,
    Running = 1,
    Sleeping = 2,
    Stopped = 3,
}

impl TaskState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TaskState::Idle,
            1 => TaskState::Running,
            2 => TaskState::Sleeping,
            _ => TaskState::Stopped,
        }
    }
}

/// Estado publicado de uma task, legível de outras threads.
#[derive(Debug, Clone)]
pub struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(TaskState::Idle as u8)))
    }

    fn set(&self, state: TaskState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn get(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// Um provider ligado a uma chave e a um intervalo.
pub struct Task {
    key: StatusKey,
    interval: Duration,
    provider: Box<dyn Provider>,
    store: Arc<StatusStore>,
    state: StateCell,
    degraded: bool,
}

impl Task {
    pub fn new(
        key: StatusKey,
        interval: Duration,
        provider: Box<dyn Provider>,
        store: Arc<StatusStore>,
    ) -> Self {
        Self {
            key,
            interval,
            provider,
            store,
            state: StateCell::new(),
            degraded: false,
        }
    }

    pub fn key(&self) -> StatusKey {
        self.key
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    /// Visão do estado que continua válida depois de `run` consumir a task.
    pub fn state_cell(&self) -> StateCell {
        self.state.clone()
    }

    /// Um ciclo: roda o provider e grava no store.
    ///
    /// Um pânico do provider é capturado e vira [`ERROR_PLACEHOLDER`].
    pub fn run_once(&mut self) {
        self.state.set(TaskState::Running);
        let provider = &mut self.provider;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| provider.poll()));

        let text = match outcome {
            Ok(reading) => {
                match &reading {
                    Reading::Fresh(_) if self.degraded => {
                        info!("{}: fonte recuperada", self.key);
                        self.degraded = false;
                    }
                    Reading::Fresh(_) => {}
                    // Aviso só na transição
                    Reading::Degraded { cause, .. } if self.degraded => {
                        debug!("{}: ainda degradado: {cause}", self.key);
                    }
                    Reading::Degraded { cause, .. } => {
                        warn!("{}: provider falhou: {cause}", self.key);
                        self.degraded = true;
                    }
                }
                debug!("{} = {:?}", self.key, reading.text());
                reading.into_text()
            }
            Err(payload) => {
                error!("{}: provider entrou em pânico: {}", self.key, panic_message(&*payload));
                self.degraded = true;
                ERROR_PLACEHOLDER.to_string()
            }
        };

        self.store.set(self.key, text);
    }

    /// Roda até o shutdown. Ponto de suspensão: provider e espera.
    pub fn run(mut self, shutdown: ShutdownSignal) {
        debug!("Task {} iniciada (intervalo {:?})", self.key, self.interval);
        while !shutdown.is_triggered() {
            self.run_once();
            self.state.set(TaskState::Sleeping);
            if shutdown.wait(self.interval) {
                break;
            }
        }
        self.state.set(TaskState::Stopped);
        debug!("Task {} encerrada", self.key);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "pânico sem mensagem".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::shutdown;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider que registra quantas execuções estão em andamento.
    struct OverlapProbe {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl Provider for OverlapProbe {
        fn poll(&mut self) -> Reading {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Reading::Fresh(format!("call {n}"))
        }
    }

    #[test]
    fn first_cycle_moves_out_of_idle() {
        let store = Arc::new(StatusStore::new());
        let mut task = Task::new(
            StatusKey::Date,
            Duration::from_secs(1),
            Box::new(|| Reading::Fresh("Mon 1:00".into())),
            Arc::clone(&store),
        );
        assert_eq!(task.state(), TaskState::Idle);
        assert_eq!(store.get(StatusKey::Date), "");

        task.run_once();
        assert_eq!(task.state(), TaskState::Running);
        assert_eq!(store.get(StatusKey::Date), "Mon 1:00");
    }

    #[test]
    fn degraded_reading_is_stored() {
        let store = Arc::new(StatusStore::new());
        let mut task = Task::new(
            StatusKey::Battery,
            Duration::from_secs(1),
            Box::new(|| Reading::Degraded {
                text: "Battery: ?".into(),
                cause: ProviderError::Parse("x".into()),
            }),
            Arc::clone(&store),
        );
        task.run_once();
        assert_eq!(store.get(StatusKey::Battery), "Battery: ?");
    }

    #[test]
    fn panicking_provider_stores_placeholder_and_keeps_going() {
        let store = Arc::new(StatusStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let task = Task::new(
            StatusKey::Cpu,
            Duration::from_millis(1),
            Box::new(move || -> Reading {
                counter.fetch_add(1, Ordering::SeqCst);
                panic!("sensor sumiu");
            }),
            Arc::clone(&store),
        );

        let (trigger, signal) = shutdown::channel();
        let handle = std::thread::spawn(move || task.run(signal));
        while calls.load(Ordering::SeqCst) < 5 {
            std::thread::sleep(Duration::from_millis(1));
        }
        trigger.fire();
        handle.join().unwrap();

        assert!(calls.load(Ordering::SeqCst) >= 5);
        assert_eq!(store.get(StatusKey::Cpu), ERROR_PLACEHOLDER);
    }

    #[test]
    fn never_overlaps_itself() {
        let store = Arc::new(StatusStore::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let task = Task::new(
            StatusKey::Weather,
            Duration::from_millis(1),
            Box::new(OverlapProbe {
                in_flight: Arc::clone(&in_flight),
                max_in_flight: Arc::clone(&max_in_flight),
                calls: Arc::clone(&calls),
            }),
            Arc::clone(&store),
        );

        let (trigger, signal) = shutdown::channel();
        let handle = std::thread::spawn(move || task.run(signal));
        while calls.load(Ordering::SeqCst) < 10 {
            std::thread::sleep(Duration::from_millis(2));
        }
        trigger.fire();
        handle.join().unwrap();

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert!(store.get(StatusKey::Weather).starts_with("call "));
    }

    #[test]
    fn shutdown_interrupts_long_sleep() {
        let store = Arc::new(StatusStore::new());
        let task = Task::new(
            StatusKey::Pacman,
            Duration::from_secs(3600),
            Box::new(|| Reading::Fresh(String::new())),
            Arc::clone(&store),
        );

        let state = task.state_cell();
        let (trigger, signal) = shutdown::channel();
        let handle = std::thread::spawn(move || task.run(signal));
        while state.get() != TaskState::Sleeping {
            std::thread::sleep(Duration::from_millis(1));
        }
        let start = std::time::Instant::now();
        trigger.fire();
        handle.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(state.get(), TaskState::Stopped);
    }
}
