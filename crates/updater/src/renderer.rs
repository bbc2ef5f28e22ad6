//! Renderer – loop de período fixo que lê o store e emite para o sink.
//!
//! Independente das tasks: lê o que o store tiver no momento do tick
//! (valores possivelmente antigos) e nunca derruba o loop por falha do sink.

use crate::shutdown::ShutdownSignal;
use crate::sink::Sink;
use status_core::types::SINK_FALLBACK;
use status_core::{Frame, RenderOrder, StatusStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Resultado de um tick, para testes e logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Emitted,
    /// A emissão falhou e o fallback foi aceito
    FellBack,
    /// Emissão e fallback falharam
    Failed,
}

pub struct Renderer {
    store: Arc<StatusStore>,
    order: RenderOrder,
    sink: Box<dyn Sink>,
    interval: Duration,
}

impl Renderer {
    pub fn new(
        store: Arc<StatusStore>,
        order: RenderOrder,
        sink: Box<dyn Sink>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            order,
            sink,
            interval,
        }
    }

    /// Lê o store, emite e, em caso de falha, tenta uma única vez o
    /// texto de fallback.
    pub fn tick(&mut self) -> TickOutcome {
        let frame = Frame::capture(&self.store, &self.order);
        match self.sink.emit(&frame) {
            Ok(()) => {
                debug!("Frame emitido: {:?}", frame.root_name());
                TickOutcome::Emitted
            }
            Err(e) => {
                warn!("Falha ao emitir status: {e}");
                match self.sink.emit_fallback(SINK_FALLBACK) {
                    Ok(()) => TickOutcome::FellBack,
                    Err(e) => {
                        error!("Fallback também falhou: {e}");
                        TickOutcome::Failed
                    }
                }
            }
        }
    }

    /// Roda até o shutdown.
    pub fn run(mut self, shutdown: ShutdownSignal) {
        debug!("Renderer iniciado (intervalo {:?})", self.interval);
        loop {
            self.tick();
            if shutdown.wait(self.interval) {
                break;
            }
        }
        debug!("Renderer encerrado");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown;
    use crate::sink::SinkError;
    use status_core::StatusKey;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sink em memória que pode falhar as N primeiras emissões.
    #[derive(Clone, Default)]
    struct RecordingSink {
        emitted: Arc<Mutex<Vec<String>>>,
        fallbacks: Arc<AtomicUsize>,
        fail_emits: Arc<AtomicUsize>,
    }

    impl Sink for RecordingSink {
        fn emit(&mut self, frame: &Frame) -> Result<(), SinkError> {
            let pending = self.fail_emits.load(Ordering::SeqCst);
            if pending > 0 {
                self.fail_emits.store(pending - 1, Ordering::SeqCst);
                return Err(SinkError::Exit {
                    program: "xsetroot".into(),
                    status: 1,
                });
            }
            self.emitted.lock().unwrap().push(frame.root_name());
            Ok(())
        }

        fn emit_fallback(&mut self, message: &str) -> Result<(), SinkError> {
            self.fallbacks.fetch_add(1, Ordering::SeqCst);
            self.emitted.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn renderer(sink: &RecordingSink, store: &Arc<StatusStore>) -> Renderer {
        Renderer::new(
            Arc::clone(store),
            RenderOrder {
                topbar: vec![StatusKey::Weather, StatusKey::Date, StatusKey::Battery],
                bottombar: vec![StatusKey::Volume, StatusKey::Ram, StatusKey::Cpu],
            },
            Box::new(sink.clone()),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn tick_emits_composed_bars() {
        let store = Arc::new(StatusStore::new());
        store.set(StatusKey::Weather, "");
        store.set(StatusKey::Date, "Mon 1:00");
        store.set(StatusKey::Volume, "Volume: 50%");
        store.set(StatusKey::Ram, "RAM: 10%");

        let sink = RecordingSink::default();
        assert_eq!(renderer(&sink, &store).tick(), TickOutcome::Emitted);
        assert_eq!(
            *sink.emitted.lock().unwrap(),
            vec!["Mon 1:00;Volume: 50% | RAM: 10%".to_string()]
        );
    }

    #[test]
    fn failed_emit_falls_back_once_and_continues() {
        let store = Arc::new(StatusStore::new());
        store.set(StatusKey::Date, "Mon 1:00");
        let sink = RecordingSink::default();
        sink.fail_emits.store(1, Ordering::SeqCst);

        let mut renderer = renderer(&sink, &store);
        assert_eq!(renderer.tick(), TickOutcome::FellBack);
        assert_eq!(sink.fallbacks.load(Ordering::SeqCst), 1);

        assert_eq!(renderer.tick(), TickOutcome::Emitted);
        assert_eq!(sink.fallbacks.load(Ordering::SeqCst), 1);
        assert_eq!(
            *sink.emitted.lock().unwrap(),
            vec![SINK_FALLBACK.to_string(), "Mon 1:00;".to_string()]
        );
    }

    #[test]
    fn failing_fallback_does_not_stop_the_loop() {
        struct BrokenSink(Arc<AtomicUsize>);
        impl Sink for BrokenSink {
            fn emit(&mut self, _frame: &Frame) -> Result<(), SinkError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(SinkError::Exit {
                    program: "xsetroot".into(),
                    status: 1,
                })
            }
            fn emit_fallback(&mut self, _message: &str) -> Result<(), SinkError> {
                Err(SinkError::Exit {
                    program: "xsetroot".into(),
                    status: 1,
                })
            }
        }

        let attempts = Arc::new(AtomicUsize::new(0));
        let renderer = Renderer::new(
            Arc::new(StatusStore::new()),
            RenderOrder::default(),
            Box::new(BrokenSink(Arc::clone(&attempts))),
            Duration::from_millis(1),
        );
        let (trigger, signal) = shutdown::channel();
        let handle = std::thread::spawn(move || renderer.run(signal));
        while attempts.load(Ordering::SeqCst) < 5 {
            std::thread::sleep(Duration::from_millis(1));
        }
        trigger.fire();
        handle.join().unwrap();
    }
}
