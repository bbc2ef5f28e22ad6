//! Cancelamento cooperativo via canal desconectado.
//!
//! Todas as threads compartilham clones do mesmo [`Receiver`]. Nada é
//! enviado pelo canal: soltar o único [`Sender`] desconecta todos os
//! receivers e acorda imediatamente quem estiver em `recv_timeout`.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::time::Duration;

/// Lado que dispara o shutdown. Consumido ao disparar.
#[derive(Debug)]
pub struct ShutdownTrigger {
    _tx: Sender<()>,
}

impl ShutdownTrigger {
    pub fn fire(self) {
        drop(self);
    }
}

/// Lado que espera. Clonável para cada thread.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

impl ShutdownSignal {
    /// Dorme por `timeout` ou até o shutdown. Retorna `true` se o shutdown
    /// foi pedido.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Checagem sem bloquear.
    pub fn is_triggered(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Cria o par trigger/signal.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = bounded(0);
    (ShutdownTrigger { _tx: tx }, ShutdownSignal { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn wait_times_out_while_armed() {
        let (_trigger, signal) = channel();
        assert!(!signal.wait(Duration::from_millis(10)));
        assert!(!signal.is_triggered());
    }

    #[test]
    fn fire_wakes_sleepers_promptly() {
        let (trigger, signal) = channel();
        let sleeper = {
            let signal = signal.clone();
            std::thread::spawn(move || {
                let start = Instant::now();
                let stopped = signal.wait(Duration::from_secs(30));
                (stopped, start.elapsed())
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        trigger.fire();

        let (stopped, elapsed) = sleeper.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(5));
        assert!(signal.is_triggered());
    }
}
