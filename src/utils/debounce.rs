//! Debounce y temporizadores de un solo disparo
//!
//! Un `Debouncer` programa una tarea diferida y cancela la anterior cada vez
//! que se vuelve a programar. Se usa para la búsqueda con retardo y para
//! ocultar automáticamente los banners de éxito/error.
//!
//! Solo se cancela la espera: una tarea que ya se disparó corre desacoplada
//! hasta terminar, así una carga emitida nunca queda a medias.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Programar `task` tras el retardo, cancelando la tarea pendiente anterior
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        if self.cancel() {
            debug!("⏱️ Tarea diferida reemplazada");
        }
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(task);
        }));
    }

    /// Cancelar la tarea si sigue esperando. Devuelve `true` si había una.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
