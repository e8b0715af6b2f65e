//! Bounded waits on a load that runs on a helper thread.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use caliper_core::{EmbeddingError, EmbeddingResult};

type Outcome<T> = Result<T, String>;

/// A load whose caller may give up before it finishes.
///
/// A timed-out attempt keeps running. The next [`BackgroundLoad::wait`]
/// waits on that attempt instead of starting another one, so at most one
/// load is ever in flight.
#[derive(Debug)]
pub(crate) struct BackgroundLoad<T> {
    name: String,
    pending: Mutex<Option<Receiver<Outcome<T>>>>,
}

impl<T: Send + 'static> BackgroundLoad<T> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: Mutex::new(None),
        }
    }

    /// Wait up to `timeout` for a loaded value, starting `load` on a helper
    /// thread unless an earlier attempt is still running.
    pub(crate) fn wait<F>(&self, timeout: Duration, load: F) -> EmbeddingResult<T>
    where
        F: FnOnce() -> Outcome<T> + Send + 'static,
    {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| EmbeddingError::model_load(&self.name, e))?;

        let rx = match pending.take() {
            Some(rx) => {
                log::info!("Still waiting on the earlier load of {}", self.name);
                rx
            }
            None => self.spawn(load)?,
        };

        match rx.recv_timeout(timeout) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(reason)) => Err(EmbeddingError::model_load(&self.name, reason)),
            Err(RecvTimeoutError::Timeout) => {
                *pending = Some(rx);
                Err(EmbeddingError::LoadTimeout {
                    model: self.name.clone(),
                    timeout_secs: timeout.as_secs(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(EmbeddingError::model_load(
                &self.name,
                "model loader thread exited without a result",
            )),
        }
    }

    fn spawn<F>(&self, load: F) -> EmbeddingResult<Receiver<Outcome<T>>>
    where
        F: FnOnce() -> Outcome<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let name = self.name.clone();
        thread::Builder::new()
            .name("caliper-model-load".to_string())
            .spawn(move || {
                if tx.send(load()).is_err() {
                    log::debug!("Model {} finished loading after the caller gave up", name);
                }
            })
            .map_err(|e| EmbeddingError::model_load(&self.name, e))?;
        Ok(rx)
    }
}
