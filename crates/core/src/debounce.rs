//! Debouncing of rapidly changing input.
//!
//! Raw values go in through [`Debouncer::observe`]; a value comes out of the
//! paired [`Stabilized`] stream only once no newer value has arrived for the
//! full quiet period. A newer value cancels the pending one outright.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Default quiet period for free-text input.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Input side of a debounce pipeline.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    raw: mpsc::UnboundedSender<T>,
}

/// Output side: the lazily produced sequence of stabilized values.
#[derive(Debug)]
pub struct Stabilized<T> {
    out: mpsc::UnboundedReceiver<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn a debounce task with the given quiet period.
    ///
    /// Must be called from within a tokio runtime. The task ends once every
    /// `Debouncer` handle is dropped, after emitting any value still pending.
    pub fn new(quiet: Duration) -> (Self, Stabilized<T>) {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(quiet, raw_rx, out_tx));
        (Self { raw: raw_tx }, Stabilized { out: out_rx })
    }

    /// Feed a raw value, restarting the quiet period.
    pub fn observe(&self, value: T) {
        if self.raw.send(value).is_err() {
            tracing::debug!("debounce task has stopped; dropping input");
        }
    }
}

impl<T> Stabilized<T> {
    /// Wait for the next stabilized value. `None` once the input side is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.out.recv().await
    }

    /// Drain values that are already available and return the most recent one.
    pub fn try_latest(&mut self) -> Option<T> {
        let mut latest = None;
        while let Ok(value) = self.out.try_recv() {
            latest = Some(value);
        }
        latest
    }
}

async fn run<T>(quiet: Duration, mut raw: mpsc::UnboundedReceiver<T>, out: mpsc::UnboundedSender<T>) {
    let mut pending: Option<T> = None;
    let timer = time::sleep(quiet);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            next = raw.recv() => match next {
                Some(value) => {
                    pending = Some(value);
                    timer.as_mut().reset(Instant::now() + quiet);
                }
                None => {
                    if let Some(value) = pending.take() {
                        let _ = out.send(value);
                    }
                    break;
                }
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(value) = pending.take()
                    && out.send(value).is_err()
                {
                    break;
                }
            }
        }
    }
}
