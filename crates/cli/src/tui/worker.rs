//! Background network worker.
//!
//! Effects are queued to a single thread that runs them against the backend
//! in order and sends the resulting events back. The UI loop drains events
//! between frames, so it never waits on the network.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use stockgrid_core::{execute, CatalogBackend, GridEffect, GridEvent};

pub struct Worker {
    effects: Sender<GridEffect>,
    events: Receiver<GridEvent>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn<B>(backend: B) -> Self
    where
        B: CatalogBackend + Send + 'static,
    {
        let (effect_tx, effect_rx) = mpsc::channel::<GridEffect>();
        let (event_tx, event_rx) = mpsc::channel::<GridEvent>();

        let handle = thread::Builder::new()
            .name("stockgrid-net".into())
            .spawn(move || {
                for effect in effect_rx {
                    let event = execute(&backend, effect);
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
                log::debug!("network worker stopped");
            })
            .map_err(|e| log::error!("cannot start network worker: {}", e))
            .ok();

        Self { effects: effect_tx, events: event_rx, handle }
    }

    pub fn submit(&self, effects: Vec<GridEffect>) {
        for effect in effects {
            if self.effects.send(effect).is_err() {
                log::warn!("network worker is gone; dropping request");
                return;
            }
        }
    }

    /// Events that arrived since the last call.
    pub fn drain(&self) -> Vec<GridEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Stop accepting work and wait up to `timeout` for the queue to run out.
    /// Returns every event produced meanwhile.
    pub fn shutdown(self, timeout: Duration) -> Vec<GridEvent> {
        let Worker { effects, events, handle } = self;
        drop(effects);

        let deadline = Instant::now() + timeout;
        let mut drained = Vec::new();
        loop {
            match events.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(event) => drained.push(event),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("network worker still busy after {:?}; leaving it behind", timeout);
                    return drained;
                }
            }
        }

        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("network worker panicked");
            }
        }
        drained
    }
}
