//! Running session: serializes ticks and input against one map
//!
//! The periodic tick and player input both go through a single session-wide
//! lock. Each lock hold covers exactly one move, rotation or settle pass, so
//! observers only ever see completed steps.

use crate::collision::Collision;
use crate::events::InputEvent;
use crate::grid::RenderSnapshot;
use crate::map::Map;
use crate::score::Score;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

pub struct Session {
    map: Arc<Mutex<Map>>,
    stop_tx: Option<Sender<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl Session {
    /// Wrap a map without starting the ticker
    pub fn new(map: Map) -> Self {
        Self {
            map: Arc::new(Mutex::new(map)),
            stop_tx: None,
            ticker: None,
        }
    }

    /// Spawn the first shape if needed and start ticking at the map's interval
    pub fn start(map: Map) -> Self {
        let interval = map.config().tick_interval;
        let mut session = Self::new(map);
        {
            let mut map = session.lock();
            if map.active_shape().is_none() {
                map.spawn_new_shape();
            }
        }
        session.spawn_ticker(interval);
        session
    }

    fn spawn_ticker(&mut self, interval: Duration) {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let map = Arc::clone(&self.map);

        let handle = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    // Stop requested or session dropped
                    _ => break,
                }
                let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
                map.tick();
                if map.is_game_over() {
                    info!("ticker stopping: game over");
                    break;
                }
            }
            debug!("ticker exited");
        });

        self.stop_tx = Some(stop_tx);
        self.ticker = Some(handle);
    }

    /// Every step leaves the grid consistent, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, Map> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn dispatch(&self, input: InputEvent) -> Option<Collision> {
        self.lock().process_event(input)
    }

    pub fn dispatch_symbol(&self, symbol: &str) -> Option<Collision> {
        self.lock().process_symbol(symbol)
    }

    /// Run one gravity step outside the ticker
    pub fn tick(&self) -> Option<Collision> {
        self.lock().tick()
    }

    /// Post-mutation copy of the grid for renderers
    pub fn snapshot(&self) -> RenderSnapshot {
        self.lock().snapshot()
    }

    pub fn score(&self) -> Score {
        self.lock().score().clone()
    }

    pub fn is_game_over(&self) -> bool {
        self.lock().is_game_over()
    }

    /// Run `f` with exclusive access to the map
    pub fn with_map<R>(&self, f: impl FnOnce(&mut Map) -> R) -> R {
        f(&mut self.lock())
    }

    /// Whether the ticker thread has exited (or never ran)
    pub fn ticker_finished(&self) -> bool {
        self.ticker.as_ref().is_none_or(|handle| handle.is_finished())
    }

    /// Stop the ticker and wait for its current step to finish
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.ticker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
