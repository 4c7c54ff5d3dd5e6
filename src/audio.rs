//! Sound cue playback on a worker thread
//!
//! The engine only emits cue ids. Cues are handed to a single worker that
//! owns the audio output; submitting never waits on playback.

use blockfall::SoundCue;
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Cues waiting for the worker before new ones are dropped
const QUEUE_DEPTH: usize = 32;

/// Fire-and-forget queue in front of the playback worker
pub struct AudioQueue {
    tx: Option<SyncSender<SoundCue>>,
    worker: Option<JoinHandle<()>>,
}

impl AudioQueue {
    /// Start the worker. Returns a silent queue when there are no assets.
    pub fn new(volume: f32) -> Self {
        let Some(assets_path) = find_assets_path() else {
            debug!("no sfx assets found, audio disabled");
            return Self::silent();
        };
        if volume <= 0.0 {
            return Self::silent();
        }

        let (tx, rx) = mpsc::sync_channel(QUEUE_DEPTH);
        let worker = thread::Builder::new()
            .name("sfx".to_string())
            .spawn(move || run_worker(rx, assets_path, volume.clamp(0.0, 1.0)));

        match worker {
            Ok(handle) => Self {
                tx: Some(tx),
                worker: Some(handle),
            },
            Err(e) => {
                warn!("failed to start audio worker: {}", e);
                Self::silent()
            }
        }
    }

    pub fn silent() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    /// Queue a cue; dropped when the worker is busy or gone
    pub fn submit(&self, cue: SoundCue) {
        let Some(tx) = &self.tx else { return };
        match tx.try_send(cue) {
            Ok(()) => {}
            Err(TrySendError::Full(cue)) => debug!("sfx queue full, dropping {}", cue.id()),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl Drop for AudioQueue {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn find_assets_path() -> Option<PathBuf> {
    let mut paths = vec![PathBuf::from("assets")];
    if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        paths.push(dir.join("assets"));
    }

    paths.into_iter().find(|p| p.join("sfx").exists())
}

fn run_worker(rx: Receiver<SoundCue>, assets_path: PathBuf, volume: f32) {
    // The output stream is not Send, so it lives on this thread
    let Ok((_stream, handle)) = OutputStream::try_default() else {
        warn!("no audio output device, discarding cues");
        for _ in rx {}
        return;
    };

    for cue in rx {
        let path = assets_path.join("sfx").join(format!("{}.wav", cue.id()));
        let Ok(file) = File::open(&path) else {
            continue;
        };
        let Ok(decoder) = Decoder::new(BufReader::new(file)) else {
            debug!("could not decode {}", path.display());
            continue;
        };
        if let Ok(sink) = Sink::try_new(&handle) {
            sink.set_volume(volume);
            sink.append(decoder);
            sink.detach(); // Let it play and clean up automatically
        }
    }
}
