//! Input events consumed by the engine and notifications it emits

use crate::error::EngineError;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use tracing::debug;

/// The closed set of player inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
}

impl InputEvent {
    pub fn symbol(&self) -> &'static str {
        match self {
            InputEvent::MoveLeft => "move-left",
            InputEvent::MoveRight => "move-right",
            InputEvent::SoftDrop => "soft-drop",
            InputEvent::Rotate => "rotate",
        }
    }
}

impl FromStr for InputEvent {
    type Err = EngineError;

    /// Accepts the symbolic names as well as the classic `a`/`d`/`s`/`w` keys
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "move-left" | "a" => Ok(InputEvent::MoveLeft),
            "move-right" | "d" => Ok(InputEvent::MoveRight),
            "soft-drop" | "s" => Ok(InputEvent::SoftDrop),
            "rotate" | "w" => Ok(InputEvent::Rotate),
            _ => Err(EngineError::InvalidEvent(s.to_string())),
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Cue for optional sound playback. The engine never waits on playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    RotateOk,
    Placed,
    LineClear,
    GameOver,
}

impl SoundCue {
    pub fn id(&self) -> &'static str {
        match self {
            SoundCue::RotateOk => "rotate-ok",
            SoundCue::Placed => "placed",
            SoundCue::LineClear => "line-clear",
            SoundCue::GameOver => "game-over",
        }
    }
}

/// Notifications published after a mutation completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    StateChanged,
    RowsCleared { count: u32 },
    /// Terminal, published once per session
    GameOver,
    Sound(SoundCue),
}

/// Bounded, non-blocking publisher side of the event channel
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: SyncSender<EngineEvent>,
    /// Set when `GameOver` could not be queued
    game_over_latched: Arc<AtomicBool>,
}

impl EventBus {
    /// Create a bus holding at most `capacity` undelivered events
    pub fn bounded(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        let game_over_latched = Arc::new(AtomicBool::new(false));
        let receiver = EventReceiver {
            rx,
            game_over_latched: Arc::clone(&game_over_latched),
        };
        (
            Self {
                tx,
                game_over_latched,
            },
            receiver,
        )
    }

    /// Publish without blocking. Events are dropped when nobody keeps up,
    /// except `GameOver`, which is latched and delivered on the next drain.
    pub fn publish(&self, event: EngineEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(EngineEvent::GameOver)) => {
                debug!("event channel full, latching GameOver");
                self.game_over_latched.store(true, Ordering::Release);
            }
            Err(TrySendError::Full(event)) => {
                debug!("event channel full, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Consumer side of the event channel
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<EngineEvent>,
    game_over_latched: Arc<AtomicBool>,
}

impl EventReceiver {
    /// Drain everything pending without blocking. A latched `GameOver`
    /// comes last.
    pub fn try_iter(&self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.rx.try_iter().chain(std::iter::from_fn(move || {
            self.game_over_latched
                .swap(false, Ordering::AcqRel)
                .then_some(EngineEvent::GameOver)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        assert_eq!("move-left".parse::<InputEvent>(), Ok(InputEvent::MoveLeft));
        assert_eq!("D".parse::<InputEvent>(), Ok(InputEvent::MoveRight));
        assert_eq!("s".parse::<InputEvent>(), Ok(InputEvent::SoftDrop));
        assert_eq!("rotate".parse::<InputEvent>(), Ok(InputEvent::Rotate));
    }

    #[test]
    fn test_unknown_symbol_is_invalid_event() {
        assert_eq!(
            "jump".parse::<InputEvent>(),
            Err(EngineError::InvalidEvent("jump".to_string()))
        );
    }

    #[test]
    fn test_symbol_round_trip() {
        for event in [
            InputEvent::MoveLeft,
            InputEvent::MoveRight,
            InputEvent::SoftDrop,
            InputEvent::Rotate,
        ] {
            assert_eq!(event.to_string().parse::<InputEvent>(), Ok(event));
        }
    }

    #[test]
    fn test_full_bus_drops_instead_of_blocking() {
        let (bus, rx) = EventBus::bounded(2);
        bus.publish(EngineEvent::StateChanged);
        bus.publish(EngineEvent::RowsCleared { count: 1 });
        bus.publish(EngineEvent::GameOver);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            [EngineEvent::StateChanged, EngineEvent::RowsCleared { count: 1 }]
        );
    }

    #[test]
    fn test_game_over_survives_full_bus() {
        let (bus, rx) = EventBus::bounded(1);
        bus.publish(EngineEvent::StateChanged);
        bus.publish(EngineEvent::RowsCleared { count: 2 });
        bus.publish(EngineEvent::GameOver);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received, [EngineEvent::StateChanged, EngineEvent::GameOver]);
        // Delivered once
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (bus, rx) = EventBus::bounded(1);
        drop(rx);
        bus.publish(EngineEvent::StateChanged);
    }
}
