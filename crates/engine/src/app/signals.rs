use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::warn;

use super::scene::SceneKey;

/// Messages crossing from the game core to the surrounding UI shell.
#[derive(Debug, Clone, PartialEq)]
pub enum UiSignal {
    SettingsVisibilityChanged(bool),
    MusicMutedChanged(bool),
    DialogOpened { speaker: String, text: String },
    TerminalOpened,
    DialogClosed,
    SceneEntered(SceneKey),
}

pub type UiSignalReceiver = Receiver<UiSignal>;

#[derive(Debug, Clone)]
pub struct UiSignalSender {
    sender: Sender<UiSignal>,
    disconnect_warned: Arc<AtomicBool>,
}

pub fn ui_signal_channel() -> (UiSignalSender, UiSignalReceiver) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (
        UiSignalSender {
            sender,
            disconnect_warned: Arc::new(AtomicBool::new(false)),
        },
        receiver,
    )
}

impl UiSignalSender {
    /// Returns `false` once the shell side has hung up; the core keeps running.
    pub fn publish(&self, signal: UiSignal) -> bool {
        if self.sender.send(signal).is_ok() {
            return true;
        }
        if self
            .disconnect_warned
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            warn!("ui signal receiver disconnected; dropping further signals");
        }
        false
    }
}
