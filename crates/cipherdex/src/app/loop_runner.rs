use std::process::ExitCode;
use std::thread;

use engine::{run_app, ui_signal_channel, SceneKey, UiSignal, UiSignalReceiver};
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;

const UI_SHELL_THREAD_NAME: &str = "ui-shell";

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let (ui_signals, receiver) = ui_signal_channel();
    let shell = match thread::Builder::new()
        .name(UI_SHELL_THREAD_NAME.to_string())
        .spawn(move || run_ui_shell(receiver))
    {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, "ui_shell_spawn_failed");
            None
        }
    };

    // `run_app` owns the only sender; the shell drains and exits once it returns.
    let result = run_app(app.config, app.registry, app.start_scene, ui_signals);
    if let Some(shell) = shell {
        if shell.join().is_err() {
            warn!("ui_shell_panicked");
        }
    }

    if let Err(err) = result {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Stand-in for the overlay UI: mirrors what it would display and logs it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ShellMirror {
    scene: Option<SceneKey>,
    settings_visible: bool,
    music_muted: bool,
    dialog_speaker: Option<String>,
    terminal_open: bool,
}

impl ShellMirror {
    fn apply(&mut self, signal: &UiSignal) {
        match signal {
            UiSignal::SettingsVisibilityChanged(visible) => self.settings_visible = *visible,
            UiSignal::MusicMutedChanged(muted) => self.music_muted = *muted,
            UiSignal::DialogOpened { speaker, .. } => {
                self.dialog_speaker = Some(speaker.clone());
            }
            UiSignal::TerminalOpened => self.terminal_open = true,
            UiSignal::DialogClosed => {
                self.dialog_speaker = None;
                self.terminal_open = false;
            }
            UiSignal::SceneEntered(scene) => {
                self.scene = Some(*scene);
                self.dialog_speaker = None;
                self.terminal_open = false;
            }
        }
    }
}

fn run_ui_shell(receiver: UiSignalReceiver) {
    let mut mirror = ShellMirror::default();
    for signal in receiver.iter() {
        mirror.apply(&signal);
        info!(
            signal = ?signal,
            scene = mirror.scene.map(|scene| scene.name()).unwrap_or("-"),
            settings_visible = mirror.settings_visible,
            music_muted = mirror.music_muted,
            "ui_signal_received"
        );
    }
    info!("ui_shell_stopped");
}
