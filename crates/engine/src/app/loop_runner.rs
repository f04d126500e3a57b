use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::ActionStates;
use super::metrics::MetricsWindow;
use super::rendering::ShellOverlay;
use super::scene::SceneMachine;
use super::{
    InputAction, InputSnapshot, RenderError, Renderer, SceneKey, SceneRegistry,
    SceneRegistryError, UiSignal, UiSignalSender, Viewport,
};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Logical window size; also the frame buffer size in world units.
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub sprite_root: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "CipherDex: Zero".to_string(),
            window_width: 720,
            window_height: 480,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            sprite_root: PathBuf::from("assets").join("sprites"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scenes(#[from] SceneRegistryError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] RenderError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives `registry` from `start_scene` until quit.
/// Scene-emitted UI signals and shell toggles are forwarded to `ui_signals`.
pub fn run_app(
    config: LoopConfig,
    registry: SceneRegistry,
    start_scene: SceneKey,
    ui_signals: UiSignalSender,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(registry, start_scene)?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let buffer = Viewport {
        width: config.window_width.max(1),
        height: config.window_height.max(1),
    };
    let mut renderer = Renderer::new(Arc::clone(&window), buffer, config.sprite_root.clone())
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    scenes
        .active_world_mut()
        .set_viewport_size(renderer.viewport().size_world());
    scenes.enter_active(None);
    flush_ui_signals(&mut scenes, &ui_signals);
    info!(
        scene = %scenes.active_scene(),
        entity_count = scenes.active_world().entity_count(),
        "scene_entered"
    );
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut shell = ShellState::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics_window = MetricsWindow::starting_at(last_frame_instant, metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let window_for_loop = window;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input_collector.mark_quit_requested();
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                        if input_collector.quit_requested {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if input_collector.take_settings_toggle_pressed() {
                            ui_signals.publish(shell.toggle_settings());
                        }
                        if input_collector.take_music_toggle_pressed() {
                            ui_signals.publish(shell.toggle_music());
                        }

                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                        accumulator = accumulator.saturating_add(clamped_frame_dt);

                        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                        for _ in 0..step_plan.ticks_to_run {
                            let input_snapshot = input_collector.snapshot_for_tick();
                            run_fixed_tick(
                                &mut scenes,
                                &shell,
                                &input_snapshot,
                                fixed_dt_seconds,
                                &ui_signals,
                            );
                            metrics_window.record_tick();
                        }
                        accumulator = step_plan.remaining_accumulator;

                        if step_plan.dropped_backlog > Duration::ZERO {
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame, "sim_clamp_triggered"
                            );
                        }

                        scenes.render_active();
                        if let Err(error) =
                            renderer.render_world(scenes.active_world(), shell.overlay())
                        {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        let next_title = scenes.debug_title_active();
                        if next_title != last_applied_title {
                            match &next_title {
                                Some(title) => window_for_loop.set_title(title),
                                None => window_for_loop.set_title(&config.window_title),
                            }
                            last_applied_title = next_title;
                        }
                        metrics_window.record_frame(raw_frame_dt);

                        if let Some(metrics) = metrics_window.close_if_elapsed(now) {
                            info!(
                                fps = metrics.fps,
                                tps = metrics.tps,
                                frame_time_ms = metrics.frame_time_ms,
                                entity_count = scenes.active_world().entity_count(),
                                scene = %scenes.active_scene(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                scenes.shutdown();
                flush_ui_signals(&mut scenes, &ui_signals);
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// One simulation tick: update, apply deferred spawns, apply the scene command,
/// then hand buffered UI signals to the shell.
fn run_fixed_tick(
    scenes: &mut SceneMachine,
    shell: &ShellState,
    input: &InputSnapshot,
    fixed_dt_seconds: f32,
    ui_signals: &UiSignalSender,
) -> bool {
    let input = if shell.settings_visible {
        input.without_gameplay_input()
    } else {
        *input
    };
    let command = scenes.update_active(fixed_dt_seconds, &input);
    scenes.apply_pending_active();
    let switched = scenes.apply_command(command);
    flush_ui_signals(scenes, ui_signals);
    switched
}

fn flush_ui_signals(scenes: &mut SceneMachine, ui_signals: &UiSignalSender) {
    for signal in scenes.take_signals() {
        debug!(signal = ?signal, "ui_signal_published");
        ui_signals.publish(signal);
    }
}

/// Host toggles that live outside any scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ShellState {
    settings_visible: bool,
    music_muted: bool,
}

impl ShellState {
    fn toggle_settings(&mut self) -> UiSignal {
        self.settings_visible = !self.settings_visible;
        info!(settings_visible = self.settings_visible, "settings_toggled");
        UiSignal::SettingsVisibilityChanged(self.settings_visible)
    }

    fn toggle_music(&mut self) -> UiSignal {
        self.music_muted = !self.music_muted;
        info!(music_muted = self.music_muted, "music_toggled");
        UiSignal::MusicMutedChanged(self.music_muted)
    }

    fn overlay(&self) -> ShellOverlay {
        ShellOverlay {
            settings_visible: self.settings_visible,
            music_muted: self.music_muted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyBinding {
    Action(InputAction),
    Settings,
    Music,
}

fn key_binding(key: PhysicalKey) -> Option<KeyBinding> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let binding = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => KeyBinding::Action(InputAction::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => KeyBinding::Action(InputAction::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => KeyBinding::Action(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => KeyBinding::Action(InputAction::MoveRight),
        KeyCode::KeyE | KeyCode::Enter => KeyBinding::Action(InputAction::Interact),
        KeyCode::KeyX | KeyCode::Backspace => KeyBinding::Action(InputAction::Cancel),
        KeyCode::Escape => KeyBinding::Action(InputAction::Quit),
        KeyCode::F1 => KeyBinding::Settings,
        KeyCode::KeyM => KeyBinding::Music,
        _ => return None,
    };
    Some(binding)
}

/// Press edge of a held key: set once per physical press, cleared when taken.
#[derive(Debug, Clone, Copy, Default)]
struct KeyEdge {
    is_down: bool,
    pressed_edge: bool,
}

impl KeyEdge {
    fn handle(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    /// Physical keys currently held; several keys may share one action.
    held_keys: HashSet<PhysicalKey>,
    action_states: ActionStates,
    interact: KeyEdge,
    cancel: KeyEdge,
    settings_toggle: KeyEdge,
    music_toggle: KeyEdge,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_physical_key(key_event.physical_key, key_event.state);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let Some(binding) = key_binding(key) else {
            return;
        };
        let is_pressed = state == ElementState::Pressed;
        match binding {
            KeyBinding::Action(action) => {
                if is_pressed {
                    self.held_keys.insert(key);
                } else {
                    self.held_keys.remove(&key);
                }
                let still_held = self
                    .held_keys
                    .iter()
                    .any(|held| key_binding(*held) == Some(KeyBinding::Action(action)));
                self.action_states.set(action, still_held);
                match action {
                    InputAction::Interact => self.interact.handle(state),
                    InputAction::Cancel => self.cancel.handle(state),
                    InputAction::Quit if is_pressed => self.mark_quit_requested(),
                    _ => {}
                }
            }
            KeyBinding::Settings => self.settings_toggle.handle(state),
            KeyBinding::Music => self.music_toggle.handle(state),
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            self.interact.take(),
            self.cancel.take(),
        )
    }

    fn take_settings_toggle_pressed(&mut self) -> bool {
        self.settings_toggle.take()
    }

    fn take_music_toggle_pressed(&mut self) -> bool {
        self.music_toggle.take()
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{
        ui_signal_channel, HandoffPayload, RenderableDesc, RenderableKind, Scene, SceneCommand,
        SceneWorld, Transform, Vec2,
    };

    const HALL: SceneKey = SceneKey::new("hall");
    const VAULT: SceneKey = SceneKey::new("vault");

    /// Walks right while MoveRight is held; leaves for the vault on interact.
    struct WalkerScene;

    impl Scene for WalkerScene {
        fn enter(&mut self, _payload: Option<&HandoffPayload>, world: &mut SceneWorld) {
            world.spawn(
                Transform::default(),
                RenderableDesc {
                    kind: RenderableKind::Placeholder,
                    debug_name: "walker",
                },
                Vec2::new(8.0, 8.0),
            );
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            if input.is_down(InputAction::MoveRight) {
                for entity in world.entities_mut() {
                    entity.transform.position.x += 1.0;
                }
            }
            if input.interact_pressed() {
                return SceneCommand::SwitchTo {
                    scene: VAULT,
                    payload: None,
                };
            }
            SceneCommand::None
        }

        fn render(&mut self, _world: &SceneWorld) {}

        fn exit(&mut self, _world: &mut SceneWorld) {}
    }

    fn walker_machine() -> SceneMachine {
        let mut registry = SceneRegistry::new();
        registry.register(HALL, Box::new(WalkerScene)).expect("hall");
        registry.register(VAULT, Box::new(WalkerScene)).expect("vault");
        let mut machine = SceneMachine::new(registry, HALL).expect("machine");
        machine.enter_active(None);
        machine
    }

    fn walker_x(machine: &SceneMachine) -> f32 {
        machine.active_world().entities()[0].transform.position.x
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(50), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(2));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 5);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(40));
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_movement() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Pressed);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), ElementState::Pressed);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveUp));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveDown));

        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Released);
        assert!(!input.snapshot_for_tick().is_down(InputAction::MoveUp));
    }

    #[test]
    fn action_stays_down_while_any_bound_key_is_held() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::ArrowUp), ElementState::Pressed);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Pressed);

        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Released);
        assert!(input.snapshot_for_tick().is_down(InputAction::MoveUp));

        input.handle_physical_key(PhysicalKey::Code(KeyCode::ArrowUp), ElementState::Released);
        assert!(!input.snapshot_for_tick().is_down(InputAction::MoveUp));

        // A stray release of a key that was never pressed changes nothing.
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyA), ElementState::Pressed);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::ArrowRight), ElementState::Released);
        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn interact_and_cancel_are_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyE), ElementState::Pressed);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Backspace), ElementState::Pressed);

        let first = input.snapshot_for_tick();
        assert!(first.interact_pressed());
        assert!(first.cancel_pressed());

        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyE), ElementState::Pressed);
        let second = input.snapshot_for_tick();
        assert!(!second.interact_pressed());
        assert!(!second.cancel_pressed());

        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyE), ElementState::Released);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Enter), ElementState::Pressed);
        assert!(input.snapshot_for_tick().interact_pressed());
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed);
        assert!(input.quit_requested);
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn settings_and_music_toggles_are_edge_triggered() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::F1), ElementState::Pressed);
        assert!(input.take_settings_toggle_pressed());
        input.handle_physical_key(PhysicalKey::Code(KeyCode::F1), ElementState::Pressed);
        assert!(!input.take_settings_toggle_pressed());

        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyM), ElementState::Pressed);
        assert!(input.take_music_toggle_pressed());
        assert!(!input.take_music_toggle_pressed());
    }

    #[test]
    fn shell_toggles_flip_state_and_produce_signals() {
        let mut shell = ShellState::default();
        assert_eq!(
            shell.toggle_settings(),
            UiSignal::SettingsVisibilityChanged(true)
        );
        assert_eq!(shell.toggle_music(), UiSignal::MusicMutedChanged(true));
        assert_eq!(
            shell.toggle_settings(),
            UiSignal::SettingsVisibilityChanged(false)
        );
        assert_eq!(
            shell.overlay(),
            ShellOverlay {
                settings_visible: false,
                music_muted: true
            }
        );
    }

    #[test]
    fn open_settings_suppress_gameplay_input() {
        let (sender, _receiver) = ui_signal_channel();
        let mut machine = walker_machine();
        let walking = InputSnapshot::empty()
            .with_action_down(InputAction::MoveRight, true)
            .with_interact_pressed(true);

        let shell = ShellState {
            settings_visible: true,
            music_muted: false,
        };
        assert!(!run_fixed_tick(&mut machine, &shell, &walking, 1.0 / 60.0, &sender));
        assert_eq!(walker_x(&machine), 0.0);
        assert_eq!(machine.active_scene(), HALL);

        let shell = ShellState::default();
        assert!(run_fixed_tick(&mut machine, &shell, &walking, 1.0 / 60.0, &sender));
        assert_eq!(machine.active_scene(), VAULT);
    }

    #[test]
    fn tick_flushes_scene_signals_to_the_channel() {
        let (sender, receiver) = ui_signal_channel();
        let mut machine = walker_machine();
        let _ = machine.take_signals();

        let interact = InputSnapshot::empty().with_interact_pressed(true);
        run_fixed_tick(
            &mut machine,
            &ShellState::default(),
            &interact,
            1.0 / 60.0,
            &sender,
        );
        assert_eq!(
            receiver.try_recv().expect("scene entered"),
            UiSignal::SceneEntered(VAULT)
        );
        assert!(receiver.try_recv().is_err());
    }
}
