mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod signals;
mod tilemap;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetrics;
pub use rendering::{world_to_screen_px, RenderError, Renderer, ShellOverlay, Viewport};
pub use scene::{
    Camera2D, DialogView, Entity, EntityId, HandoffPayload, InputSnapshot, PropVisual, Rect,
    RenderableDesc, RenderableKind, Scene, SceneCommand, SceneKey, SceneRegistry,
    SceneRegistryError, SceneWorld, SpriteFrame, Transform, Vec2,
};
pub use signals::{ui_signal_channel, UiSignal, UiSignalReceiver, UiSignalSender};
pub use tilemap::{TileLayer, Tilemap, TilemapError, EMPTY_TILE};
