mod renderer;
mod transform;

pub use renderer::{RenderError, Renderer, ShellOverlay};
pub use transform::{world_to_screen_px, Viewport};
