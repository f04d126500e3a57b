use crate::app::{Camera2D, Rect, Vec2};

/// Size of the logical frame buffer. One world unit maps to one buffer pixel;
/// `pixels` scales the buffer to the window surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn size_world(&self) -> Vec2 {
        Vec2 {
            x: self.width as f32,
            y: self.height as f32,
        }
    }
}

pub fn world_to_screen_px(camera: &Camera2D, world: Vec2) -> (i32, i32) {
    let x = world.x - camera.position.x;
    let y = world.y - camera.position.y;
    (x.round() as i32, y.round() as i32)
}

/// Returns `(left, top, right, bottom)` with exclusive right/bottom edges.
pub(crate) fn rect_to_screen_px(camera: &Camera2D, rect: &Rect) -> (i32, i32, i32, i32) {
    let (left, top) = world_to_screen_px(
        camera,
        Vec2 {
            x: rect.left(),
            y: rect.top(),
        },
    );
    let (right, bottom) = world_to_screen_px(
        camera,
        Vec2 {
            x: rect.right(),
            y: rect.bottom(),
        },
    );
    (left, top, right, bottom)
}
