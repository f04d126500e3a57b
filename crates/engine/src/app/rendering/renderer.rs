use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::warn;
use winit::window::Window;

use crate::app::{
    DialogView, Entity, RenderableKind, SceneWorld, SpriteFrame, Tilemap, Vec2, EMPTY_TILE,
};
use crate::sprite_keys::sprite_sheet_path;

use super::transform::rect_to_screen_px;
use super::{world_to_screen_px, Viewport};

const CLEAR_COLOR: [u8; 4] = [14, 16, 24, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const DIALOG_FILL_COLOR: [u8; 4] = [16, 24, 48, 255];
const DIALOG_BORDER_COLOR: [u8; 4] = [120, 200, 255, 255];
const DIALOG_MARGIN_PX: i32 = 12;
const DIALOG_HEIGHT_PX: i32 = 96;
const SETTINGS_PANEL_COLOR: [u8; 4] = [32, 36, 52, 255];
const SETTINGS_PANEL_BORDER_COLOR: [u8; 4] = [200, 200, 220, 255];
const SETTINGS_PANEL_HALF_SIZE_PX: (i32, i32) = (160, 100);
const MUSIC_ON_COLOR: [u8; 4] = [90, 210, 120, 255];
const MUSIC_MUTED_COLOR: [u8; 4] = [220, 80, 80, 255];
const MUSIC_INDICATOR_HALF_SIZE_PX: i32 = 6;

/// Sprite sheets are cut into square frames of this size, row-major.
const SPRITE_FRAME_SIZE_PX: u32 = 48;

/// Base color per tile layer, in draw order of `Tilemap::layers`.
const LAYER_BASE_COLORS: [[u8; 4]; 4] = [
    [58, 62, 78, 255],
    [92, 70, 56, 255],
    [74, 96, 120, 255],
    [110, 140, 90, 255],
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create pixel surface: {0}")]
    CreateSurface(#[source] pixels::Error),
    #[error("failed to resize pixel surface: {0}")]
    ResizeSurface(#[source] pixels::TextureError),
    #[error("failed to present frame: {0}")]
    Present(#[source] pixels::Error),
}

/// Host-side state drawn over the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellOverlay {
    pub settings_visible: bool,
    pub music_muted: bool,
}

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

pub struct Renderer {
    pixels: Pixels<'static>,
    buffer: Viewport,
    sprite_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<String>,
}

impl Renderer {
    /// `buffer` is the logical resolution; the window surface scales it.
    pub fn new(
        window: Arc<Window>,
        buffer: Viewport,
        sprite_root: PathBuf,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), window);
        let pixels =
            Pixels::new(buffer.width, buffer.height, surface).map_err(RenderError::CreateSurface)?;
        Ok(Self {
            pixels,
            buffer,
            sprite_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .map_err(RenderError::ResizeSurface)
    }

    pub fn viewport(&self) -> Viewport {
        self.buffer
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        overlay: ShellOverlay,
    ) -> Result<(), RenderError> {
        let width = self.buffer.width;
        let height = self.buffer.height;
        let frame = self.pixels.frame_mut();
        compose_frame(
            frame,
            width,
            height,
            world,
            overlay,
            &mut self.sprite_cache,
            &mut self.warned_missing_sprite_keys,
            &self.sprite_root,
        );
        self.pixels.render().map_err(RenderError::Present)
    }
}

#[allow(clippy::too_many_arguments)]
fn compose_frame(
    frame: &mut [u8],
    width: u32,
    height: u32,
    world: &SceneWorld,
    overlay: ShellOverlay,
    sprite_cache: &mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    sprite_root: &Path,
) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel.copy_from_slice(&CLEAR_COLOR);
    }

    if let Some(tilemap) = world.tilemap() {
        draw_tilemap(frame, width, height, world, tilemap);
    }

    for prop in world.props() {
        let (left, top, right, bottom) = rect_to_screen_px(world.camera(), &prop.rect);
        fill_rect_clipped(frame, width, height, left, top, right, bottom, prop.color);
    }

    for entity in world.entities() {
        let sprite = match &entity.renderable.kind {
            RenderableKind::Placeholder => None,
            RenderableKind::Sprite(key) => resolve_cached_sprite(
                sprite_cache,
                warned_missing_sprite_keys,
                sprite_root,
                key,
            ),
        };
        let (cx, cy) = world_to_screen_px(world.camera(), entity.transform.position);
        match sprite {
            Some(sprite) => draw_sprite_frame(frame, width, height, cx, cy, sprite, entity.sprite_frame),
            None => draw_placeholder(frame, width, height, cx, cy, entity),
        }
    }

    if let Some(dialog) = world.dialog() {
        draw_dialog_box(frame, width, height, dialog);
    }

    if overlay.settings_visible {
        draw_settings_overlay(frame, width, height, overlay.music_muted);
    }
}

fn draw_tilemap(frame: &mut [u8], width: u32, height: u32, world: &SceneWorld, tilemap: &Tilemap) {
    let tile_w = tilemap.tile_width();
    let tile_h = tilemap.tile_height();
    for (layer_index, layer) in tilemap.layers().iter().enumerate() {
        for (index, &tile) in layer.tiles().iter().enumerate() {
            if tile == EMPTY_TILE {
                continue;
            }
            let tx = (index as u32 % tilemap.width()) as f32;
            let ty = (index as u32 / tilemap.width()) as f32;
            let (left, top) = world_to_screen_px(
                world.camera(),
                Vec2 {
                    x: tx * tile_w,
                    y: ty * tile_h,
                },
            );
            let (right, bottom) = world_to_screen_px(
                world.camera(),
                Vec2 {
                    x: (tx + 1.0) * tile_w,
                    y: (ty + 1.0) * tile_h,
                },
            );
            let color = tile_color(layer_index, tile);
            fill_rect_clipped(frame, width, height, left, top, right, bottom, color);
        }
    }
}

/// Flat stand-in for tileset art: layer picks the hue, tile id shifts brightness.
fn tile_color(layer_index: usize, tile: u32) -> [u8; 4] {
    let base = LAYER_BASE_COLORS[layer_index % LAYER_BASE_COLORS.len()];
    let shift = ((tile % 8) * 6) as u8;
    [
        base[0].saturating_add(shift),
        base[1].saturating_add(shift),
        base[2].saturating_add(shift),
        255,
    ]
}

fn draw_placeholder(frame: &mut [u8], width: u32, height: u32, cx: i32, cy: i32, entity: &Entity) {
    let half_w = (entity.size.x * 0.5).round() as i32;
    let half_h = (entity.size.y * 0.5).round() as i32;
    fill_rect_clipped(
        frame,
        width,
        height,
        cx - half_w,
        cy - half_h,
        cx + half_w,
        cy + half_h,
        PLACEHOLDER_COLOR,
    );
}

fn draw_dialog_box(frame: &mut [u8], width: u32, height: u32, _dialog: &DialogView) {
    let left = DIALOG_MARGIN_PX;
    let right = width as i32 - DIALOG_MARGIN_PX;
    let bottom = height as i32 - DIALOG_MARGIN_PX;
    let top = bottom - DIALOG_HEIGHT_PX;
    fill_rect_clipped(frame, width, height, left, top, right, bottom, DIALOG_BORDER_COLOR);
    fill_rect_clipped(
        frame,
        width,
        height,
        left + 2,
        top + 2,
        right - 2,
        bottom - 2,
        DIALOG_FILL_COLOR,
    );
}

fn draw_settings_overlay(frame: &mut [u8], width: u32, height: u32, music_muted: bool) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel[0] /= 2;
        pixel[1] /= 2;
        pixel[2] /= 2;
    }
    let cx = width as i32 / 2;
    let cy = height as i32 / 2;
    let (half_w, half_h) = SETTINGS_PANEL_HALF_SIZE_PX;
    fill_rect_clipped(
        frame,
        width,
        height,
        cx - half_w,
        cy - half_h,
        cx + half_w,
        cy + half_h,
        SETTINGS_PANEL_BORDER_COLOR,
    );
    fill_rect_clipped(
        frame,
        width,
        height,
        cx - half_w + 2,
        cy - half_h + 2,
        cx + half_w - 2,
        cy + half_h - 2,
        SETTINGS_PANEL_COLOR,
    );
    let indicator = if music_muted {
        MUSIC_MUTED_COLOR
    } else {
        MUSIC_ON_COLOR
    };
    let half = MUSIC_INDICATOR_HALF_SIZE_PX;
    fill_rect_clipped(
        frame,
        width,
        height,
        cx - half,
        cy - half,
        cx + half,
        cy + half,
        indicator,
    );
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    sprite_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match resolve_sprite_image_path(sprite_root, key) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(
                        warned_missing_sprite_keys,
                        key,
                        Some(path.as_path()),
                        reason.as_str(),
                    );
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_missing_sprite_keys, key, None, reason.as_str());
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_sprite_image_path(sprite_root: &Path, key: &str) -> Result<PathBuf, String> {
    sprite_sheet_path(sprite_root, key).map_err(|error| format!("invalid_key:{error}"))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

/// Source origin of `frame` inside the sheet, or `None` if the sheet is too small.
fn sheet_frame_origin(sprite: &LoadedSprite, frame: SpriteFrame) -> Option<(u32, u32)> {
    let columns = sprite.width / SPRITE_FRAME_SIZE_PX;
    let rows = sprite.height / SPRITE_FRAME_SIZE_PX;
    if columns == 0 || rows == 0 {
        return None;
    }
    let column = frame.index % columns;
    let row = frame.index / columns;
    if row >= rows {
        return None;
    }
    Some((column * SPRITE_FRAME_SIZE_PX, row * SPRITE_FRAME_SIZE_PX))
}

fn draw_sprite_frame(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    sprite: &LoadedSprite,
    sprite_frame: SpriteFrame,
) {
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }
    let Some((src_left, src_top)) = sheet_frame_origin(sprite, sprite_frame) else {
        return;
    };

    let size = SPRITE_FRAME_SIZE_PX as i32;
    let left = center_x - size / 2;
    let top = center_y - size / 2;
    let sheet_width = sprite.width as usize;

    for dy in 0..size {
        let out_y = top + dy;
        if out_y < 0 || out_y >= height as i32 {
            continue;
        }
        let src_y = src_top as usize + dy as usize;
        for dx in 0..size {
            let out_x = left + dx;
            if out_x < 0 || out_x >= width as i32 {
                continue;
            }
            let sample_x = if sprite_frame.flip_x { size - 1 - dx } else { dx };
            let src_x = src_left as usize + sample_x as usize;
            let src_offset = (src_y * sheet_width + src_x) * 4;
            let alpha = sprite.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let mut color = [0; 4];
            color.copy_from_slice(&sprite.rgba[src_offset..src_offset + 4]);
            write_pixel_rgba_clipped(frame, width as usize, out_x, out_y, color);
        }
    }
}

/// `right`/`bottom` are exclusive.
#[allow(clippy::too_many_arguments)]
fn fill_rect_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    color: [u8; 4],
) {
    let left = left.max(0);
    let top = top.max(0);
    let right = right.min(width as i32);
    let bottom = bottom.min(height as i32);
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}
