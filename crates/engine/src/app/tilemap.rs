use thiserror::Error;

use super::scene::Vec2;

/// Tile id marking an unoccupied cell, as written by Tiled.
pub const EMPTY_TILE: u32 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    name: String,
    tiles: Vec<u32>,
}

impl TileLayer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }
}

/// Tilemap origin convention:
/// - world (0,0) is the top-left corner of tile (0,0), y grows downward.
/// - the center of tile (x,y) is `((x + 0.5) * tile_width, (y + 0.5) * tile_height)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_width: f32,
    tile_height: f32,
    layers: Vec<TileLayer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch in layer '{layer}': expected {expected}, got {actual}")]
    TileCountMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate tile layer '{layer}'")]
    DuplicateLayer { layer: String },
}

impl Tilemap {
    pub fn new(width: u32, height: u32, tile_width: f32, tile_height: f32) -> Self {
        Self {
            width,
            height,
            tile_width,
            tile_height,
            layers: Vec::new(),
        }
    }

    pub fn add_layer(&mut self, name: &str, tiles: Vec<u32>) -> Result<(), TilemapError> {
        let expected = self.width as usize * self.height as usize;
        if tiles.len() != expected {
            return Err(TilemapError::TileCountMismatch {
                layer: name.to_string(),
                expected,
                actual: tiles.len(),
            });
        }
        if self.layer(name).is_some() {
            return Err(TilemapError::DuplicateLayer {
                layer: name.to_string(),
            });
        }
        self.layers.push(TileLayer {
            name: name.to_string(),
            tiles,
        });
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_width(&self) -> f32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> f32 {
        self.tile_height
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2 {
            x: self.width as f32 * self.tile_width,
            y: self.height as f32 * self.tile_height,
        }
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, layer: &str, x: u32, y: u32) -> Option<u32> {
        let index = self.index_of(x, y)?;
        self.layer(layer)
            .and_then(|layer| layer.tiles.get(index).copied())
    }

    pub fn world_to_tile(&self, world: Vec2) -> Option<(u32, u32)> {
        if !world.x.is_finite() || !world.y.is_finite() || world.x < 0.0 || world.y < 0.0 {
            return None;
        }
        let x = (world.x / self.tile_width).floor() as u32;
        let y = (world.y / self.tile_height).floor() as u32;
        self.index_of(x, y).map(|_| (x, y))
    }

    /// `None` when the layer is missing or the position lies outside the map.
    pub fn tile_at_world(&self, layer: &str, world: Vec2) -> Option<u32> {
        let (x, y) = self.world_to_tile(world)?;
        self.tile_at(layer, x, y)
    }

    pub fn tile_center_world(&self, x: u32, y: u32) -> Option<Vec2> {
        self.index_of(x, y)?;
        Some(Vec2 {
            x: (x as f32 + 0.5) * self.tile_width,
            y: (y as f32 + 0.5) * self.tile_height,
        })
    }
}
