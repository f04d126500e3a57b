use std::collections::BTreeMap;

use crate::app::{Rect, Tilemap, Vec2};

/// One object from a Tiled object group, in world units (pixels, top-left origin).
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// Tiled's `type` attribute, or `class` in newer map versions.
    pub class: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub properties: BTreeMap<String, String>,
    /// Polyline points relative to (`x`, `y`).
    pub polyline: Option<Vec<Vec2>>,
}

impl MapObject {
    pub fn position(&self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_top_left(self.x, self.y, self.width, self.height)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn polyline_world(&self) -> Option<Vec<Vec2>> {
        self.polyline.as_ref().map(|points| {
            points
                .iter()
                .map(|point| Vec2 {
                    x: self.x + point.x,
                    y: self.y + point.y,
                })
                .collect()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLayer {
    pub name: String,
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapDef {
    pub tilemap: Tilemap,
    pub object_layers: Vec<ObjectLayer>,
}

impl MapDef {
    pub fn object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.object_layers.iter().find(|layer| layer.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door() -> MapObject {
        MapObject {
            id: 7,
            name: "mission_door".to_string(),
            class: "door".to_string(),
            x: 408.0,
            y: 296.0,
            width: 32.0,
            height: 48.0,
            properties: BTreeMap::from([("destination".to_string(), "mission_control".to_string())]),
            polyline: Some(vec![Vec2::new(0.0, 0.0), Vec2::new(64.0, 0.0)]),
        }
    }

    #[test]
    fn rect_is_centered_from_top_left_origin() {
        assert_eq!(
            door().rect(),
            Rect::new(Vec2::new(424.0, 320.0), 32.0, 48.0)
        );
    }

    #[test]
    fn polyline_points_are_offset_by_object_position() {
        assert_eq!(
            door().polyline_world(),
            Some(vec![Vec2::new(408.0, 296.0), Vec2::new(472.0, 296.0)])
        );
        assert_eq!(door().property("destination"), Some("mission_control"));
        assert_eq!(door().property("spawnX"), None);
    }
}
