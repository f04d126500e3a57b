use engine::{Rect, Tilemap, Vec2, EMPTY_TILE};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ObstacleTag {
    Wall,
    Workstation,
    Terminal,
    Podium,
    Screen,
    Door,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StaticObstacle {
    pub(crate) rect: Rect,
    pub(crate) tag: ObstacleTag,
}

impl StaticObstacle {
    pub(crate) const fn new(tag: ObstacleTag, center: Vec2, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(center, width, height),
            tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CollisionPolicy {
    /// Target point must lie outside every obstacle.
    PointInObstacle,
    /// A box of `size` centered on the target must not overlap any obstacle.
    BoxOverlap { size: Vec2 },
    /// Tile under the target in `layer` must be empty.
    TileLayer { layer: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum CollisionSetupError {
    #[error("tile collision policy needs a tilemap")]
    MissingTilemap,
    #[error("collision layer '{layer}' does not exist in the tilemap")]
    MissingLayer { layer: String },
}

/// Static geometry of one scene and the rule used to test targets against it.
/// Built on enter and never mutated afterwards.
#[derive(Debug, Clone)]
pub(crate) struct CollisionGate {
    policy: CollisionPolicy,
    obstacles: Vec<StaticObstacle>,
    tilemap: Option<Tilemap>,
}

impl CollisionGate {
    pub(crate) fn new(
        policy: CollisionPolicy,
        obstacles: Vec<StaticObstacle>,
        tilemap: Option<Tilemap>,
    ) -> Result<Self, CollisionSetupError> {
        if let CollisionPolicy::TileLayer { layer } = &policy {
            let map = tilemap.as_ref().ok_or(CollisionSetupError::MissingTilemap)?;
            if map.layer(layer).is_none() {
                return Err(CollisionSetupError::MissingLayer {
                    layer: layer.clone(),
                });
            }
        }
        Ok(Self {
            policy,
            obstacles,
            tilemap,
        })
    }

    pub(crate) fn can_move(&self, target: Vec2) -> bool {
        if let Some(map) = &self.tilemap {
            if map.world_to_tile(target).is_none() {
                return false;
            }
        }

        match &self.policy {
            CollisionPolicy::PointInObstacle => !self
                .obstacles
                .iter()
                .any(|obstacle| obstacle.rect.contains_point(target)),
            CollisionPolicy::BoxOverlap { size } => {
                let footprint = Rect::new(target, size.x, size.y);
                !self
                    .obstacles
                    .iter()
                    .any(|obstacle| obstacle.rect.overlaps(&footprint))
            }
            CollisionPolicy::TileLayer { layer } => self
                .tilemap
                .as_ref()
                .and_then(|map| map.tile_at_world(layer, target))
                .is_some_and(|tile| tile == EMPTY_TILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desk() -> StaticObstacle {
        StaticObstacle::new(ObstacleTag::Workstation, Vec2::new(96.0, 160.0), 80.0, 40.0)
    }

    fn tilemap_with_wall() -> Tilemap {
        let mut map = Tilemap::new(3, 2, 32.0, 32.0);
        map.add_layer("collission", vec![0, 2, 0, 0, 0, 0])
            .expect("layer");
        map
    }

    #[test]
    fn point_policy_treats_edges_as_blocked() {
        let gate = CollisionGate::new(CollisionPolicy::PointInObstacle, vec![desk()], None)
            .expect("gate");
        assert!(!gate.can_move(Vec2::new(96.0, 160.0)));
        assert!(!gate.can_move(Vec2::new(136.0, 180.0)));
        assert!(gate.can_move(Vec2::new(137.0, 160.0)));
    }

    #[test]
    fn box_policy_blocks_partial_overlap_but_not_touching() {
        let gate = CollisionGate::new(
            CollisionPolicy::BoxOverlap {
                size: Vec2::new(24.0, 24.0),
            },
            vec![desk()],
            None,
        )
        .expect("gate");
        // Desk spans x 56..136; a 24 box centered at 147 spans 135..159.
        assert!(!gate.can_move(Vec2::new(147.0, 160.0)));
        assert!(gate.can_move(Vec2::new(148.0, 160.0)));
    }

    #[test]
    fn tile_policy_reads_named_layer() {
        let gate = CollisionGate::new(
            CollisionPolicy::TileLayer {
                layer: "collission".to_string(),
            },
            Vec::new(),
            Some(tilemap_with_wall()),
        )
        .expect("gate");
        assert!(gate.can_move(Vec2::new(16.0, 16.0)));
        assert!(!gate.can_move(Vec2::new(48.0, 16.0)));
        assert!(gate.can_move(Vec2::new(48.0, 48.0)));
    }

    #[test]
    fn out_of_map_targets_are_blocked() {
        let gate = CollisionGate::new(
            CollisionPolicy::TileLayer {
                layer: "collission".to_string(),
            },
            Vec::new(),
            Some(tilemap_with_wall()),
        )
        .expect("gate");
        assert!(!gate.can_move(Vec2::new(-16.0, 16.0)));
        assert!(!gate.can_move(Vec2::new(16.0, 80.0)));
        assert!(!gate.can_move(Vec2::new(112.0, 16.0)));
    }

    #[test]
    fn tile_policy_requires_the_layer() {
        let missing = CollisionGate::new(
            CollisionPolicy::TileLayer {
                layer: "walls".to_string(),
            },
            Vec::new(),
            Some(tilemap_with_wall()),
        );
        assert_eq!(
            missing.err(),
            Some(CollisionSetupError::MissingLayer {
                layer: "walls".to_string()
            })
        );
        let no_map = CollisionGate::new(
            CollisionPolicy::TileLayer {
                layer: "collission".to_string(),
            },
            Vec::new(),
            None,
        );
        assert_eq!(no_map.err(), Some(CollisionSetupError::MissingTilemap));
    }
}
