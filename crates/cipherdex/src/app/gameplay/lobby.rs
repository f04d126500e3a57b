use engine::Vec2;

use super::collision::CollisionPolicy;
use super::grid::{Grid, GRID_SIZE};
use super::layout::{LobbyLayout, COLLISION_LAYER};
use super::npc::NpcPatrol;
use super::room::RoomBlueprint;
use super::LOBBY;
use crate::app::settings::GameplaySettings;

/// Lobby cells are tile centers.
pub(crate) const LOBBY_GRID_ORIGIN: Vec2 = Vec2::new(GRID_SIZE * 0.5, GRID_SIZE * 0.5);

pub(crate) fn lobby_room(layout: &LobbyLayout, settings: &GameplaySettings) -> RoomBlueprint {
    RoomBlueprint {
        key: LOBBY,
        grid: Grid::new(GRID_SIZE, LOBBY_GRID_ORIGIN),
        default_spawn: layout.spawn,
        move_speed: settings.lobby_move_speed,
        policy: CollisionPolicy::TileLayer {
            layer: COLLISION_LAYER.to_string(),
        },
        obstacles: Vec::new(),
        world_size: layout.tilemap.world_size(),
        tilemap: Some(layout.tilemap.clone()),
        zones: layout.doors.clone(),
        npcs: layout.npcs.clone(),
        interactions: layout.interactions.clone(),
        props: Vec::new(),
        patrol: NpcPatrol {
            speed: settings.npc_speed,
            dwell_seconds: settings.npc_dwell_seconds,
        },
    }
}
