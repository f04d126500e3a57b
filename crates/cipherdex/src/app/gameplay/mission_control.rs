use engine::{HandoffPayload, PropVisual, Rect, Vec2};

use super::collision::{CollisionPolicy, ObstacleTag, StaticObstacle};
use super::grid::{Grid, GRID_SIZE};
use super::interaction::{InteractionKind, InteractionPoint};
use super::npc::NpcPatrol;
use super::player::PLAYER_BOX;
use super::room::RoomBlueprint;
use super::transition::TransitionZone;
use super::{LOBBY, MISSION_CONTROL};
use crate::app::settings::GameplaySettings;

pub(crate) const ROOM_SIZE: Vec2 = Vec2::new(720.0, 480.0);
pub(crate) const DEFAULT_SPAWN: Vec2 = Vec2::new(360.0, 400.0);
/// Offsets the lattice so the default spawn sits on a cell.
pub(crate) const GRID_ORIGIN: Vec2 = Vec2::new(8.0, 16.0);
/// Where the lobby places the player when arriving through its door.
pub(crate) const LOBBY_RETURN_SPAWN: Vec2 = Vec2::new(368.0, 336.0);
const EXIT_ZONE: Rect = Rect::new(Vec2::new(360.0, 440.0), 48.0, 32.0);
/// The podium is wider than a desk, so its briefing reaches a little further.
const PODIUM_INTERACTION_RADIUS: f32 = 72.0;

const WALLS: [(f32, f32, f32, f32); 4] = [
    (360.0, 16.0, 720.0, 32.0),
    (360.0, 464.0, 720.0, 32.0),
    (16.0, 240.0, 32.0, 480.0),
    (704.0, 240.0, 32.0, 480.0),
];
const SCREEN_XS: [f32; 4] = [96.0, 256.0, 416.0, 576.0];
const SCREEN_Y: f32 = 64.0;
const SCREEN_SIZE: (f32, f32) = (140.0, 60.0);
const DESK_XS: [f32; 6] = [96.0, 192.0, 288.0, 384.0, 480.0, 576.0];
const DESK_YS: [f32; 3] = [160.0, 240.0, 320.0];
const DESK_SIZE: (f32, f32) = (80.0, 40.0);
const TERMINAL_OFFSET_Y: f32 = -10.0;
const TERMINAL_SIZE: (f32, f32) = (40.0, 20.0);
const PODIUM: (f32, f32, f32, f32) = (360.0, 120.0, 80.0, 40.0);

fn static_obstacles() -> Vec<StaticObstacle> {
    let mut obstacles = Vec::new();
    for (x, y, w, h) in WALLS {
        obstacles.push(StaticObstacle::new(ObstacleTag::Wall, Vec2::new(x, y), w, h));
    }
    for x in SCREEN_XS {
        obstacles.push(StaticObstacle::new(
            ObstacleTag::Screen,
            Vec2::new(x, SCREEN_Y),
            SCREEN_SIZE.0,
            SCREEN_SIZE.1,
        ));
    }
    for y in DESK_YS {
        for x in DESK_XS {
            obstacles.push(StaticObstacle::new(
                ObstacleTag::Workstation,
                Vec2::new(x, y),
                DESK_SIZE.0,
                DESK_SIZE.1,
            ));
            obstacles.push(StaticObstacle::new(
                ObstacleTag::Terminal,
                Vec2::new(x, y + TERMINAL_OFFSET_Y),
                TERMINAL_SIZE.0,
                TERMINAL_SIZE.1,
            ));
        }
    }
    let (x, y, w, h) = PODIUM;
    obstacles.push(StaticObstacle::new(ObstacleTag::Podium, Vec2::new(x, y), w, h));
    obstacles
}

fn interaction_points(radius: f32) -> Vec<InteractionPoint> {
    let mut points = Vec::new();
    for y in DESK_YS {
        for x in DESK_XS {
            points.push(
                InteractionPoint::new(
                    InteractionKind::Terminal,
                    Vec2::new(x, y + TERMINAL_OFFSET_Y),
                )
                .with_radius(radius),
            );
        }
    }
    points.push(
        InteractionPoint::new(InteractionKind::Briefing, Vec2::new(PODIUM.0, PODIUM.1))
            .with_radius(PODIUM_INTERACTION_RADIUS.max(radius)),
    );
    points
}

fn tag_color(tag: ObstacleTag) -> [u8; 4] {
    match tag {
        ObstacleTag::Wall => [0x1c, 0x22, 0x33, 0xff],
        ObstacleTag::Screen => [0x1f, 0x6f, 0x8b, 0xff],
        ObstacleTag::Workstation => [0x5a, 0x4a, 0x3a, 0xff],
        ObstacleTag::Terminal => [0x2e, 0xc4, 0x8a, 0xff],
        ObstacleTag::Podium => [0x8a, 0x6f, 0x2e, 0xff],
        ObstacleTag::Door => [0x9c, 0x3d, 0x54, 0xff],
    }
}

fn props(obstacles: &[StaticObstacle]) -> Vec<PropVisual> {
    let floor = PropVisual {
        rect: Rect::new(
            Vec2::new(ROOM_SIZE.x * 0.5, ROOM_SIZE.y * 0.5),
            ROOM_SIZE.x,
            ROOM_SIZE.y,
        ),
        color: [0x2a, 0x2f, 0x3d, 0xff],
    };
    let door = PropVisual {
        rect: EXIT_ZONE,
        color: tag_color(ObstacleTag::Door),
    };
    std::iter::once(floor)
        .chain(obstacles.iter().map(|obstacle| PropVisual {
            rect: obstacle.rect,
            color: tag_color(obstacle.tag),
        }))
        .chain(std::iter::once(door))
        .collect()
}

pub(crate) fn mission_control_room(settings: &GameplaySettings) -> RoomBlueprint {
    let obstacles = static_obstacles();
    RoomBlueprint {
        key: MISSION_CONTROL,
        grid: Grid::new(GRID_SIZE, GRID_ORIGIN),
        default_spawn: DEFAULT_SPAWN,
        move_speed: settings.mission_control_move_speed,
        policy: CollisionPolicy::BoxOverlap { size: PLAYER_BOX },
        props: props(&obstacles),
        obstacles,
        tilemap: None,
        world_size: ROOM_SIZE,
        zones: vec![TransitionZone {
            destination: LOBBY,
            trigger: EXIT_ZONE,
            payload: Some(HandoffPayload::from_door(LOBBY_RETURN_SPAWN)),
        }],
        npcs: Vec::new(),
        interactions: interaction_points(settings.interaction_radius),
        patrol: NpcPatrol {
            speed: settings.npc_speed,
            dwell_seconds: settings.npc_dwell_seconds,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_has_walls_screens_desks_terminals_and_podium() {
        let obstacles = static_obstacles();
        let count = |tag| obstacles.iter().filter(|o| o.tag == tag).count();
        assert_eq!(count(ObstacleTag::Wall), 4);
        assert_eq!(count(ObstacleTag::Screen), 4);
        assert_eq!(count(ObstacleTag::Workstation), 18);
        assert_eq!(count(ObstacleTag::Terminal), 18);
        assert_eq!(count(ObstacleTag::Podium), 1);
    }

    #[test]
    fn spawn_is_on_the_lattice_and_clear_of_obstacles() {
        let grid = Grid::new(GRID_SIZE, GRID_ORIGIN);
        assert!(grid.is_aligned(DEFAULT_SPAWN));
        let spawn_box = Rect::new(DEFAULT_SPAWN, PLAYER_BOX.x, PLAYER_BOX.y);
        assert!(static_obstacles()
            .iter()
            .all(|obstacle| !obstacle.rect.overlaps(&spawn_box)));
        assert!(!EXIT_ZONE.overlaps(&spawn_box));
    }

    #[test]
    fn every_desk_terminal_is_interactive() {
        let points = interaction_points(48.0);
        assert_eq!(points.len(), 19);
        assert!(points.contains(
            &InteractionPoint::new(InteractionKind::Terminal, Vec2::new(96.0, 150.0)).with_radius(48.0)
        ));
        assert_eq!(points[18].kind, InteractionKind::Briefing);
    }
}
