use engine::{
    EntityId, HandoffPayload, InputSnapshot, PropVisual, RenderableDesc, RenderableKind,
    SceneCommand, SceneKey, SceneWorld, SpriteFrame, Tilemap, Transform, Vec2,
};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::animation::Animator;
use super::collision::{CollisionGate, CollisionPolicy, CollisionSetupError, StaticObstacle};
use super::grid::{Direction, Grid, StepOutcome};
use super::interaction::{InteractionController, InteractionKind, InteractionPoint};
use super::npc::{NpcPatrol, NpcState, PatrolError, PatrolEvent};
use super::player::{PlayerController, PLAYER_BOX, PLAYER_SPRITE};
use super::transition::{TransitionZone, ZoneTransitionTrigger};

#[derive(Debug, Error)]
pub(crate) enum RoomError {
    #[error(transparent)]
    Collision(#[from] CollisionSetupError),
    #[error(transparent)]
    Patrol(#[from] PatrolError),
}

/// NPC as authored, before the room is entered.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NpcSpawn {
    pub(crate) npc_type: String,
    pub(crate) waypoints: Vec<Vec2>,
    /// Talking to the NPC opens this dialog; the point follows the NPC.
    pub(crate) dialog: Option<InteractionPoint>,
}

/// Everything a room needs to be entered, authored once.
#[derive(Debug, Clone)]
pub(crate) struct RoomBlueprint {
    pub(crate) key: SceneKey,
    pub(crate) grid: Grid,
    pub(crate) default_spawn: Vec2,
    pub(crate) move_speed: f32,
    pub(crate) policy: CollisionPolicy,
    pub(crate) obstacles: Vec<StaticObstacle>,
    pub(crate) tilemap: Option<Tilemap>,
    pub(crate) world_size: Vec2,
    pub(crate) zones: Vec<TransitionZone>,
    pub(crate) npcs: Vec<NpcSpawn>,
    pub(crate) interactions: Vec<InteractionPoint>,
    pub(crate) props: Vec<PropVisual>,
    pub(crate) patrol: NpcPatrol,
}

/// A validated `RoomBlueprint`. Building one proves entering the room cannot fail.
#[derive(Debug, Clone)]
pub(crate) struct RoomDef {
    key: SceneKey,
    grid: Grid,
    default_spawn: Vec2,
    move_speed: f32,
    gate: CollisionGate,
    tilemap: Option<Tilemap>,
    world_size: Vec2,
    zones: Vec<TransitionZone>,
    npcs: Vec<(NpcState, Option<InteractionPoint>)>,
    interactions: Vec<InteractionPoint>,
    props: Vec<PropVisual>,
    patrol: NpcPatrol,
}

impl RoomDef {
    pub(crate) fn new(blueprint: RoomBlueprint) -> Result<Self, RoomError> {
        let gate = CollisionGate::new(
            blueprint.policy,
            blueprint.obstacles,
            blueprint.tilemap.clone(),
        )?;
        let npcs = blueprint
            .npcs
            .into_iter()
            .map(|npc| Ok((NpcState::new(&npc.npc_type, npc.waypoints)?, npc.dialog)))
            .collect::<Result<Vec<_>, PatrolError>>()?;
        Ok(Self {
            key: blueprint.key,
            grid: blueprint.grid,
            default_spawn: blueprint.default_spawn,
            move_speed: blueprint.move_speed,
            gate,
            tilemap: blueprint.tilemap,
            world_size: blueprint.world_size,
            zones: blueprint.zones,
            npcs,
            interactions: blueprint.interactions,
            props: blueprint.props,
            patrol: blueprint.patrol,
        })
    }

    pub(crate) fn key(&self) -> SceneKey {
        self.key
    }
}

#[derive(Debug)]
struct NpcRuntime {
    entity: EntityId,
    state: NpcState,
    animator: Animator,
    dialog: Option<InteractionPoint>,
}

/// Per-visit state of a room. Created on enter, dropped on exit.
#[derive(Debug)]
pub(crate) struct Room {
    player: PlayerController,
    player_entity: EntityId,
    npcs: Vec<NpcRuntime>,
    trigger: ZoneTransitionTrigger,
    interaction: InteractionController,
}

impl Room {
    pub(crate) fn enter(
        def: &RoomDef,
        payload: Option<&HandoffPayload>,
        world: &mut SceneWorld,
    ) -> Self {
        if let Some(tilemap) = &def.tilemap {
            world.set_tilemap(tilemap.clone());
        }
        world.set_props(def.props.clone());

        let requested = payload.map_or(def.default_spawn, HandoffPayload::spawn);
        let player = PlayerController::spawn(def.grid, requested, def.move_speed);
        if !def.gate.can_move(player.position()) {
            warn!(
                scene = %def.key,
                x = player.position().x,
                y = player.position().y,
                "room_spawn_inside_obstacle"
            );
        }
        let player_entity = world.spawn(
            Transform {
                position: player.position(),
            },
            RenderableDesc {
                kind: RenderableKind::Sprite(PLAYER_SPRITE.to_string()),
                debug_name: "player",
            },
            PLAYER_BOX,
        );

        let npcs = def
            .npcs
            .iter()
            .map(|(state, dialog)| NpcRuntime {
                entity: world.spawn(
                    Transform {
                        position: state.position(),
                    },
                    RenderableDesc {
                        kind: RenderableKind::Sprite(state.npc_type().to_string()),
                        debug_name: "npc",
                    },
                    PLAYER_BOX,
                ),
                state: state.clone(),
                animator: Animator::new(state.facing()),
                dialog: dialog.clone(),
            })
            .collect::<Vec<_>>();

        let viewport = world.viewport_size();
        world
            .camera_mut()
            .center_on_clamped(player.position(), viewport, def.world_size);
        info!(
            scene = %def.key,
            x = player.position().x,
            y = player.position().y,
            from_door = payload.is_some_and(|payload| payload.from_door),
            npc_count = npcs.len(),
            "room_entered"
        );

        Self {
            player,
            player_entity,
            npcs,
            trigger: ZoneTransitionTrigger::new(def.zones.clone()),
            interaction: InteractionController::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn player(&self) -> &PlayerController {
        &self.player
    }

    #[cfg(test)]
    pub(crate) fn npc_states(&self) -> impl Iterator<Item = &NpcState> + '_ {
        self.npcs.iter().map(|npc| &npc.state)
    }

    #[cfg(test)]
    pub(crate) fn dialog_open(&self) -> bool {
        self.interaction.is_open()
    }

    pub(crate) fn update(
        &mut self,
        def: &RoomDef,
        dt: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let direction = if self.interaction.is_open() {
            None
        } else {
            Direction::from_input(input)
        };
        match self.player.step(direction, &def.gate, dt) {
            StepOutcome::Started { target } => {
                trace!(x = target.x, y = target.y, "player_step_started");
            }
            StepOutcome::Blocked { target } => {
                trace!(x = target.x, y = target.y, "player_step_blocked");
            }
            StepOutcome::Busy | StepOutcome::NoInput => {}
        }

        for npc in &mut self.npcs {
            match def.patrol.update(&mut npc.state, dt) {
                Some(PatrolEvent::Arrived { waypoint }) => debug!(
                    npc_type = npc.state.npc_type(),
                    waypoint,
                    x = npc.state.position().x,
                    y = npc.state.position().y,
                    "npc_waypoint_reached"
                ),
                Some(PatrolEvent::Departed { waypoint }) => trace!(
                    npc_type = npc.state.npc_type(),
                    waypoint,
                    "npc_departed"
                ),
                None => {}
            }
        }

        let player_frame = self.player.animate(dt);
        let npc_frames = self
            .npcs
            .iter_mut()
            .map(|npc| {
                npc.animator
                    .update(npc.state.facing(), npc.state.is_moving(), dt)
            })
            .collect::<Vec<_>>();

        let points = self.interaction_points(def);
        self.interaction.update(
            input,
            self.player.position(),
            self.player.is_moving(),
            &points,
            world,
        );

        sync_entity(world, self.player_entity, self.player.position(), player_frame);
        for (npc, frame) in self.npcs.iter().zip(npc_frames) {
            sync_entity(world, npc.entity, npc.state.position(), frame);
        }
        let viewport = world.viewport_size();
        world
            .camera_mut()
            .center_on_clamped(self.player.position(), viewport, def.world_size);

        self.trigger
            .check(&self.player.bounding_box(), self.player.is_moving())
    }

    /// Closes any open dialog so the shell never keeps one from a dead scene.
    pub(crate) fn exit(&mut self, world: &mut SceneWorld) {
        self.interaction.close(world);
    }

    fn interaction_points(&self, def: &RoomDef) -> Vec<InteractionPoint> {
        let mut points = def.interactions.clone();
        points.extend(self.npcs.iter().filter_map(|npc| {
            npc.dialog.as_ref().map(|dialog| InteractionPoint {
                position: npc.state.position(),
                ..dialog.clone()
            })
        }));
        points
    }

    pub(crate) fn debug_title(&self, def: &RoomDef, world: &SceneWorld) -> String {
        let camera = world.camera();
        let clip = self.player.animator().current();
        format!(
            "CipherDex: Zero | Scene {} | Player ({:.0}, {:.0}) {}{} | Camera ({:.0}, {:.0}) | Entities {}",
            def.key,
            self.player.position().x,
            self.player.position().y,
            clip.clip.name(),
            if clip.mirror { " (mirrored)" } else { "" },
            camera.position.x,
            camera.position.y,
            world.entity_count()
        )
    }
}

fn sync_entity(world: &mut SceneWorld, id: EntityId, position: Vec2, frame: SpriteFrame) {
    if let Some(entity) = world.find_entity_mut(id) {
        entity.transform.position = position;
        entity.sprite_frame = frame;
    }
}

/// Dialog point attached to an NPC; its position is replaced every tick.
pub(crate) fn npc_dialog(speaker: &str, line: &str, radius: f32) -> InteractionPoint {
    InteractionPoint::new(
        InteractionKind::Dialog {
            speaker: speaker.to_string(),
            line: line.to_string(),
        },
        Vec2::ZERO,
    )
    .with_radius(radius)
}
