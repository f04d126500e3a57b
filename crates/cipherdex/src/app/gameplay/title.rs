use engine::{
    EntityId, HandoffPayload, InputSnapshot, PropVisual, Rect, RenderableDesc, RenderableKind,
    Scene, SceneCommand, SceneWorld, Transform, Vec2,
};
use tracing::{debug, info};

use super::animation::Animator;
use super::grid::{step_toward, Direction};
use super::LOBBY;

/// Sheets paraded on the title screen, left to right.
const TITLE_CHARACTERS: [&str; 4] = ["player", "player2", "player3", "player4"];
const CHARACTER_START_Y: f32 = 50.0;
const CHARACTER_SPACING: f32 = 100.0;
const CHARACTER_LEFT_OFFSET: f32 = 150.0;
const CHARACTER_SIZE: Vec2 = Vec2::new(48.0, 48.0);
/// Characters halt this far above the title.
const STOP_ABOVE_TITLE: f32 = 100.0;
const WALK_SPEED: f32 = 60.0;

const RULE_COUNT: usize = 8;
const RULE_TOP: f32 = 100.0;
const RULE_SPACING: f32 = 80.0;
const RULE_WIDTH_RATIO: f32 = 0.8;
const RULE_THICKNESS: f32 = 2.0;
const TITLE_BLOCK: Vec2 = Vec2::new(360.0, 64.0);
const BUTTON_OFFSET_Y: f32 = 200.0;
const BUTTON_BLOCK: Vec2 = Vec2::new(300.0, 52.0);
/// Used when the host has not reported a viewport yet.
const FALLBACK_VIEWPORT: Vec2 = Vec2::new(720.0, 480.0);

const BACKDROP_COLOR: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
const RULE_COLOR: [u8; 4] = [0xee, 0xee, 0xee, 0xff];
const INK_COLOR: [u8; 4] = [0x00, 0x00, 0x00, 0xff];

#[derive(Debug)]
struct TitleWalker {
    entity: EntityId,
    position: Vec2,
    target: Vec2,
    arrived: bool,
    animator: Animator,
}

/// Title screen: the cast walks down to the logo, then waits for the start
/// action, which opens the lobby at its default spawn.
#[derive(Debug, Default)]
pub(crate) struct TitleScene {
    walkers: Vec<TitleWalker>,
    walking: bool,
}

impl TitleScene {
    #[cfg(test)]
    pub(crate) fn is_walking(&self) -> bool {
        self.walking
    }
}

fn title_props(viewport: Vec2) -> Vec<PropVisual> {
    let center = Vec2::new(viewport.x * 0.5, viewport.y * 0.5);
    let mut props = vec![PropVisual {
        rect: Rect::new(center, viewport.x, viewport.y),
        color: BACKDROP_COLOR,
    }];
    props.extend((0..RULE_COUNT).map(|index| PropVisual {
        rect: Rect::new(
            Vec2::new(center.x, RULE_TOP + index as f32 * RULE_SPACING),
            viewport.x * RULE_WIDTH_RATIO,
            RULE_THICKNESS,
        ),
        color: RULE_COLOR,
    }));
    props.push(PropVisual {
        rect: Rect::new(center, TITLE_BLOCK.x, TITLE_BLOCK.y),
        color: INK_COLOR,
    });
    props.push(PropVisual {
        rect: Rect::new(
            Vec2::new(center.x, center.y + BUTTON_OFFSET_Y),
            BUTTON_BLOCK.x,
            BUTTON_BLOCK.y,
        ),
        color: INK_COLOR,
    });
    props
}

impl Scene for TitleScene {
    fn enter(&mut self, _payload: Option<&HandoffPayload>, world: &mut SceneWorld) {
        let reported = world.viewport_size();
        let viewport = if reported.x > 0.0 && reported.y > 0.0 {
            reported
        } else {
            FALLBACK_VIEWPORT
        };
        world.set_props(title_props(viewport));

        let center_x = viewport.x * 0.5;
        let stop_y = viewport.y * 0.5 - STOP_ABOVE_TITLE;
        let start_y = CHARACTER_START_Y.min(stop_y);
        self.walkers = TITLE_CHARACTERS
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let x = center_x - CHARACTER_LEFT_OFFSET + index as f32 * CHARACTER_SPACING;
                let position = Vec2::new(x, start_y);
                TitleWalker {
                    entity: world.spawn(
                        Transform { position },
                        RenderableDesc {
                            kind: RenderableKind::Sprite((*key).to_string()),
                            debug_name: "title_character",
                        },
                        CHARACTER_SIZE,
                    ),
                    position,
                    target: Vec2::new(x, stop_y),
                    arrived: false,
                    animator: Animator::new(Direction::Down),
                }
            })
            .collect();
        self.walking = true;
        info!(walkers = self.walkers.len(), stop_y, "title_entered");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.interact_pressed() {
            info!(walking = self.walking, "title_start_pressed");
            return SceneCommand::SwitchTo {
                scene: LOBBY,
                payload: None,
            };
        }

        if self.walking {
            for walker in self.walkers.iter_mut().filter(|walker| !walker.arrived) {
                let (position, arrived) =
                    step_toward(walker.position, walker.target, WALK_SPEED, fixed_dt_seconds);
                walker.position = position;
                walker.arrived = arrived;
            }
            if self.walkers.iter().all(|walker| walker.arrived) {
                self.walking = false;
                debug!("title_walkers_arrived");
            }
        }

        for walker in &mut self.walkers {
            let frame = walker
                .animator
                .update(Direction::Down, self.walking, fixed_dt_seconds);
            if let Some(entity) = world.find_entity_mut(walker.entity) {
                entity.transform.position = walker.position;
                entity.sprite_frame = frame;
            }
        }
        SceneCommand::None
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn exit(&mut self, _world: &mut SceneWorld) {
        self.walkers.clear();
        self.walking = false;
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some("CipherDex: Zero | CIPHERDEX | Press E or Enter to START MISSION".to_string())
    }
}
