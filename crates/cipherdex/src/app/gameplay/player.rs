use engine::{Rect, SpriteFrame, Vec2};

use super::animation::Animator;
use super::collision::CollisionGate;
use super::grid::{Direction, EntityTransform, Grid, GridMotion, StepOutcome};

pub(crate) const PLAYER_BOX: Vec2 = Vec2::new(24.0, 24.0);
pub(crate) const PLAYER_SPRITE: &str = "player";

#[derive(Debug, Clone)]
pub(crate) struct PlayerController {
    transform: EntityTransform,
    motion: GridMotion,
    speed: f32,
    animator: Animator,
}

impl PlayerController {
    /// Spawns snapped onto `grid`, facing down.
    pub(crate) fn spawn(grid: Grid, at: Vec2, speed: f32) -> Self {
        let position = grid.snap(at);
        Self {
            transform: EntityTransform::at(position, Direction::Down),
            motion: GridMotion::new(grid),
            speed,
            animator: Animator::new(Direction::Down),
        }
    }

    #[cfg(test)]
    pub(crate) fn transform(&self) -> &EntityTransform {
        &self.transform
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.transform.position
    }

    pub(crate) fn is_moving(&self) -> bool {
        self.transform.moving
    }

    pub(crate) fn bounding_box(&self) -> Rect {
        Rect::new(self.transform.position, PLAYER_BOX.x, PLAYER_BOX.y)
    }

    pub(crate) fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Starts a step if idle, then advances whichever step is in flight.
    pub(crate) fn step(
        &mut self,
        direction: Option<Direction>,
        gate: &CollisionGate,
        dt: f32,
    ) -> StepOutcome {
        let outcome = self
            .motion
            .try_begin_step(&mut self.transform, direction, gate);
        self.motion.advance(&mut self.transform, self.speed, dt);
        outcome
    }

    pub(crate) fn animate(&mut self, dt: f32) -> SpriteFrame {
        self.animator
            .update(self.transform.facing, self.transform.moving, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gameplay::animation::{AnimationClip, ClipSelection};
    use crate::app::gameplay::collision::{CollisionPolicy, ObstacleTag, StaticObstacle};
    use crate::app::gameplay::grid::GRID_SIZE;

    #[test]
    fn step_right_settles_idle_side_unmirrored() {
        let gate = CollisionGate::new(CollisionPolicy::PointInObstacle, Vec::new(), None)
            .expect("gate");
        let mut player = PlayerController::spawn(
            Grid::new(GRID_SIZE, Vec2::ZERO),
            Vec2::new(320.0, 320.0),
            160.0,
        );

        player.step(Some(Direction::Right), &gate, 1.0 / 60.0);
        player.animate(1.0 / 60.0);
        for _ in 0..120 {
            player.step(None, &gate, 1.0 / 60.0);
            player.animate(1.0 / 60.0);
        }

        assert_eq!(player.position(), Vec2::new(352.0, 320.0));
        assert!(!player.is_moving());
        assert_eq!(
            player.animator().current(),
            ClipSelection {
                clip: AnimationClip::IdleSide,
                mirror: false
            }
        );
        assert_eq!(player.bounding_box(), Rect::new(Vec2::new(352.0, 320.0), 24.0, 24.0));
    }

    #[test]
    fn bumping_a_wall_keeps_idle_pose_of_last_completed_move() {
        let gate = CollisionGate::new(
            CollisionPolicy::PointInObstacle,
            vec![StaticObstacle::new(
                ObstacleTag::Wall,
                Vec2::new(352.0, 288.0),
                32.0,
                32.0,
            )],
            None,
        )
        .expect("gate");
        let mut player = PlayerController::spawn(
            Grid::new(GRID_SIZE, Vec2::ZERO),
            Vec2::new(320.0, 320.0),
            160.0,
        );

        player.step(Some(Direction::Right), &gate, 1.0 / 60.0);
        player.animate(1.0 / 60.0);
        for _ in 0..120 {
            player.step(None, &gate, 1.0 / 60.0);
            player.animate(1.0 / 60.0);
        }
        assert_eq!(player.position(), Vec2::new(352.0, 320.0));

        let outcome = player.step(Some(Direction::Up), &gate, 1.0 / 60.0);
        player.animate(1.0 / 60.0);
        assert!(matches!(outcome, StepOutcome::Blocked { .. }));
        player.step(None, &gate, 1.0 / 60.0);
        player.animate(1.0 / 60.0);

        assert_eq!(player.position(), Vec2::new(352.0, 320.0));
        assert_eq!(
            player.animator().current(),
            ClipSelection {
                clip: AnimationClip::IdleSide,
                mirror: false
            }
        );
    }
}
