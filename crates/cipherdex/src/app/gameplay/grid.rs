use engine::{InputAction, InputSnapshot, Vec2};

use super::collision::CollisionGate;

pub(crate) const GRID_SIZE: f32 = 32.0;
/// Distance under which an in-flight step snaps onto its target.
pub(crate) const SNAP_EPSILON: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Checked in this order; the first held direction wins.
    pub(crate) const PRIORITY: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub(crate) fn from_input(input: &InputSnapshot) -> Option<Direction> {
        Self::PRIORITY
            .into_iter()
            .find(|direction| input.is_down(direction.action()))
    }

    /// Horizontal sign wins whenever there is any horizontal component.
    pub(crate) fn from_delta(dx: f32, dy: f32) -> Option<Direction> {
        if dx > 0.0 {
            Some(Direction::Right)
        } else if dx < 0.0 {
            Some(Direction::Left)
        } else if dy > 0.0 {
            Some(Direction::Down)
        } else if dy < 0.0 {
            Some(Direction::Up)
        } else {
            None
        }
    }

    fn action(self) -> InputAction {
        match self {
            Direction::Up => InputAction::MoveUp,
            Direction::Down => InputAction::MoveDown,
            Direction::Left => InputAction::MoveLeft,
            Direction::Right => InputAction::MoveRight,
        }
    }

    /// Unit step in world space; y grows downward.
    pub(crate) fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Lattice of legal resting positions: `origin + cell_size * (i, j)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Grid {
    pub(crate) cell_size: f32,
    pub(crate) origin: Vec2,
}

impl Grid {
    pub(crate) const fn new(cell_size: f32, origin: Vec2) -> Self {
        Self { cell_size, origin }
    }

    pub(crate) fn snap(&self, position: Vec2) -> Vec2 {
        let snap_axis = |value: f32, origin: f32| {
            origin + ((value - origin) / self.cell_size).round() * self.cell_size
        };
        Vec2 {
            x: snap_axis(position.x, self.origin.x),
            y: snap_axis(position.y, self.origin.y),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_aligned(&self, position: Vec2) -> bool {
        self.snap(position) == position
    }

    pub(crate) fn neighbor(&self, position: Vec2, direction: Direction) -> Vec2 {
        let unit = direction.unit();
        self.snap(Vec2 {
            x: position.x + unit.x * self.cell_size,
            y: position.y + unit.y * self.cell_size,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EntityTransform {
    pub(crate) position: Vec2,
    pub(crate) facing: Direction,
    pub(crate) target: Vec2,
    pub(crate) moving: bool,
}

impl EntityTransform {
    pub(crate) fn at(position: Vec2, facing: Direction) -> Self {
        Self {
            position,
            facing,
            target: position,
            moving: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StepOutcome {
    Started { target: Vec2 },
    /// Collision gate refused the cell. Facing is left as it was, so the idle
    /// pose keeps showing the last completed move.
    Blocked { target: Vec2 },
    /// A step is already in flight; input is ignored until it settles.
    Busy,
    NoInput,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GridMotion {
    grid: Grid,
}

impl GridMotion {
    pub(crate) fn new(grid: Grid) -> Self {
        Self { grid }
    }

    pub(crate) fn try_begin_step(
        &self,
        transform: &mut EntityTransform,
        direction: Option<Direction>,
        gate: &CollisionGate,
    ) -> StepOutcome {
        if transform.moving {
            return StepOutcome::Busy;
        }
        let Some(direction) = direction else {
            return StepOutcome::NoInput;
        };

        let target = self.grid.neighbor(transform.position, direction);
        if !gate.can_move(target) {
            return StepOutcome::Blocked { target };
        }
        transform.facing = direction;
        transform.target = target;
        transform.moving = true;
        StepOutcome::Started { target }
    }

    /// Moves toward the target at `speed` units/s; returns true on the tick the
    /// step settles. The snap check runs before movement, so a step that lands
    /// exactly on its target settles on the following tick.
    pub(crate) fn advance(&self, transform: &mut EntityTransform, speed: f32, dt: f32) -> bool {
        if !transform.moving {
            return false;
        }
        let (position, arrived) = step_toward(transform.position, transform.target, speed, dt);
        transform.position = position;
        if arrived {
            transform.moving = false;
        }
        arrived
    }
}

/// Snaps when already within `SNAP_EPSILON`, otherwise moves at most `speed * dt`
/// along the bearing and never passes the target.
pub(crate) fn step_toward(current: Vec2, target: Vec2, speed: f32, dt: f32) -> (Vec2, bool) {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance < SNAP_EPSILON {
        return (target, true);
    }

    let max_step = (speed * dt).max(0.0);
    if max_step >= distance {
        return (target, false);
    }

    let inv_distance = distance.recip();
    (
        Vec2 {
            x: current.x + dx * inv_distance * max_step,
            y: current.y + dy * inv_distance * max_step,
        },
        false,
    )
}
