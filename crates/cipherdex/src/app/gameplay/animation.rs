use engine::SpriteFrame;

use super::grid::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum AnimationClip {
    IdleDown,
    IdleUp,
    IdleSide,
    WalkDown,
    WalkUp,
    WalkSide,
}

impl AnimationClip {
    pub(crate) fn name(self) -> &'static str {
        match self {
            AnimationClip::IdleDown => "idle-down",
            AnimationClip::IdleUp => "idle-up",
            AnimationClip::IdleSide => "idle-side",
            AnimationClip::WalkDown => "walk-down",
            AnimationClip::WalkUp => "walk-up",
            AnimationClip::WalkSide => "walk-side",
        }
    }

    fn is_walk(self) -> bool {
        matches!(
            self,
            AnimationClip::WalkDown | AnimationClip::WalkUp | AnimationClip::WalkSide
        )
    }

    /// Sheet column holding this clip's frames.
    fn column(self) -> u32 {
        match self {
            AnimationClip::IdleDown | AnimationClip::WalkDown => 0,
            AnimationClip::IdleUp | AnimationClip::WalkUp => 1,
            AnimationClip::IdleSide | AnimationClip::WalkSide => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClipSelection {
    pub(crate) clip: AnimationClip,
    /// Side clips are authored facing right; left mirrors them.
    pub(crate) mirror: bool,
}

pub(crate) fn select_clip(facing: Direction, moving: bool) -> ClipSelection {
    let clip = match (facing, moving) {
        (Direction::Down, false) => AnimationClip::IdleDown,
        (Direction::Up, false) => AnimationClip::IdleUp,
        (Direction::Left | Direction::Right, false) => AnimationClip::IdleSide,
        (Direction::Down, true) => AnimationClip::WalkDown,
        (Direction::Up, true) => AnimationClip::WalkUp,
        (Direction::Left | Direction::Right, true) => AnimationClip::WalkSide,
    };
    ClipSelection {
        clip,
        mirror: facing == Direction::Left,
    }
}

/// Sheet layout: one column per direction, walk frames stacked in rows, row 0
/// doubling as the idle pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpriteSheetLayout {
    pub(crate) columns: u32,
    pub(crate) walk_fps: f32,
    pub(crate) walk_frames: u32,
}

impl Default for SpriteSheetLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            walk_fps: 8.0,
            walk_frames: 4,
        }
    }
}

impl SpriteSheetLayout {
    pub(crate) fn frame_index(&self, clip: AnimationClip, elapsed_seconds: f32) -> u32 {
        let row = if clip.is_walk() && self.walk_frames > 0 {
            let ticks = (elapsed_seconds.max(0.0) * self.walk_fps).floor() as u32;
            ticks % self.walk_frames
        } else {
            0
        };
        row * self.columns + clip.column()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Animator {
    layout: SpriteSheetLayout,
    current: ClipSelection,
    elapsed_seconds: f32,
}

impl Animator {
    pub(crate) fn new(facing: Direction) -> Self {
        Self {
            layout: SpriteSheetLayout::default(),
            current: select_clip(facing, false),
            elapsed_seconds: 0.0,
        }
    }

    pub(crate) fn current(&self) -> ClipSelection {
        self.current
    }

    /// The walk cycle keeps running across consecutive cells in one direction;
    /// it restarts only when the sheet column changes.
    pub(crate) fn update(&mut self, facing: Direction, moving: bool, dt: f32) -> SpriteFrame {
        let next = select_clip(facing, moving);
        if next.clip.column() != self.current.clip.column() {
            self.elapsed_seconds = 0.0;
        } else {
            self.elapsed_seconds += dt.max(0.0);
        }
        self.current = next;
        SpriteFrame {
            index: self.layout.frame_index(next.clip, self.elapsed_seconds),
            flip_x: next.mirror,
        }
    }
}
