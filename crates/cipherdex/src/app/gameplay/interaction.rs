use engine::{DialogView, InputSnapshot, SceneWorld, UiSignal, Vec2};
use tracing::info;

pub(crate) const INTERACTION_RADIUS: f32 = 48.0;
const BRIEFING_SPEAKER: &str = "Director";
const BRIEFING_TEXT: &str =
    "Welcome to Mission Control, agent. Your first cipher is waiting at the terminals.";
const TERMINAL_SPEAKER: &str = "Terminal";
const TERMINAL_TEXT: &str = "> connection established";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InteractionKind {
    Terminal,
    Briefing,
    Dialog { speaker: String, line: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InteractionPoint {
    pub(crate) kind: InteractionKind,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
}

impl InteractionPoint {
    pub(crate) fn new(kind: InteractionKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            radius: INTERACTION_RADIUS,
        }
    }

    pub(crate) fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionOutcome {
    Idle,
    Opened,
    Closed,
    /// A dialog or terminal is showing; gameplay input must be ignored.
    Blocking,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct InteractionController {
    open: Option<InteractionKind>,
}

impl InteractionController {
    pub(crate) fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Nearest point whose radius strictly contains `from`.
    pub(crate) fn nearest<'a>(
        points: &'a [InteractionPoint],
        from: Vec2,
    ) -> Option<&'a InteractionPoint> {
        points
            .iter()
            .map(|point| (point, point.position.distance_to(from)))
            .filter(|(point, distance)| *distance < point.radius)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(point, _)| point)
    }

    pub(crate) fn update(
        &mut self,
        input: &InputSnapshot,
        actor: Vec2,
        actor_moving: bool,
        points: &[InteractionPoint],
        world: &mut SceneWorld,
    ) -> InteractionOutcome {
        if self.open.is_some() {
            if input.cancel_pressed() {
                self.close(world);
                return InteractionOutcome::Closed;
            }
            return InteractionOutcome::Blocking;
        }

        if !input.interact_pressed() || actor_moving {
            return InteractionOutcome::Idle;
        }
        let Some(point) = Self::nearest(points, actor) else {
            return InteractionOutcome::Idle;
        };
        self.open(point.kind.clone(), world);
        InteractionOutcome::Opened
    }

    pub(crate) fn close(&mut self, world: &mut SceneWorld) {
        if self.open.take().is_some() {
            world.set_dialog(None);
            world.publish(UiSignal::DialogClosed);
        }
    }

    fn open(&mut self, kind: InteractionKind, world: &mut SceneWorld) {
        let view = match &kind {
            InteractionKind::Terminal => {
                world.publish(UiSignal::TerminalOpened);
                DialogView {
                    speaker: TERMINAL_SPEAKER.to_string(),
                    text: TERMINAL_TEXT.to_string(),
                }
            }
            InteractionKind::Briefing => dialog(world, BRIEFING_SPEAKER, BRIEFING_TEXT),
            InteractionKind::Dialog { speaker, line } => dialog(world, speaker, line),
        };
        info!(speaker = %view.speaker, kind = ?kind, "interaction_opened");
        world.set_dialog(Some(view));
        self.open = Some(kind);
    }
}

fn dialog(world: &mut SceneWorld, speaker: &str, text: &str) -> DialogView {
    world.publish(UiSignal::DialogOpened {
        speaker: speaker.to_string(),
        text: text.to_string(),
    });
    DialogView {
        speaker: speaker.to_string(),
        text: text.to_string(),
    }
}
