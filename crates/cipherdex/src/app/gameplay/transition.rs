use engine::{HandoffPayload, Rect, SceneCommand, SceneKey};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransitionZone {
    pub(crate) destination: SceneKey,
    pub(crate) trigger: Rect,
    pub(crate) payload: Option<HandoffPayload>,
}

/// Fires at most once per scene lifetime; a fresh trigger is built on every enter.
#[derive(Debug, Clone)]
pub(crate) struct ZoneTransitionTrigger {
    zones: Vec<TransitionZone>,
    armed: bool,
}

impl ZoneTransitionTrigger {
    pub(crate) fn new(zones: Vec<TransitionZone>) -> Self {
        Self { zones, armed: true }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.armed
    }

    pub(crate) fn check(&mut self, entity_box: &Rect, moving: bool) -> SceneCommand {
        if !self.armed || moving {
            return SceneCommand::None;
        }
        let Some(zone) = self
            .zones
            .iter()
            .find(|zone| zone.trigger.overlaps(entity_box))
        else {
            return SceneCommand::None;
        };

        self.armed = false;
        info!(
            destination = %zone.destination,
            x = entity_box.center.x,
            y = entity_box.center.y,
            "zone_triggered"
        );
        SceneCommand::SwitchTo {
            scene: zone.destination,
            payload: zone.payload,
        }
    }
}
