use engine::{HandoffPayload, InputSnapshot, Scene, SceneCommand, SceneWorld};
use tracing::info;

use super::room::{Room, RoomDef};

/// Scene shell around a room: owns the immutable definition and the per-visit
/// runtime, which exists only between `enter` and `exit`.
pub(crate) struct RoomScene {
    def: RoomDef,
    room: Option<Room>,
}

impl RoomScene {
    pub(crate) fn new(def: RoomDef) -> Self {
        Self { def, room: None }
    }

    #[cfg(test)]
    pub(crate) fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }
}

impl Scene for RoomScene {
    fn enter(&mut self, payload: Option<&HandoffPayload>, world: &mut SceneWorld) {
        self.room = Some(Room::enter(&self.def, payload, world));
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        match self.room.as_mut() {
            Some(room) => room.update(&self.def, fixed_dt_seconds, input, world),
            None => SceneCommand::None,
        }
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn exit(&mut self, world: &mut SceneWorld) {
        if let Some(mut room) = self.room.take() {
            room.exit(world);
        }
        info!(
            scene = %self.def.key(),
            entity_count = world.entity_count(),
            "room_exited"
        );
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        self.room
            .as_ref()
            .map(|room| room.debug_title(&self.def, world))
    }
}
