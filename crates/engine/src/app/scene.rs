use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::input::{ActionStates, InputAction};
use super::signals::UiSignal;
use super::tilemap::Tilemap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneKey(&'static str);

impl SceneKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Data handed from an exiting scene to the scene it switches to.
/// Serialized field names match the shell's `{ fromDoor, playerX, playerY }` shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    pub from_door: bool,
    pub player_x: f32,
    pub player_y: f32,
}

impl HandoffPayload {
    pub fn from_door(spawn: Vec2) -> Self {
        Self {
            from_door: true,
            player_x: spawn.x,
            player_y: spawn.y,
        }
    }

    pub fn spawn(&self) -> Vec2 {
        Vec2 {
            x: self.player_x,
            y: self.player_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneCommand {
    None,
    SwitchTo {
        scene: SceneKey,
        payload: Option<HandoffPayload>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    interact_pressed: bool,
    cancel_pressed: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        interact_pressed: bool,
        cancel_pressed: bool,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            interact_pressed,
            cancel_pressed,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Edge-triggered: true only on the tick the interact key went down.
    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    /// Edge-triggered: true only on the tick the cancel key went down.
    pub fn cancel_pressed(&self) -> bool {
        self.cancel_pressed
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_interact_pressed(mut self, interact_pressed: bool) -> Self {
        self.interact_pressed = interact_pressed;
        self
    }

    pub fn with_cancel_pressed(mut self, cancel_pressed: bool) -> Self {
        self.cancel_pressed = cancel_pressed;
        self
    }

    /// Keeps the quit flag, drops everything a scene would react to.
    pub fn without_gameplay_input(mut self) -> Self {
        self.actions.clear_movement();
        self.interact_pressed = false;
        self.cancel_pressed = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle stored by center and size, matching how rooms are authored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(center: Vec2, width: f32, height: f32) -> Self {
        Self {
            center,
            width,
            height,
        }
    }

    pub fn from_top_left(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            center: Vec2 {
                x: x + width * 0.5,
                y: y + height * 0.5,
            },
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.width * 0.5
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.width * 0.5
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.height * 0.5
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.height * 0.5
    }

    /// Edges count as inside.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Touching edges do not count as overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// `position` is the world coordinate shown at the top-left corner of the viewport.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    pub fn center_on_clamped(&mut self, target: Vec2, viewport: Vec2, world_size: Vec2) {
        self.position.x = clamp_camera_axis(target.x - viewport.x * 0.5, viewport.x, world_size.x);
        self.position.y = clamp_camera_axis(target.y - viewport.y * 0.5, viewport.y, world_size.y);
    }
}

fn clamp_camera_axis(desired: f32, viewport: f32, world: f32) -> f32 {
    if world <= viewport {
        return (world - viewport) * 0.5;
    }
    desired.clamp(0.0, world - viewport)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder,
    Sprite(String),
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
}

/// Frame of a sprite sheet chosen by gameplay animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpriteFrame {
    pub index: u32,
    pub flip_x: bool,
}

/// Static scenery drawn under entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropVisual {
    pub rect: Rect,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
    pub size: Vec2,
    pub sprite_frame: SpriteFrame,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    camera: Camera2D,
    viewport_size: Vec2,
    tilemap: Option<Tilemap>,
    props: Vec<PropVisual>,
    dialog: Option<DialogView>,
    pending_signals: Vec<UiSignal>,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc, size: Vec2) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
            size,
            sprite_frame: SpriteFrame::default(),
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_spawns.is_empty() {
            self.entities.append(&mut self.pending_spawns);
        }

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_despawns.clear();
        }
    }

    /// Drops all scene state. Pending UI signals survive so signals raised during
    /// a scene's exit still reach the shell.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.camera = Camera2D::default();
        self.tilemap = None;
        self.props.clear();
        self.dialog = None;
    }

    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn set_props(&mut self, props: Vec<PropVisual>) {
        self.props = props;
    }

    pub fn props(&self) -> &[PropVisual] {
        &self.props
    }

    pub fn set_dialog(&mut self, dialog: Option<DialogView>) {
        self.dialog = dialog;
    }

    pub fn dialog(&self) -> Option<&DialogView> {
        self.dialog.as_ref()
    }

    pub fn publish(&mut self, signal: UiSignal) {
        self.pending_signals.push(signal);
    }

    pub fn take_signals(&mut self) -> Vec<UiSignal> {
        std::mem::take(&mut self.pending_signals)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    /// Visible world extent set by the host; survives `clear`.
    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport_size = size;
    }
}

/// Lifecycle hooks of one game scene. A scene is entered fresh on every switch;
/// nothing it builds in `enter` outlives its `exit`.
pub trait Scene {
    fn enter(&mut self, payload: Option<&HandoffPayload>, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &SceneWorld);
    fn exit(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneRegistryError {
    #[error("scene '{key}' is registered twice")]
    DuplicateScene { key: SceneKey },
    #[error("scene '{key}' is not registered")]
    UnknownScene { key: SceneKey },
}

struct SceneRuntime {
    key: SceneKey,
    scene: Box<dyn Scene>,
}

#[derive(Default)]
pub struct SceneRegistry {
    scenes: Vec<SceneRuntime>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        key: SceneKey,
        scene: Box<dyn Scene>,
    ) -> Result<(), SceneRegistryError> {
        if self.contains(key) {
            return Err(SceneRegistryError::DuplicateScene { key });
        }
        self.scenes.push(SceneRuntime { key, scene });
        Ok(())
    }

    pub fn contains(&self, key: SceneKey) -> bool {
        self.scenes.iter().any(|runtime| runtime.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = SceneKey> + '_ {
        self.scenes.iter().map(|runtime| runtime.key)
    }
}

pub(crate) struct SceneMachine {
    scenes: Vec<SceneRuntime>,
    active: usize,
    world: SceneWorld,
    is_entered: bool,
}

impl SceneMachine {
    pub(crate) fn new(
        registry: SceneRegistry,
        start_scene: SceneKey,
    ) -> Result<Self, SceneRegistryError> {
        let active = registry
            .scenes
            .iter()
            .position(|runtime| runtime.key == start_scene)
            .ok_or(SceneRegistryError::UnknownScene { key: start_scene })?;
        Ok(Self {
            scenes: registry.scenes,
            active,
            world: SceneWorld::default(),
            is_entered: false,
        })
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.scenes[self.active].key
    }

    pub(crate) fn enter_active(&mut self, payload: Option<&HandoffPayload>) {
        if self.is_entered {
            return;
        }
        let key = self.active_scene();
        self.scenes[self.active].scene.enter(payload, &mut self.world);
        self.world.apply_pending();
        self.world.publish(UiSignal::SceneEntered(key));
        self.is_entered = true;
    }

    pub(crate) fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> SceneCommand {
        let runtime = &mut self.scenes[self.active];
        runtime.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub(crate) fn apply_pending_active(&mut self) {
        self.world.apply_pending();
    }

    pub(crate) fn apply_command(&mut self, command: SceneCommand) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::SwitchTo { scene, payload } => self.switch_to(scene, payload),
        }
    }

    /// One-way switch: the active scene exits and its world is discarded, then the
    /// destination enters fresh with the payload. Re-entering the active key restarts it.
    pub(crate) fn switch_to(&mut self, next_scene: SceneKey, payload: Option<HandoffPayload>) -> bool {
        let Some(next_index) = self
            .scenes
            .iter()
            .position(|runtime| runtime.key == next_scene)
        else {
            warn!(scene = %next_scene, "scene_switch_unknown_target");
            return false;
        };

        let previous = self.active_scene();
        if self.is_entered {
            self.scenes[self.active].scene.exit(&mut self.world);
        }
        self.world.clear();
        self.is_entered = false;
        self.active = next_index;
        self.enter_active(payload.as_ref());
        info!(
            from = %previous,
            to = %next_scene,
            from_door = payload.is_some_and(|payload| payload.from_door),
            "scene_switched"
        );
        true
    }

    pub(crate) fn take_signals(&mut self) -> Vec<UiSignal> {
        self.world.take_signals()
    }

    pub(crate) fn render_active(&mut self) {
        let runtime = &mut self.scenes[self.active];
        runtime.scene.render(&self.world);
    }

    pub(crate) fn active_world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn active_world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        self.scenes[self.active].scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_entered {
            self.scenes[self.active].scene.exit(&mut self.world);
            self.world.clear();
            self.is_entered = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const ROOM_A: SceneKey = SceneKey::new("room_a");
    const ROOM_B: SceneKey = SceneKey::new("room_b");

    type EventLog = Rc<RefCell<Vec<String>>>;

    struct RecordingScene {
        name: &'static str,
        log: EventLog,
        spawn_count: usize,
        switch_on_update: Option<SceneCommand>,
    }

    impl RecordingScene {
        fn boxed(name: &'static str, log: &EventLog, spawn_count: usize) -> Box<dyn Scene> {
            Box::new(Self {
                name,
                log: Rc::clone(log),
                spawn_count,
                switch_on_update: None,
            })
        }
    }

    impl Scene for RecordingScene {
        fn enter(&mut self, payload: Option<&HandoffPayload>, world: &mut SceneWorld) {
            let spawn = payload.map(HandoffPayload::spawn).unwrap_or(Vec2::ZERO);
            for _ in 0..self.spawn_count {
                world.spawn(
                    Transform { position: spawn },
                    RenderableDesc {
                        kind: RenderableKind::Placeholder,
                        debug_name: "test",
                    },
                    Vec2::new(8.0, 8.0),
                );
            }
            self.log.borrow_mut().push(format!(
                "enter:{}:{}",
                self.name,
                payload.is_some_and(|payload| payload.from_door)
            ));
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            for entity in world.entities_mut() {
                entity.transform.position.x += 1.0;
            }
            self.switch_on_update.unwrap_or(SceneCommand::None)
        }

        fn render(&mut self, _world: &SceneWorld) {}

        fn exit(&mut self, world: &mut SceneWorld) {
            world.publish(UiSignal::DialogClosed);
            self.log.borrow_mut().push(format!("exit:{}", self.name));
        }
    }

    fn two_room_machine(log: &EventLog) -> SceneMachine {
        let mut registry = SceneRegistry::new();
        registry
            .register(ROOM_A, RecordingScene::boxed("a", log, 2))
            .expect("register a");
        registry
            .register(ROOM_B, RecordingScene::boxed("b", log, 1))
            .expect("register b");
        SceneMachine::new(registry, ROOM_A).expect("machine")
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let a = allocator.allocate();
        let b = allocator.allocate();
        assert_ne!(a, b);
        assert_eq!(b.0, a.0 + 1);
    }

    #[test]
    fn scene_world_spawn_and_despawn_updates_count() {
        let mut world = SceneWorld::default();
        let id = world.spawn(
            Transform::default(),
            RenderableDesc {
                kind: RenderableKind::Placeholder,
                debug_name: "a",
            },
            Vec2::new(4.0, 4.0),
        );
        assert_eq!(world.entity_count(), 0);
        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert!(world.despawn(id));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.despawn(id));
    }

    #[test]
    fn registry_rejects_duplicate_keys() {
        let log = EventLog::default();
        let mut registry = SceneRegistry::new();
        registry
            .register(ROOM_A, RecordingScene::boxed("a", &log, 0))
            .expect("first");
        let err = registry
            .register(ROOM_A, RecordingScene::boxed("a2", &log, 0))
            .expect_err("duplicate");
        assert_eq!(err, SceneRegistryError::DuplicateScene { key: ROOM_A });
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec![ROOM_A]);
    }

    #[test]
    fn machine_rejects_unknown_start_scene() {
        let registry = SceneRegistry::new();
        let err = SceneMachine::new(registry, ROOM_B)
            .err()
            .expect("unknown start");
        assert_eq!(err, SceneRegistryError::UnknownScene { key: ROOM_B });
    }

    #[test]
    fn switch_discards_source_state_and_enters_destination_fresh() {
        let log = EventLog::default();
        let mut machine = two_room_machine(&log);
        machine.enter_active(None);
        assert_eq!(machine.active_world().entity_count(), 2);
        let _ = machine.update_active(1.0 / 60.0, &InputSnapshot::empty());

        let payload = HandoffPayload::from_door(Vec2::new(360.0, 400.0));
        assert!(machine.switch_to(ROOM_B, Some(payload)));
        assert_eq!(machine.active_scene(), ROOM_B);
        assert_eq!(machine.active_world().entity_count(), 1);
        assert_eq!(
            machine.active_world().entities()[0].transform.position,
            Vec2::new(360.0, 400.0)
        );

        assert!(machine.switch_to(ROOM_A, None));
        assert_eq!(machine.active_world().entity_count(), 2);
        assert_eq!(
            machine.active_world().entities()[0].transform.position,
            Vec2::ZERO
        );
        assert_eq!(
            *log.borrow(),
            vec![
                "enter:a:false".to_string(),
                "exit:a".to_string(),
                "enter:b:true".to_string(),
                "exit:b".to_string(),
                "enter:a:false".to_string(),
            ]
        );
    }

    #[test]
    fn switch_to_unknown_scene_is_rejected_without_exiting() {
        let log = EventLog::default();
        let mut machine = two_room_machine(&log);
        machine.enter_active(None);
        assert!(!machine.switch_to(SceneKey::new("nowhere"), None));
        assert_eq!(machine.active_scene(), ROOM_A);
        assert_eq!(machine.active_world().entity_count(), 2);
        assert_eq!(*log.borrow(), vec!["enter:a:false".to_string()]);
    }

    #[test]
    fn update_command_is_applied_by_machine() {
        let log = EventLog::default();
        let mut registry = SceneRegistry::new();
        registry
            .register(
                ROOM_A,
                Box::new(RecordingScene {
                    name: "a",
                    log: Rc::clone(&log),
                    spawn_count: 0,
                    switch_on_update: Some(SceneCommand::SwitchTo {
                        scene: ROOM_B,
                        payload: None,
                    }),
                }),
            )
            .expect("a");
        registry
            .register(ROOM_B, RecordingScene::boxed("b", &log, 0))
            .expect("b");
        let mut machine = SceneMachine::new(registry, ROOM_A).expect("machine");
        machine.enter_active(None);

        let command = machine.update_active(1.0 / 60.0, &InputSnapshot::empty());
        assert!(machine.apply_command(command));
        assert_eq!(machine.active_scene(), ROOM_B);
        assert!(!machine.apply_command(SceneCommand::None));
    }

    #[test]
    fn signals_raised_on_exit_survive_the_switch() {
        let log = EventLog::default();
        let mut machine = two_room_machine(&log);
        machine.enter_active(None);
        assert_eq!(
            machine.take_signals(),
            vec![UiSignal::SceneEntered(ROOM_A)]
        );

        assert!(machine.switch_to(ROOM_B, None));
        assert_eq!(
            machine.take_signals(),
            vec![UiSignal::DialogClosed, UiSignal::SceneEntered(ROOM_B)]
        );
        assert!(machine.take_signals().is_empty());
    }

    #[test]
    fn clear_drops_tilemap_props_and_dialog() {
        let mut world = SceneWorld::default();
        world.set_tilemap(Tilemap::new(2, 2, 32.0, 32.0));
        world.set_props(vec![PropVisual {
            rect: Rect::new(Vec2::ZERO, 4.0, 4.0),
            color: [1, 2, 3, 255],
        }]);
        world.set_dialog(Some(DialogView {
            speaker: "a".to_string(),
            text: "b".to_string(),
        }));
        world.camera_mut().position = Vec2::new(3.0, 4.0);
        world.clear();
        assert!(world.tilemap().is_none());
        assert!(world.props().is_empty());
        assert!(world.dialog().is_none());
        assert_eq!(world.camera().position, Vec2::ZERO);
    }

    #[test]
    fn rect_contains_is_edge_inclusive_and_overlap_is_strict() {
        let wall = Rect::new(Vec2::new(360.0, 16.0), 720.0, 32.0);
        assert!(wall.contains_point(Vec2::new(0.0, 0.0)));
        assert!(wall.contains_point(Vec2::new(720.0, 32.0)));
        assert!(!wall.contains_point(Vec2::new(360.0, 32.5)));

        let touching = Rect::new(Vec2::new(360.0, 44.0), 24.0, 24.0);
        assert!(!wall.overlaps(&touching));
        let inside = Rect::new(Vec2::new(360.0, 40.0), 24.0, 24.0);
        assert!(wall.overlaps(&inside));
        assert!(inside.overlaps(&wall));
    }

    #[test]
    fn rect_from_top_left_matches_center_form() {
        let rect = Rect::from_top_left(408.0, 296.0, 32.0, 48.0);
        assert_eq!(rect, Rect::new(Vec2::new(424.0, 320.0), 32.0, 48.0));
    }

    #[test]
    fn handoff_payload_uses_shell_field_names() {
        let payload = HandoffPayload::from_door(Vec2::new(360.0, 400.0));
        let json = serde_json::to_value(payload).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "fromDoor": true, "playerX": 360.0, "playerY": 400.0 })
        );
    }

    #[test]
    fn gameplay_input_is_stripped_but_quit_survives() {
        let mut actions = ActionStates::default();
        actions.set(InputAction::MoveUp, true);
        let input = InputSnapshot::new(true, actions, true, true).without_gameplay_input();
        assert!(input.quit_requested());
        assert!(!input.is_down(InputAction::MoveUp));
        assert!(!input.interact_pressed());
        assert!(!input.cancel_pressed());
    }

    #[test]
    fn camera_centers_and_clamps_to_world() {
        let mut camera = Camera2D::default();
        let viewport = Vec2::new(720.0, 480.0);
        camera.center_on_clamped(Vec2::new(100.0, 100.0), viewport, Vec2::new(1440.0, 960.0));
        assert_eq!(camera.position, Vec2::ZERO);
        camera.center_on_clamped(Vec2::new(1400.0, 900.0), viewport, Vec2::new(1440.0, 960.0));
        assert_eq!(camera.position, Vec2::new(720.0, 480.0));
        camera.center_on_clamped(Vec2::new(0.0, 0.0), viewport, Vec2::new(704.0, 480.0));
        assert_eq!(camera.position, Vec2::new(-8.0, 0.0));
    }

    #[test]
    fn shutdown_exits_active_scene_once() {
        let log = EventLog::default();
        let mut machine = two_room_machine(&log);
        machine.enter_active(None);
        machine.shutdown();
        machine.shutdown();
        assert_eq!(
            *log.borrow(),
            vec!["enter:a:false".to_string(), "exit:a".to_string()]
        );
        assert_eq!(machine.active_world_mut().entity_count(), 0);
    }
}
