use engine::{Scene, SceneKey};

use crate::app::settings::GameplaySettings;

mod animation;
mod collision;
mod grid;
mod interaction;
mod layout;
mod lobby;
mod mission_control;
mod npc;
mod player;
mod room;
mod scene;
mod title;
mod transition;


pub(crate) use layout::{LayoutError, LobbyLayout};
pub(crate) use npc::DWELL_SECONDS;
pub(crate) use room::RoomError;

pub(crate) const TITLE: SceneKey = SceneKey::new("title");
pub(crate) const LOBBY: SceneKey = SceneKey::new("lobby");
pub(crate) const MISSION_CONTROL: SceneKey = SceneKey::new("mission_control");
pub(crate) const SCENE_KEYS: [SceneKey; 3] = [TITLE, LOBBY, MISSION_CONTROL];

pub(crate) fn scene_key_by_name(name: &str) -> Option<SceneKey> {
    SCENE_KEYS.into_iter().find(|key| key.name() == name)
}

/// The title screen and both rooms, validated and ready to register.
pub(crate) fn build_scenes(
    layout: &LobbyLayout,
    settings: &GameplaySettings,
) -> Result<Vec<(SceneKey, Box<dyn Scene>)>, RoomError> {
    let lobby = room::RoomDef::new(lobby::lobby_room(layout, settings))?;
    let mission_control =
        room::RoomDef::new(mission_control::mission_control_room(settings))?;
    let title: Box<dyn Scene> = Box::new(title::TitleScene::default());
    let lobby: Box<dyn Scene> = Box::new(scene::RoomScene::new(lobby));
    let mission_control: Box<dyn Scene> = Box::new(scene::RoomScene::new(mission_control));
    Ok(vec![
        (TITLE, title),
        (LOBBY, lobby),
        (MISSION_CONTROL, mission_control),
    ])
}
