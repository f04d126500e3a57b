use engine::{
    load_map_file, resolve_app_paths, AppPaths, LoopConfig, MapLoadError, SceneKey,
    SceneRegistry, SceneRegistryError, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, LayoutError, LobbyLayout, RoomError};
use super::settings::{GameplaySettings, SettingsError};

const LOBBY_MAP_FILE: &str = "lobby.tmx";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) registry: SceneRegistry,
    pub(crate) start_scene: SceneKey,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Map(#[from] MapLoadError),
    #[error("lobby map is not usable: {0}")]
    Layout(#[from] LayoutError),
    #[error("room setup failed: {0}")]
    Room(#[from] RoomError),
    #[error(transparent)]
    Scenes(#[from] SceneRegistryError),
    #[error("start scene '{name}' is not one of the game scenes")]
    UnknownStartScene { name: String },
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_paths_resolved");
    wire(&paths)
}

/// Loads config and the lobby map and validates every room, so nothing past
/// this point can fail on bad assets.
fn wire(paths: &AppPaths) -> Result<AppWiring, BootstrapError> {
    let settings = GameplaySettings::load(&paths.config_dir)?;
    let start_scene = gameplay::scene_key_by_name(&settings.start_scene).ok_or_else(|| {
        BootstrapError::UnknownStartScene {
            name: settings.start_scene.clone(),
        }
    })?;

    let map = load_map_file(&paths.maps_dir.join(LOBBY_MAP_FILE))?;
    let layout = LobbyLayout::from_map(&map, settings.interaction_radius)?;

    let mut registry = SceneRegistry::new();
    for (key, scene) in gameplay::build_scenes(&layout, &settings)? {
        registry.register(key, scene)?;
    }
    info!(
        start_scene = %start_scene,
        scene_count = registry.keys().count(),
        npc_count = layout.npcs.len(),
        "scenes_registered"
    );

    Ok(AppWiring {
        config: LoopConfig {
            sprite_root: paths.sprites_dir.clone(),
            ..LoopConfig::default()
        },
        registry,
        start_scene,
    })
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use super::*;
    use crate::app::settings::SETTINGS_FILE_NAME;

    fn repo_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    /// Temp project root holding a copy of the shipped lobby map.
    fn temp_root() -> (TempDir, AppPaths) {
        let temp = TempDir::new().expect("temp");
        let paths = AppPaths::for_root(temp.path().to_path_buf());
        fs::create_dir_all(&paths.maps_dir).expect("maps dir");
        fs::create_dir_all(&paths.config_dir).expect("config dir");
        fs::copy(
            repo_root().join("assets/maps").join(LOBBY_MAP_FILE),
            paths.maps_dir.join(LOBBY_MAP_FILE),
        )
        .expect("copy lobby map");
        (temp, paths)
    }

    #[test]
    fn shipped_assets_wire_every_scene_and_start_on_title() {
        let paths = AppPaths::for_root(repo_root());
        let wiring = wire(&paths).expect("wiring");
        assert_eq!(wiring.start_scene, gameplay::TITLE);
        assert!(wiring.registry.contains(gameplay::TITLE));
        assert!(wiring.registry.contains(gameplay::LOBBY));
        assert!(wiring.registry.contains(gameplay::MISSION_CONTROL));
        assert_eq!(wiring.config.sprite_root, paths.sprites_dir);
    }

    #[test]
    fn start_scene_comes_from_settings() {
        let (_temp, paths) = temp_root();
        fs::write(
            paths.config_dir.join(SETTINGS_FILE_NAME),
            r#"{ "start_scene": "mission_control" }"#,
        )
        .expect("settings");
        let wiring = wire(&paths).expect("wiring");
        assert_eq!(wiring.start_scene, gameplay::MISSION_CONTROL);
    }

    #[test]
    fn absent_settings_start_on_title() {
        let (_temp, paths) = temp_root();
        let wiring = wire(&paths).expect("wiring");
        assert_eq!(wiring.start_scene, gameplay::TITLE);
        assert_eq!(wiring.registry.keys().count(), 3);
    }

    #[test]
    fn unknown_start_scene_is_rejected() {
        let (_temp, paths) = temp_root();
        fs::write(
            paths.config_dir.join(SETTINGS_FILE_NAME),
            r#"{ "start_scene": "rooftop" }"#,
        )
        .expect("settings");
        assert!(matches!(
            wire(&paths),
            Err(BootstrapError::UnknownStartScene { name }) if name == "rooftop"
        ));
    }

    #[test]
    fn missing_lobby_map_fails_before_the_window_opens() {
        let (_temp, paths) = temp_root();
        fs::remove_file(paths.maps_dir.join(LOBBY_MAP_FILE)).expect("remove map");
        assert!(matches!(wire(&paths), Err(BootstrapError::Map(_))));
    }

    #[test]
    fn lobby_map_without_collision_layer_is_rejected() {
        let (_temp, paths) = temp_root();
        let map_path = paths.maps_dir.join(LOBBY_MAP_FILE);
        let raw = fs::read_to_string(&map_path).expect("read map");
        fs::write(&map_path, raw.replace("name=\"collission\"", "name=\"walls\""))
            .expect("write map");
        assert!(matches!(
            wire(&paths),
            Err(BootstrapError::Layout(LayoutError::MissingTileLayer { .. }))
        ));
    }
}
