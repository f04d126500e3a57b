use engine::{HandoffPayload, MapDef, MapObject, Tilemap, Vec2};
use thiserror::Error;
use tracing::{debug, warn};

use super::interaction::{InteractionKind, InteractionPoint};
use super::room::{npc_dialog, NpcSpawn};
use super::scene_key_by_name;
use super::transition::TransitionZone;

pub(crate) const COLLISION_LAYER: &str = "collission";
pub(crate) const OBJECTS_LAYER: &str = "objects";
pub(crate) const NPC_LAYER: &str = "npc";
const SPAWN_OBJECT: &str = "spawn";
const DOOR_CLASS: &str = "door";
const INTERACTION_CLASS: &str = "interaction";
const NPC_DIALOG_RADIUS: f32 = 64.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum LayoutError {
    #[error("map has no tile layer '{layer}'")]
    MissingTileLayer { layer: &'static str },
    #[error("map has no object layer '{layer}'")]
    MissingObjectLayer { layer: &'static str },
    #[error("object layer 'objects' has no object named 'spawn'")]
    MissingSpawn,
    #[error("object '{object}' is missing property '{property}'")]
    MissingProperty { object: String, property: &'static str },
    #[error("object '{object}' property '{property}' has invalid value '{value}'")]
    InvalidProperty {
        object: String,
        property: &'static str,
        value: String,
    },
    #[error("door '{object}' leads to unknown scene '{destination}'")]
    UnknownDestination { object: String, destination: String },
}

/// Lobby contents extracted from its TMX map. Built once at startup, so a bad
/// map fails before the window opens.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LobbyLayout {
    pub(crate) tilemap: Tilemap,
    pub(crate) spawn: Vec2,
    pub(crate) doors: Vec<TransitionZone>,
    pub(crate) npcs: Vec<NpcSpawn>,
    pub(crate) interactions: Vec<InteractionPoint>,
}

impl LobbyLayout {
    pub(crate) fn from_map(map: &MapDef, interaction_radius: f32) -> Result<Self, LayoutError> {
        if map.tilemap.layer(COLLISION_LAYER).is_none() {
            return Err(LayoutError::MissingTileLayer {
                layer: COLLISION_LAYER,
            });
        }
        let objects = map
            .object_layer(OBJECTS_LAYER)
            .ok_or(LayoutError::MissingObjectLayer {
                layer: OBJECTS_LAYER,
            })?;

        let spawn = objects
            .objects
            .iter()
            .find(|object| object.name == SPAWN_OBJECT)
            .map(MapObject::position)
            .ok_or(LayoutError::MissingSpawn)?;

        let mut doors = Vec::new();
        let mut interactions = Vec::new();
        for object in &objects.objects {
            match object.class.as_str() {
                DOOR_CLASS => doors.push(parse_door(object)?),
                INTERACTION_CLASS => interactions.push(parse_interaction(object, interaction_radius)?),
                _ if object.name == SPAWN_OBJECT => {}
                other => debug!(object = %display_name(object), class = other, "layout_object_ignored"),
            }
        }

        let npcs = match map.object_layer(NPC_LAYER) {
            Some(layer) => layer
                .objects
                .iter()
                .map(parse_npc)
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                warn!(layer = NPC_LAYER, "layout_npc_layer_missing");
                Vec::new()
            }
        };

        Ok(Self {
            tilemap: map.tilemap.clone(),
            spawn,
            doors,
            npcs,
            interactions,
        })
    }
}

fn display_name(object: &MapObject) -> String {
    if object.name.is_empty() {
        format!("#{}", object.id)
    } else {
        object.name.clone()
    }
}

fn required<'a>(object: &'a MapObject, property: &'static str) -> Result<&'a str, LayoutError> {
    object
        .property(property)
        .ok_or_else(|| LayoutError::MissingProperty {
            object: display_name(object),
            property,
        })
}

fn parse_f32(object: &MapObject, property: &'static str, value: &str) -> Result<f32, LayoutError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| LayoutError::InvalidProperty {
            object: display_name(object),
            property,
            value: value.to_string(),
        })
}

fn optional_f32(object: &MapObject, property: &'static str) -> Result<Option<f32>, LayoutError> {
    object
        .property(property)
        .map(|value| parse_f32(object, property, value))
        .transpose()
}

fn parse_door(object: &MapObject) -> Result<TransitionZone, LayoutError> {
    let destination_name = required(object, "destination")?;
    let destination =
        scene_key_by_name(destination_name).ok_or_else(|| LayoutError::UnknownDestination {
            object: display_name(object),
            destination: destination_name.to_string(),
        })?;

    let payload = match (optional_f32(object, "spawnX")?, optional_f32(object, "spawnY")?) {
        (Some(x), Some(y)) => Some(HandoffPayload::from_door(Vec2::new(x, y))),
        (None, None) => None,
        (Some(_), None) => {
            return Err(LayoutError::MissingProperty {
                object: display_name(object),
                property: "spawnY",
            })
        }
        (None, Some(_)) => {
            return Err(LayoutError::MissingProperty {
                object: display_name(object),
                property: "spawnX",
            })
        }
    };

    Ok(TransitionZone {
        destination,
        trigger: object.rect(),
        payload,
    })
}

fn parse_interaction(object: &MapObject, default_radius: f32) -> Result<InteractionPoint, LayoutError> {
    let kind = match required(object, "kind")? {
        "terminal" => InteractionKind::Terminal,
        "briefing" => InteractionKind::Briefing,
        "dialog" => InteractionKind::Dialog {
            speaker: required(object, "speaker")?.to_string(),
            line: required(object, "text")?.to_string(),
        },
        other => {
            return Err(LayoutError::InvalidProperty {
                object: display_name(object),
                property: "kind",
                value: other.to_string(),
            })
        }
    };
    // Point objects have no size; sized ones interact from their center.
    let position = if object.width > 0.0 && object.height > 0.0 {
        object.rect().center
    } else {
        object.position()
    };
    let radius = optional_f32(object, "radius")?.unwrap_or(default_radius);
    Ok(InteractionPoint::new(kind, position).with_radius(radius))
}

fn parse_npc(object: &MapObject) -> Result<NpcSpawn, LayoutError> {
    let npc_type = required(object, "npcType")?.to_string();
    let waypoints = match object.polyline_world() {
        Some(points) => points,
        None => parse_waypoints(object, required(object, "waypoints")?)?,
    };

    let dialog = match object.property("dialog") {
        Some(line) => {
            let speaker = if object.name.is_empty() {
                npc_type.as_str()
            } else {
                object.name.as_str()
            };
            let radius = optional_f32(object, "radius")?.unwrap_or(NPC_DIALOG_RADIUS);
            Some(npc_dialog(speaker, line, radius))
        }
        None => None,
    };

    Ok(NpcSpawn {
        npc_type,
        waypoints,
        dialog,
    })
}

/// `"x,y x,y ..."` in world units.
fn parse_waypoints(object: &MapObject, raw: &str) -> Result<Vec<Vec2>, LayoutError> {
    raw.split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| LayoutError::InvalidProperty {
                    object: display_name(object),
                    property: "waypoints",
                    value: raw.to_string(),
                })?;
            Ok(Vec2::new(
                parse_f32(object, "waypoints", x)?,
                parse_f32(object, "waypoints", y)?,
            ))
        })
        .collect()
}
