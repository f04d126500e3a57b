use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::debug;

use crate::app::{Tilemap, Vec2};

use super::map::{MapDef, MapObject, ObjectLayer};

/// Tiled stores flip/rotation flags in the top bits of each gid.
const GID_FLAG_MASK: u32 = 0x1FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    MissingAttribute,
    InvalidValue,
    UnsupportedEncoding,
    InvalidLayer,
}

#[derive(Debug, Clone)]
pub struct MapLoadError {
    pub code: MapErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for MapLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for MapLoadError {}

pub fn load_map_file(path: &Path) -> Result<MapDef, MapLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| MapLoadError {
        code: MapErrorCode::ReadFile,
        message: format!("failed to read map file: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    let map = parse_map(&raw, path)?;
    debug!(
        path = %path.display(),
        width = map.tilemap.width(),
        height = map.tilemap.height(),
        tile_layers = map.tilemap.layers().len(),
        object_layers = map.object_layers.len(),
        "map_loaded"
    );
    Ok(map)
}

/// Parses an orthogonal Tiled map with CSV-encoded tile layers.
/// `file_path` is only used for error reporting.
pub fn parse_map(raw: &str, file_path: &Path) -> Result<MapDef, MapLoadError> {
    let doc = Document::parse(raw).map_err(|error| MapLoadError {
        code: MapErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = ParseContext {
        doc: &doc,
        file_path,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(ctx.error_at_node(
            MapErrorCode::InvalidRoot,
            "root element must be <map>".to_string(),
            root,
        ));
    }

    let width: u32 = ctx.required_attr(root, "width")?;
    let height: u32 = ctx.required_attr(root, "height")?;
    let tile_width: f32 = ctx.required_attr(root, "tilewidth")?;
    let tile_height: f32 = ctx.required_attr(root, "tileheight")?;
    if width == 0 || height == 0 || tile_width <= 0.0 || tile_height <= 0.0 {
        return Err(ctx.error_at_node(
            MapErrorCode::InvalidValue,
            "map dimensions and tile size must be positive".to_string(),
            root,
        ));
    }

    let mut tilemap = Tilemap::new(width, height, tile_width, tile_height);
    let mut object_layers = Vec::<ObjectLayer>::new();
    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "layer" => {
                let name = ctx.required_str(child, "name")?;
                let tiles = ctx.parse_layer_data(child)?;
                tilemap
                    .add_layer(name, tiles)
                    .map_err(|error| ctx.error_at_node(MapErrorCode::InvalidLayer, error.to_string(), child))?;
            }
            "objectgroup" => object_layers.push(ctx.parse_object_group(child)?),
            other => {
                debug!(element = other, "map_element_ignored");
            }
        }
    }

    Ok(MapDef {
        tilemap,
        object_layers,
    })
}

struct ParseContext<'a, 'input> {
    doc: &'a Document<'input>,
    file_path: &'a Path,
}

impl<'a, 'input> ParseContext<'a, 'input> {
    fn error_at_node(&self, code: MapErrorCode, message: String, node: Node<'_, '_>) -> MapLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        MapLoadError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_str<'n>(&self, node: Node<'n, 'input>, name: &str) -> Result<&'n str, MapLoadError> {
        node.attribute(name).ok_or_else(|| {
            self.error_at_node(
                MapErrorCode::MissingAttribute,
                format!("<{}> is missing attribute '{name}'", node.tag_name().name()),
                node,
            )
        })
    }

    fn required_attr<T: FromStr>(&self, node: Node<'_, 'input>, name: &str) -> Result<T, MapLoadError> {
        let raw = self.required_str(node, name)?;
        self.parse_value(node, name, raw)
    }

    fn optional_attr<T: FromStr>(
        &self,
        node: Node<'_, 'input>,
        name: &str,
        default: T,
    ) -> Result<T, MapLoadError> {
        match node.attribute(name) {
            Some(raw) => self.parse_value(node, name, raw),
            None => Ok(default),
        }
    }

    fn parse_value<T: FromStr>(&self, node: Node<'_, '_>, name: &str, raw: &str) -> Result<T, MapLoadError> {
        raw.trim().parse::<T>().map_err(|_| {
            self.error_at_node(
                MapErrorCode::InvalidValue,
                format!(
                    "attribute '{name}' on <{}> has invalid value '{raw}'",
                    node.tag_name().name()
                ),
                node,
            )
        })
    }

    fn parse_layer_data(&self, layer: Node<'_, 'input>) -> Result<Vec<u32>, MapLoadError> {
        let Some(data) = layer
            .children()
            .find(|node| node.is_element() && node.tag_name().name() == "data")
        else {
            return Err(self.error_at_node(
                MapErrorCode::InvalidLayer,
                "tile layer has no <data> element".to_string(),
                layer,
            ));
        };
        match data.attribute("encoding") {
            Some("csv") => {}
            other => {
                return Err(self.error_at_node(
                    MapErrorCode::UnsupportedEncoding,
                    format!(
                        "tile layer data must be csv-encoded, found {}",
                        other.unwrap_or("<none>")
                    ),
                    data,
                ));
            }
        }

        let text = data.text().unwrap_or_default();
        text.split(',')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(|cell| {
                cell.parse::<u32>()
                    .map(|gid| gid & GID_FLAG_MASK)
                    .map_err(|_| {
                        self.error_at_node(
                            MapErrorCode::InvalidValue,
                            format!("invalid tile id '{cell}' in csv data"),
                            data,
                        )
                    })
            })
            .collect()
    }

    fn parse_object_group(&self, group: Node<'_, 'input>) -> Result<ObjectLayer, MapLoadError> {
        let name = self.required_str(group, "name")?.to_string();
        let mut objects = Vec::new();
        for object in group
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "object")
        {
            objects.push(self.parse_object(object)?);
        }
        Ok(ObjectLayer { name, objects })
    }

    fn parse_object(&self, object: Node<'_, 'input>) -> Result<MapObject, MapLoadError> {
        let class = object
            .attribute("type")
            .or_else(|| object.attribute("class"))
            .unwrap_or_default()
            .to_string();
        let mut properties = BTreeMap::new();
        let mut polyline = None;
        for child in object.children().filter(|node| node.is_element()) {
            match child.tag_name().name() {
                "properties" => self.parse_properties(child, &mut properties)?,
                "polyline" | "polygon" => {
                    polyline = Some(self.parse_points(child)?);
                }
                _ => {}
            }
        }

        Ok(MapObject {
            id: self.required_attr(object, "id")?,
            name: object.attribute("name").unwrap_or_default().to_string(),
            class,
            x: self.required_attr(object, "x")?,
            y: self.required_attr(object, "y")?,
            width: self.optional_attr(object, "width", 0.0)?,
            height: self.optional_attr(object, "height", 0.0)?,
            properties,
            polyline,
        })
    }

    fn parse_properties(
        &self,
        node: Node<'_, 'input>,
        properties: &mut BTreeMap<String, String>,
    ) -> Result<(), MapLoadError> {
        for property in node
            .children()
            .filter(|child| child.is_element() && child.tag_name().name() == "property")
        {
            let name = self.required_str(property, "name")?;
            // Multi-line string properties are stored as element text.
            let value = property
                .attribute("value")
                .or_else(|| property.text())
                .unwrap_or_default();
            properties.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn parse_points(&self, node: Node<'_, 'input>) -> Result<Vec<Vec2>, MapLoadError> {
        let raw = self.required_str(node, "points")?;
        raw.split_whitespace()
            .map(|pair| {
                let parsed = pair
                    .split_once(',')
                    .and_then(|(x, y)| Some(Vec2::new(x.parse().ok()?, y.parse().ok()?)));
                parsed.ok_or_else(|| {
                    self.error_at_node(
                        MapErrorCode::InvalidValue,
                        format!("invalid point '{pair}'"),
                        node,
                    )
                })
            })
            .collect()
    }
}
