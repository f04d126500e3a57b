mod map;
mod tmx;

pub use map::{MapDef, MapObject, ObjectLayer};
pub use tmx::{load_map_file, parse_map, MapErrorCode, MapLoadError, SourceLocation};
