use std::path::{Path, PathBuf};

use thiserror::Error;

/// Sprite keys name sheets under the sprite root, e.g. `player2` or `npc/guard`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must be relative")]
    Absolute,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

pub(crate) fn sprite_sheet_path(sprite_root: &Path, key: &str) -> Result<PathBuf, SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::Absolute);
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    if let Some(character) = key
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '/')))
    {
        return Err(SpriteKeyError::InvalidCharacter { character });
    }
    Ok(sprite_root.join(format!("{key}.png")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_path_appends_png_under_root() {
        let root = Path::new("assets/sprites");
        assert_eq!(
            sprite_sheet_path(root, "player2").expect("player2"),
            root.join("player2.png")
        );
        assert_eq!(
            sprite_sheet_path(root, "npc/Guard_1").expect("nested"),
            root.join("npc/Guard_1.png")
        );
    }

    #[test]
    fn rejects_keys_escaping_the_root() {
        let root = Path::new("assets/sprites");
        assert_eq!(sprite_sheet_path(root, ""), Err(SpriteKeyError::Empty));
        assert_eq!(sprite_sheet_path(root, "/etc/x"), Err(SpriteKeyError::Absolute));
        assert_eq!(
            sprite_sheet_path(root, "a/../b"),
            Err(SpriteKeyError::ParentTraversal)
        );
        assert_eq!(
            sprite_sheet_path(root, r"a\b"),
            Err(SpriteKeyError::InvalidCharacter { character: '\\' })
        );
        assert_eq!(
            sprite_sheet_path(root, "a.png"),
            Err(SpriteKeyError::InvalidCharacter { character: '.' })
        );
    }
}
