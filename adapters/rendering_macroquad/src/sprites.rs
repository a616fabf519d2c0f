use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use caveslave_core::Rect;
use caveslave_rendering::SpriteKey;
use macroquad::{
    color::Color as MacroquadColor,
    math::{Rect as MacroquadRect, Vec2 as MacroquadVec2},
    texture::{self, DrawTextureParams, FilterMode, Texture2D},
};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const ALL_SPRITE_KEYS: [SpriteKey; 2] = [SpriteKey::TileSheet, SpriteKey::Player];

/// Texture handle that releases its GPU memory when dropped.
#[derive(Debug)]
pub(crate) struct OwnedTexture {
    texture: Texture2D,
    release: fn(Texture2D),
}

impl OwnedTexture {
    fn managed(texture: Texture2D) -> Self {
        Self {
            texture,
            release: |texture| texture.delete(),
        }
    }

    #[cfg(test)]
    fn unmanaged(texture: Texture2D) -> Self {
        Self {
            texture,
            release: |_| {},
        }
    }
}

impl Drop for OwnedTexture {
    fn drop(&mut self) {
        (self.release)(self.texture);
    }
}

/// Textures loaded from the sprite manifest.
///
/// Textures already loaded are released if a later entry fails, and all of
/// them are released when the atlas goes out of scope.
#[derive(Debug)]
pub(crate) struct SpriteAtlas {
    textures: HashMap<SpriteKey, OwnedTexture>,
}

impl SpriteAtlas {
    /// Loads sprites from the manifest located at the provided path.
    pub(crate) fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Draws `source` out of the requested sprite into `dest`, in screen pixels.
    pub(crate) fn draw(
        &self,
        key: SpriteKey,
        source: Option<Rect>,
        dest: Rect,
        flip_x: bool,
        tint: MacroquadColor,
    ) -> Result<()> {
        let texture = self
            .texture(key)
            .with_context(|| format!("sprite {key:?} missing from atlas"))?;

        let params = DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(dest.width, dest.height)),
            source: source.map(|rect| MacroquadRect::new(rect.x, rect.y, rect.width, rect.height)),
            flip_x,
            ..DrawTextureParams::default()
        };
        texture::draw_texture_ex(texture, dest.x, dest.y, tint, params);

        Ok(())
    }

    /// Width of the requested texture in pixels.
    pub(crate) fn width(&self, key: SpriteKey) -> Option<u32> {
        self.texture(key).map(|texture| texture.width() as u32)
    }

    fn texture(&self, key: SpriteKey) -> Option<Texture2D> {
        self.textures.get(&key).map(|owned| owned.texture)
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(SpriteKey, &Path) -> Result<OwnedTexture>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Self::from_entries(entries, &mut loader)
    }

    fn from_entries(
        entries: Vec<(SpriteKey, PathBuf)>,
        loader: &mut impl FnMut(SpriteKey, &Path) -> Result<OwnedTexture>,
    ) -> Result<Self> {
        let mut textures = HashMap::with_capacity(entries.len());
        for (key, path) in entries {
            let texture = loader(key, &path).with_context(|| {
                format!("failed to load sprite {key:?} from {}", path.display())
            })?;
            if textures.insert(key, texture).is_some() {
                bail!("duplicate sprite entry for {key:?}");
            }
        }
        Ok(Self { textures })
    }
}

fn default_loader(_key: SpriteKey, path: &Path) -> Result<OwnedTexture> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    let texture = Texture2D::from_file_with_format(&bytes, None);
    texture.set_filter(FilterMode::Nearest);
    Ok(OwnedTexture::managed(texture))
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    sprites: HashMap<String, String>,
}

fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(SpriteKey, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported sprite manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.sprites {
        let key = parse_sprite_key(&name)?;
        if resolved.insert(key, base_path.join(relative_path)).is_some() {
            bail!("sprite manifest contains duplicate entry for {key:?}");
        }
    }

    let mut ordered = Vec::with_capacity(ALL_SPRITE_KEYS.len());
    for key in ALL_SPRITE_KEYS {
        let Some(path) = resolved.remove(&key) else {
            bail!("sprite manifest missing entry for {key:?}");
        };
        ordered.push((key, path));
    }

    Ok(ordered)
}

fn parse_sprite_key(name: &str) -> Result<SpriteKey> {
    match name {
        "tiles" => Ok(SpriteKey::TileSheet),
        "player" => Ok(SpriteKey::Player),
        _ => bail!("unknown sprite key `{name}` in manifest"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn parse_manifest_requires_all_known_keys() {
        let manifest = r#"
            version = 1

            [sprites]
            tiles = "tiles.png"
        "#;

        let result = parse_manifest(manifest, Path::new("assets"));
        assert!(result.is_err(), "manifest missing the player should fail");
    }

    #[test]
    fn manifest_rejects_unknown_keys_and_versions() {
        let unknown = r#"
            version = 1

            [sprites]
            tiles = "tiles.png"
            player = "player.png"
            enemy = "enemy.png"
        "#;
        assert!(parse_manifest(unknown, Path::new("assets")).is_err());

        let future = r#"
            version = 2

            [sprites]
            tiles = "tiles.png"
            player = "player.png"
        "#;
        assert!(parse_manifest(future, Path::new("assets")).is_err());
    }

    #[test]
    fn manifest_resolves_paths_relative_to_base_directory() {
        let manifest = r#"
            version = 1

            [sprites]
            player = "sprites/player.png"
            tiles = "sprites/tiles.png"
        "#;

        let parsed = parse_manifest(manifest, Path::new("root")).expect("manifest should parse");
        assert_eq!(
            parsed,
            vec![
                (SpriteKey::TileSheet, PathBuf::from("root/sprites/tiles.png")),
                (SpriteKey::Player, PathBuf::from("root/sprites/player.png")),
            ]
        );
    }

    #[test]
    fn atlas_loads_textures_in_canonical_order() {
        let entries = vec![
            (SpriteKey::TileSheet, PathBuf::from("tiles.png")),
            (SpriteKey::Player, PathBuf::from("player.png")),
        ];
        let load_order = RefCell::new(Vec::new());
        let atlas = SpriteAtlas::from_entries(entries, &mut |key, _| {
            load_order.borrow_mut().push(key);
            Ok(OwnedTexture::unmanaged(Texture2D::empty()))
        })
        .expect("atlas should load using provided loader");

        assert_eq!(load_order.borrow().as_slice(), &ALL_SPRITE_KEYS);
        for key in ALL_SPRITE_KEYS {
            assert!(atlas.texture(key).is_some());
        }
    }

    thread_local! {
        static RELEASED: Cell<usize> = Cell::new(0);
    }

    #[test]
    fn loaded_textures_are_released_when_a_later_entry_fails() {
        RELEASED.with(|released| released.set(0));
        let entries = vec![
            (SpriteKey::TileSheet, PathBuf::from("tiles.png")),
            (SpriteKey::Player, PathBuf::from("missing.png")),
        ];

        let result = SpriteAtlas::from_entries(entries, &mut |key, _| {
            if key == SpriteKey::Player {
                bail!("asset missing");
            }
            Ok(OwnedTexture {
                texture: Texture2D::empty(),
                release: |_| RELEASED.with(|released| released.set(released.get() + 1)),
            })
        });

        assert!(result.is_err());
        assert_eq!(RELEASED.with(Cell::get), 1);
    }
}
