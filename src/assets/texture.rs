//! Decoded RGBA8 textures shared between materials and the renderer.

use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use super::AssetError;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity used by the renderer to cache GPU textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

/// CPU copy of a decoded image.
pub struct TextureData {
    id: TextureId,
    path: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Textures are immutable once decoded, so sharing is by reference count.
pub type TextureHandle = Arc<TextureData>;

impl TextureData {
    /// Wraps raw RGBA8 pixels. `pixels` must hold `width * height * 4` bytes.
    pub fn from_rgba(path: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            id: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            path: path.into(),
            width,
            height,
            pixels,
        }
    }

    /// Single-pixel texture of one colour
    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self::from_rgba(name, 1, 1, rgba.to_vec())
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Asset-relative path the texture was requested with
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl fmt::Debug for TextureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureData")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("size", &(self.width, self.height))
            .finish()
    }
}

/// Reads and decodes `root/path` into an RGBA8 texture.
pub fn load_texture(root: &Path, path: &str) -> Result<TextureHandle, AssetError> {
    let full_path = root.join(path);
    let image = image::open(&full_path)
        .map_err(|source| AssetError::Image {
            path: path.to_string(),
            source,
        })?
        .to_rgba8();

    let (width, height) = image.dimensions();
    log::debug!("Decoded texture {} ({}x{})", path, width, height);
    Ok(Arc::new(TextureData::from_rgba(path, width, height, image.into_raw())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_png_fixture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("textures")).unwrap();
        let fixture = image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]));
        fixture.save(dir.path().join("textures/red.png")).unwrap();

        let texture = load_texture(dir.path(), "textures/red.png").unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 2));
        assert_eq!(texture.path(), "textures/red.png");
        assert_eq!(&texture.pixels()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_missing_file_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_texture(dir.path(), "textures/missing.jpg").unwrap_err();
        assert!(matches!(err, AssetError::Image { ref path, .. } if path == "textures/missing.jpg"));
    }

    #[test]
    fn test_texture_ids_are_unique() {
        let a = TextureData::solid("a", [255; 4]);
        let b = TextureData::solid("b", [255; 4]);
        assert_ne!(a.id(), b.id());
    }
}
