//! Locates the globe's texture assets on disk and decides how far the
//! visual quality has to degrade when some are missing.
//!
//! The full set is a day map, a night map, and a cloud layer under
//! `hd/`. When any of those is missing, the globe falls back to the
//! single legacy night texture, and failing that to a flat color.

use palette::Srgb;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

// The single-texture fallback from before the lit globe existed.

const LEGACY_FILE: &str = "earth-night.jpg";

// Deep ocean blue, the last resort when no texture is on disk.

pub const FLAT_COLOR: Srgb<u8> = Srgb::new(0x10, 0x2b, 0x4c);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    R1k,
    R2k,
}

impl Resolution {
    /// Parses the `resolution` config value.

    pub fn from_config(s: &str) -> Option<Self> {
        match s {
            "1k" => Some(Resolution::R1k),
            "2k" => Some(Resolution::R2k),
            _ => None,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Resolution::R1k => "1k",
            Resolution::R2k => "2k",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layer {
    Day,
    Night,
    Clouds,
}

impl Layer {
    const ALL: [Layer; 3] = [Layer::Day, Layer::Night, Layer::Clouds];

    fn suffix(&self) -> &'static str {
        match self {
            Layer::Day => "daymap",
            Layer::Night => "nightmap",
            Layer::Clouds => "clouds",
        }
    }

    /// The file holding this layer, relative to the texture root.

    pub fn file(&self, res: Resolution) -> PathBuf {
        PathBuf::from(format!(
            "hd/{}_earth_{}.jpg",
            res.prefix(),
            self.suffix()
        ))
    }
}

/// What the renderer should draw with. `day`, `night` and `clouds`
/// are all present or the set isn't high detail; `fallback` is
/// present whenever the legacy texture exists on disk.

#[derive(Debug, Clone, PartialEq)]
pub struct TextureSet {
    pub day: Option<PathBuf>,
    pub night: Option<PathBuf>,
    pub clouds: Option<PathBuf>,
    pub fallback: Option<PathBuf>,
    pub flat_color: Srgb<u8>,
}

impl TextureSet {
    /// `true` when every layer of the lit globe is available.

    pub fn high_detail(&self) -> bool {
        self.day.is_some()
            && self.night.is_some()
            && self.clouds.is_some()
    }
}

async fn present(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

async fn find_layer(
    root: &Path,
    layer: Layer,
    res: Resolution,
) -> Option<PathBuf> {
    let path = root.join(layer.file(res));

    if present(&path).await {
        return Some(path);
    }

    // The other resolution of the same layer beats dropping to the
    // legacy texture.

    let other = match res {
        Resolution::R1k => Resolution::R2k,
        Resolution::R2k => Resolution::R1k,
    };
    let path = root.join(layer.file(other));

    if present(&path).await {
        warn!(
            "{:?} layer missing at {} ... using {}",
            layer,
            res.prefix(),
            other.prefix()
        );
        return Some(path);
    }
    None
}

/// Scans the texture root and builds the best available set.

pub async fn select(root: &Path, res: Resolution) -> TextureSet {
    let day = find_layer(root, Layer::Day, res).await;
    let night = find_layer(root, Layer::Night, res).await;
    let clouds = find_layer(root, Layer::Clouds, res).await;

    let legacy = root.join(LEGACY_FILE);
    let fallback = if present(&legacy).await {
        Some(legacy)
    } else {
        None
    };

    let set = TextureSet {
        day,
        night,
        clouds,
        fallback,
        flat_color: FLAT_COLOR,
    };

    if set.high_detail() {
        info!("using the full day/night/cloud texture set");
    } else if set.fallback.is_some() {
        warn!("texture layers missing ... using the legacy texture");
    } else {
        warn!("no textures found under {:?} ... using a flat color", root);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, File};
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);

        create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn test_layer_paths() {
        assert_eq!(
            Layer::Day.file(Resolution::R2k),
            PathBuf::from("hd/2k_earth_daymap.jpg")
        );
        assert_eq!(
            Layer::Night.file(Resolution::R2k),
            PathBuf::from("hd/2k_earth_nightmap.jpg")
        );
        assert_eq!(
            Layer::Clouds.file(Resolution::R1k),
            PathBuf::from("hd/1k_earth_clouds.jpg")
        );
    }

    #[test]
    fn test_resolution_parsing() {
        assert_eq!(Resolution::from_config("1k"), Some(Resolution::R1k));
        assert_eq!(Resolution::from_config("2k"), Some(Resolution::R2k));
        assert_eq!(Resolution::from_config("4k"), None);
        assert_eq!(Resolution::from_config(""), None);
    }

    #[tokio::test]
    async fn test_full_set() {
        let dir = tempdir().unwrap();

        for layer in Layer::ALL {
            touch(
                dir.path(),
                layer.file(Resolution::R2k).to_str().unwrap(),
            );
        }

        let set = select(dir.path(), Resolution::R2k).await;

        assert!(set.high_detail());
        assert!(set.fallback.is_none());
        assert_eq!(
            set.day.unwrap(),
            dir.path().join("hd/2k_earth_daymap.jpg")
        );
    }

    #[tokio::test]
    async fn test_resolution_substitution() {
        let dir = tempdir().unwrap();

        // Day and night at 2k, clouds only at 1k. Still high detail.

        touch(dir.path(), "hd/2k_earth_daymap.jpg");
        touch(dir.path(), "hd/2k_earth_nightmap.jpg");
        touch(dir.path(), "hd/1k_earth_clouds.jpg");

        let set = select(dir.path(), Resolution::R2k).await;

        assert!(set.high_detail());
        assert_eq!(
            set.clouds.unwrap(),
            dir.path().join("hd/1k_earth_clouds.jpg")
        );
    }

    #[tokio::test]
    async fn test_degrades_to_legacy() {
        let dir = tempdir().unwrap();

        touch(dir.path(), "hd/2k_earth_daymap.jpg");
        touch(dir.path(), "earth-night.jpg");

        let set = select(dir.path(), Resolution::R2k).await;

        assert!(!set.high_detail());
        assert_eq!(
            set.fallback.unwrap(),
            dir.path().join("earth-night.jpg")
        );
    }

    #[tokio::test]
    async fn test_degrades_to_flat_color() {
        let dir = tempdir().unwrap();
        let set = select(dir.path(), Resolution::R2k).await;

        assert!(!set.high_detail());
        assert!(set.fallback.is_none());
        assert_eq!(set.flat_color, FLAT_COLOR);
    }
}
