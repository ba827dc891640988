use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod bundle;
pub mod naming;
pub mod transform;

pub use bundle::{BundleArchive, BundleError, BundleManifest, ManifestEntry, MaterialDesc};
pub use naming::{find_icon, match_icons, name_base, IconIndex, MatchedPair, Named};
pub use transform::{AxisFlip, NormalizedTransform, TransformError, TransformSpec, Vec3};

// ============================================================================
// Контракт внешнего инструмента сборки
// ============================================================================

/// Маркер отсутствующего аргумента (текстура / иконка) в позиционном вызове инструмента
pub const MISSING_SENTINEL: &str = "undefined";

/// Каталог приёма файлов относительно рабочего каталога инструмента
pub const INTAKE_DIR: &str = "Assets/Uploads";

/// Путь готового бандла относительно рабочего каталога инструмента
pub const OUTPUT_BUNDLE_PATH: &str = "Assets/StreamingAssets/AssetBundles/hat";

/// Переменная окружения с идентификатором сборки
pub const BUILD_ID_ENV: &str = "HATBUNDLE_BUILD_ID";

/// Суффикс имени иконки
pub const ICON_SUFFIX: &str = "_icon";

/// Суффикс имени текстуры внутри бандла
pub const TEXTURE_SUFFIX: &str = "_texture";

const PRIMARY_EXTENSIONS: &[&str] = &["glb", "gltf", "fbx", "obj", "prefab"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tga", "bmp"];

// ============================================================================
// Модель данных
// ============================================================================

/// Роль файла ассета
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    /// Основной ассет (меш)
    Primary,
    /// Текстура основного ассета
    Texture,
    /// Иконка для меню выбора
    Icon,
}

impl AssetRole {
    /// Определить роль по имени файла. `None` для неподдерживаемого расширения.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let path = Path::new(file_name);
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let stem = path.file_stem()?.to_str()?;

        if PRIMARY_EXTENSIONS.contains(&ext.as_str()) {
            Some(AssetRole::Primary)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            if naming::has_icon_suffix(stem) {
                Some(AssetRole::Icon)
            } else {
                Some(AssetRole::Texture)
            }
        } else {
            None
        }
    }
}

/// Файл ассета на диске
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFile {
    /// Имя без расширения
    pub name: String,
    pub role: AssetRole,
    /// Имя файла с расширением
    pub file_name: String,
}

impl AssetFile {
    pub fn new(file_name: &str, role: AssetRole) -> Self {
        Self {
            name: file_stem(file_name).to_string(),
            role,
            file_name: file_name.to_string(),
        }
    }

    /// Расширение файла (без точки), если есть
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name).extension().and_then(|e| e.to_str())
    }
}

impl Named for AssetFile {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Имя файла без расширения
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_file_name() {
        assert_eq!(AssetRole::from_file_name("Fez.glb"), Some(AssetRole::Primary));
        assert_eq!(AssetRole::from_file_name("Fez.FBX"), Some(AssetRole::Primary));
        assert_eq!(AssetRole::from_file_name("Fez_icon.png"), Some(AssetRole::Icon));
        assert_eq!(AssetRole::from_file_name("FEZ_ICON.PNG"), Some(AssetRole::Icon));
        assert_eq!(AssetRole::from_file_name("Fez.png"), Some(AssetRole::Texture));
        assert_eq!(AssetRole::from_file_name("notes.txt"), None);
        assert_eq!(AssetRole::from_file_name("no_extension"), None);
    }

    #[test]
    fn test_asset_file_name_strips_extension() {
        let file = AssetFile::new("Top Hat.fbx", AssetRole::Primary);
        assert_eq!(file.name, "Top Hat");
        assert_eq!(file.extension(), Some("fbx"));
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&AssetRole::Primary).unwrap();
        assert_eq!(json, r#""primary""#);
        let back: AssetRole = serde_json::from_str(r#""icon""#).unwrap();
        assert_eq!(back, AssetRole::Icon);
    }
}
