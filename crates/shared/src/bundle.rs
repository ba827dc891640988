//! Формат бандла: gzip-сжатый tar с `manifest.json` и файлами в `assets/`.
//!
//! Чтение полностью копирует содержимое в память и закрывает файл,
//! поэтому объекты бандла не ссылаются на открытый дескриптор.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transform::NormalizedTransform;
use crate::AssetRole;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ASSETS_DIR: &str = "assets";
pub const FORMAT_VERSION: u32 = 1;
/// Предел размера одной записи архива
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Ошибки чтения и записи бандла
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid bundle manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("bundle has no manifest.json")]
    MissingManifest,
    #[error("bundle entry '{0}' has no data")]
    MissingBlob(String),
    #[error("unsupported bundle format version {0}")]
    UnsupportedVersion(u32),
    #[error("bundle entry '{path}' is too large ({size} bytes)")]
    EntryTooLarge { path: String, size: u64 },
}

/// Материал основного ассета
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDesc {
    pub shader: String,
    /// Имя записи текстуры внутри бандла
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

/// Запись манифеста: один объект бандла
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Имя объекта (без расширения)
    pub name: String,
    pub role: AssetRole,
    /// Путь внутри архива
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<NormalizedTransform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialDesc>,
}

impl crate::Named for ManifestEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Манифест бандла
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format_version: u32,
    pub bundle_name: String,
    pub build_id: String,
    pub entries: Vec<ManifestEntry>,
}

/// Бандл, полностью загруженный в память
#[derive(Debug, Clone)]
pub struct BundleArchive {
    pub manifest: BundleManifest,
    blobs: HashMap<String, Vec<u8>>,
}

impl BundleArchive {
    pub fn new(bundle_name: impl Into<String>, build_id: impl Into<String>) -> Self {
        Self {
            manifest: BundleManifest {
                format_version: FORMAT_VERSION,
                bundle_name: bundle_name.into(),
                build_id: build_id.into(),
                entries: Vec::new(),
            },
            blobs: HashMap::new(),
        }
    }

    /// Добавить объект. Данные кладутся в `assets/<file_name>`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        role: AssetRole,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> &mut ManifestEntry {
        let path = format!("{ASSETS_DIR}/{file_name}");
        self.blobs.insert(path.clone(), bytes);
        self.manifest.entries.push(ManifestEntry {
            name: name.into(),
            role,
            path,
            transform: None,
            material: None,
        });
        let last = self.manifest.entries.len() - 1;
        &mut self.manifest.entries[last]
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.manifest.entries
    }

    /// Записи заданной роли в порядке манифеста
    pub fn entries_with_role(&self, role: AssetRole) -> impl Iterator<Item = &ManifestEntry> {
        self.manifest.entries.iter().filter(move |e| e.role == role)
    }

    /// Иконки и текстуры, кандидаты для сопоставления
    pub fn image_entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.manifest
            .entries
            .iter()
            .filter(|e| matches!(e.role, AssetRole::Icon | AssetRole::Texture))
    }

    pub fn entry_named(&self, name: &str) -> Option<&ManifestEntry> {
        self.manifest.entries.iter().find(|e| e.name == name)
    }

    pub fn blob(&self, entry: &ManifestEntry) -> Option<&[u8]> {
        self.blobs.get(&entry.path).map(Vec::as_slice)
    }

    pub fn count(&self, role: AssetRole) -> usize {
        self.entries_with_role(role).count()
    }

    // ── Запись ──────────────────────────────────────────────

    pub fn write_to(&self, writer: impl Write) -> Result<(), BundleError> {
        let encoder = GzEncoder::new(writer, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let manifest = serde_json::to_vec_pretty(&self.manifest)?;
        append(&mut builder, MANIFEST_FILE, &manifest)?;

        for entry in &self.manifest.entries {
            let data = self
                .blobs
                .get(&entry.path)
                .ok_or_else(|| BundleError::MissingBlob(entry.path.clone()))?;
            append(&mut builder, &entry.path, data)?;
        }

        builder.into_inner()?.finish()?;
        Ok(())
    }

    /// Записать в файл, создав родительские каталоги
    pub fn write(&self, path: &Path) -> Result<(), BundleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write_to(file)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, BundleError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    // ── Чтение ──────────────────────────────────────────────

    pub fn read_from(reader: impl Read) -> Result<Self, BundleError> {
        let mut archive = tar::Archive::new(GzDecoder::new(reader));
        let mut manifest: Option<BundleManifest> = None;
        let mut blobs = HashMap::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.to_string_lossy().into_owned();
            let size = entry.size();
            if size > MAX_ENTRY_BYTES {
                return Err(BundleError::EntryTooLarge { path, size });
            }
            let mut data = Vec::new();
            (&mut entry).take(MAX_ENTRY_BYTES).read_to_end(&mut data)?;

            if path == MANIFEST_FILE {
                manifest = Some(serde_json::from_slice(&data)?);
            } else {
                blobs.insert(path, data);
            }
        }

        let manifest = manifest.ok_or(BundleError::MissingManifest)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(BundleError::UnsupportedVersion(manifest.format_version));
        }
        if let Some(missing) = manifest.entries.iter().find(|e| !blobs.contains_key(&e.path)) {
            return Err(BundleError::MissingBlob(missing.path.clone()));
        }

        Ok(Self { manifest, blobs })
    }

    /// Прочитать бандл с диска; файл закрывается до возврата
    pub fn read(path: &Path) -> Result<Self, BundleError> {
        let file = File::open(path)?;
        Self::read_from(io::BufReader::new(file))
    }
}

fn append<W: Write>(builder: &mut tar::Builder<W>, path: &str, data: &[u8]) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, path, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BundleArchive {
        let mut bundle = BundleArchive::new("hat_1", "1");
        let fez = bundle.add("Fez", AssetRole::Primary, "Fez.glb", b"mesh".to_vec());
        fez.transform = Some(NormalizedTransform::identity());
        fez.material = Some(MaterialDesc {
            shader: "Standard".into(),
            texture: Some("Fez_texture".into()),
        });
        bundle.add("Fez_texture", AssetRole::Texture, "Fez_texture.png", b"tex".to_vec());
        bundle.add("Fez_icon", AssetRole::Icon, "Fez_icon.png", b"icon".to_vec());
        bundle
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hat");
        sample().write(&path).unwrap();

        let loaded = BundleArchive::read(&path).unwrap();
        assert_eq!(loaded.manifest, sample().manifest);
        assert_eq!(loaded.count(AssetRole::Primary), 1);
        assert_eq!(loaded.image_entries().count(), 2);

        let icon = loaded.entry_named("Fez_icon").unwrap();
        assert_eq!(loaded.blob(icon), Some(&b"icon"[..]));
    }

    #[test]
    fn test_entry_order_preserved() {
        let mut bundle = BundleArchive::new("b", "id");
        for name in ["Zeta", "Alpha", "Mid"] {
            bundle.add(name, AssetRole::Primary, &format!("{name}.obj"), vec![1]);
        }
        let loaded = BundleArchive::read_from(&bundle.to_bytes().unwrap()[..]).unwrap();
        let names: Vec<_> = loaded.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(BundleArchive::read_from(&b"not a bundle"[..]).is_err());
    }

    #[test]
    fn test_missing_manifest_is_error() {
        let mut raw = Vec::new();
        {
            let mut builder = tar::Builder::new(GzEncoder::new(&mut raw, Compression::default()));
            append(&mut builder, "assets/x.glb", b"x").unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        assert!(matches!(
            BundleArchive::read_from(&raw[..]),
            Err(BundleError::MissingManifest)
        ));
    }

    #[test]
    fn test_oversized_entry_is_error() {
        let mut header = tar::Header::new_gnu();
        header.set_path(MANIFEST_FILE).unwrap();
        header.set_size(1 << 62);
        header.set_mode(0o644);
        header.set_cksum();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(header.as_bytes()).unwrap();
        let raw = encoder.finish().unwrap();

        match BundleArchive::read_from(&raw[..]) {
            Err(BundleError::EntryTooLarge { path, size }) => {
                assert_eq!(path, MANIFEST_FILE);
                assert_eq!(size, 1 << 62);
            }
            other => panic!("unexpected result: {:?}", other.map(|b| b.manifest)),
        }
    }

    #[test]
    fn test_missing_blob_is_error() {
        let mut bundle = sample();
        bundle.blobs.remove("assets/Fez_icon.png");
        assert!(matches!(bundle.to_bytes(), Err(BundleError::MissingBlob(_))));
    }
}
