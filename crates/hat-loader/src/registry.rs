//! Bundle registry: scans the bundle directory once at startup and keeps two
//! index-aligned sequences, visuals and their icons.

use std::path::Path;
use std::sync::Arc;

use shared::{AssetRole, BundleArchive, IconIndex, ManifestEntry};

use crate::host::{Material, Texture, VisualAsset};

/// One registered hat, borrowed from the registry
#[derive(Debug, Clone, Copy)]
pub struct RegisteredItem<'a> {
    pub name: &'a str,
    pub visual: &'a Arc<VisualAsset>,
    pub icon: &'a Arc<Texture>,
}

/// Per-bundle outcome of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleSummary {
    pub visuals: usize,
    pub images: usize,
}

#[derive(Debug, Default)]
pub struct BundleRegistry {
    visuals: Vec<Arc<VisualAsset>>,
    icons: Vec<Arc<Texture>>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `dir` in listing order. A missing directory yields an empty registry;
    /// unreadable bundles are skipped.
    pub fn load_all(dir: &Path) -> Self {
        let mut registry = Self::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "bundle directory not found");
                return registry;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match BundleArchive::read(&path) {
                Ok(bundle) => {
                    let summary = registry.load_bundle(&bundle);
                    tracing::info!(
                        bundle = %path.display(),
                        hats = summary.visuals,
                        icons = summary.images,
                        "loaded bundle"
                    );
                }
                Err(e) => {
                    tracing::warn!(bundle = %path.display(), error = %e, "failed to load bundle");
                }
            }
        }

        tracing::info!(
            hats = registry.visuals.len(),
            icons = registry.icons.len(),
            "total hats loaded"
        );
        registry
    }

    /// Copy every primary asset of one bundle out, pairing icons within this bundle only
    pub fn load_bundle(&mut self, bundle: &BundleArchive) -> BundleSummary {
        let images: Vec<Arc<Texture>> = bundle
            .image_entries()
            .filter_map(|entry| texture_from(bundle, entry))
            .collect();
        let icons = IconIndex::build(images.iter().map(|image| NamedTexture(image.clone())));

        let mut visuals = 0;
        for entry in bundle.entries_with_role(AssetRole::Primary) {
            let Some(visual) = visual_from(bundle, entry, &images) else {
                continue;
            };
            let icon = icons.lookup(&visual.name).map(|icon| icon.0.clone());
            self.push(visual, icon);
            visuals += 1;
        }

        BundleSummary {
            visuals,
            images: images.len(),
        }
    }

    /// The only way into the registry; keeps both sequences the same length
    pub fn push(&mut self, visual: VisualAsset, icon: Option<Arc<Texture>>) {
        self.visuals.push(Arc::new(visual));
        self.icons.push(icon.unwrap_or_else(Texture::fallback));
        debug_assert_eq!(self.visuals.len(), self.icons.len());
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn visuals(&self) -> &[Arc<VisualAsset>] {
        &self.visuals
    }

    pub fn icons(&self) -> &[Arc<Texture>] {
        &self.icons
    }

    pub fn get(&self, index: usize) -> Option<RegisteredItem<'_>> {
        let visual = self.visuals.get(index)?;
        let icon = self.icons.get(index)?;
        Some(RegisteredItem {
            name: &visual.name,
            visual,
            icon,
        })
    }

    pub fn items(&self) -> impl Iterator<Item = RegisteredItem<'_>> {
        self.visuals
            .iter()
            .zip(&self.icons)
            .map(|(visual, icon)| RegisteredItem {
                name: &visual.name,
                visual,
                icon,
            })
    }
}

#[derive(Clone)]
struct NamedTexture(Arc<Texture>);

impl shared::Named for NamedTexture {
    fn name(&self) -> &str {
        &self.0.name
    }
}

fn texture_from(bundle: &BundleArchive, entry: &ManifestEntry) -> Option<Arc<Texture>> {
    let bytes = bundle.blob(entry)?;
    Some(Arc::new(Texture::new(entry.name.clone(), bytes.to_vec())))
}

fn visual_from(
    bundle: &BundleArchive,
    entry: &ManifestEntry,
    images: &[Arc<Texture>],
) -> Option<VisualAsset> {
    let mesh = bundle.blob(entry)?;
    let material = match &entry.material {
        Some(desc) => Material {
            shader: desc.shader.clone(),
            texture: desc
                .texture
                .as_deref()
                .and_then(|name| images.iter().find(|image| image.name == name).cloned()),
        },
        None => Material {
            shader: String::new(),
            texture: None,
        },
    };
    let file_name = entry
        .path
        .rsplit('/')
        .next()
        .unwrap_or(entry.path.as_str())
        .to_string();

    Some(VisualAsset {
        name: entry.name.clone(),
        file_name,
        mesh: Arc::from(mesh),
        transform: entry.transform.unwrap_or_default(),
        material,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_push_keeps_alignment() {
        let mut registry = BundleRegistry::new();
        registry.push(fixtures::visual("Fez"), None);
        registry.push(fixtures::visual("Cap"), Some(Arc::new(fixtures::icon("Cap_icon"))));

        assert_eq!(registry.visuals().len(), registry.icons().len());
        assert!(Texture::is_fallback(&registry.icons()[0]));
        assert_eq!(registry.get(1).unwrap().icon.name, "Cap_icon");
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn test_per_bundle_matching() {
        let bundle = fixtures::bundle("hats", &["Cap", "Hat"], &["cap_ICON", "Other_icon"]);
        let mut registry = BundleRegistry::new();
        let summary = registry.load_bundle(&bundle);

        assert_eq!(summary, BundleSummary { visuals: 2, images: 2 });
        let items: Vec<_> = registry.items().collect();
        assert_eq!(items[0].name, "Cap");
        assert_eq!(items[0].icon.name, "cap_ICON");
        assert!(Texture::is_fallback(items[1].icon));
    }

    #[test]
    fn test_first_icon_wins() {
        let bundle = fixtures::bundle("hats", &["Fez"], &["Fez_icon", "FEZ_icon"]);
        let mut registry = BundleRegistry::new();
        registry.load_bundle(&bundle);
        assert_eq!(registry.icons()[0].name, "Fez_icon");
    }

    #[test]
    fn test_icon_bare_name_matches() {
        let bundle = fixtures::bundle("hats", &["Fez"], &["Fez"]);
        let mut registry = BundleRegistry::new();
        registry.load_bundle(&bundle);
        assert!(!Texture::is_fallback(&registry.icons()[0]));
    }

    #[test]
    fn test_material_texture_resolved() {
        let mut bundle = fixtures::bundle("hats", &["Fez"], &[]);
        bundle.add("Fez_texture", AssetRole::Texture, "Fez_texture.png", b"tex".to_vec());
        bundle.manifest.entries[0].material = Some(shared::MaterialDesc {
            shader: "Standard".into(),
            texture: Some("Fez_texture".into()),
        });
        let mut registry = BundleRegistry::new();
        registry.load_bundle(&bundle);

        let visual = &registry.visuals()[0];
        let texture = visual.material.texture.as_ref().unwrap();
        assert_eq!(&texture.bytes[..], b"tex");
        assert_eq!(visual.file_name, "Fez.glb");
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = BundleRegistry::load_all(&dir.path().join("nope"));
        assert!(registry.is_empty());
        assert_eq!(registry.icons().len(), 0);
    }
}
