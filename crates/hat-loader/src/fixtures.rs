//! Factory functions for loader tests and the demo host.
//!
//! Builds in-memory bundles, visuals, a character rig with the default hat
//! anchor and customization option sets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shared::{AssetRole, BundleArchive, BundleError, MaterialDesc, NormalizedTransform};

use crate::config::DEFAULT_ATTACH_PATH;
use crate::host::{
    CharacterEntity, Customization, CustomizationOption, Material, MeshRenderer, Node, SceneGraph,
    Texture, VisualAsset,
};

// ── Bundles ─────────────────────────────────────────────────────

/// Mesh bytes for a hat, unique per name
pub fn mesh_bytes(name: &str) -> Vec<u8> {
    format!("mesh:{name}").into_bytes()
}

/// Icon bytes, unique per name
pub fn icon_bytes(name: &str) -> Vec<u8> {
    format!("png:{name}").into_bytes()
}

/// Bundle with `hats` as `<name>.glb` primaries and `icons` as `<name>.png` icons
pub fn bundle(bundle_name: &str, hats: &[&str], icons: &[&str]) -> BundleArchive {
    let mut bundle = BundleArchive::new(bundle_name, format!("{bundle_name}_build"));
    for hat in hats {
        let entry = bundle.add(*hat, AssetRole::Primary, &format!("{hat}.glb"), mesh_bytes(hat));
        entry.transform = Some(NormalizedTransform::identity());
        entry.material = Some(MaterialDesc {
            shader: "Standard".into(),
            texture: None,
        });
    }
    for icon in icons {
        bundle.add(*icon, AssetRole::Icon, &format!("{icon}.png"), icon_bytes(icon));
    }
    bundle
}

/// Write `bundle` to `dir/file_name`
pub fn write_bundle(dir: &Path, file_name: &str, bundle: &BundleArchive) -> Result<PathBuf, BundleError> {
    let path = dir.join(file_name);
    bundle.write(&path)?;
    Ok(path)
}

// ── Runtime objects ─────────────────────────────────────────────

pub fn visual(name: &str) -> VisualAsset {
    VisualAsset {
        name: name.to_string(),
        file_name: format!("{name}.glb"),
        mesh: Arc::from(mesh_bytes(name)),
        transform: NormalizedTransform::identity(),
        material: Material {
            shader: "Standard".into(),
            texture: None,
        },
    }
}

pub fn icon(name: &str) -> Texture {
    Texture::new(name, icon_bytes(name))
}

/// Character rig with the default hat anchor, decoy siblings along the path
/// and one vanilla hat already in its slot
pub fn rigged_entity() -> CharacterEntity {
    let mut graph = SceneGraph::new("Character");
    graph.ensure_path(&["Scout", "Armature", "Hip", "Left_Leg"]);
    graph.ensure_path(&["Scout", "Armature", "Hip", "Mid", "Arm_L"]);
    graph.ensure_path(&["Scout", "Armature", "Hip", "Mid", "AimJoint", "Torso", "Neck"]);
    graph.ensure_path(&["Scout", "Mesh"]);
    let anchor = graph.ensure_path(&DEFAULT_ATTACH_PATH);

    let vanilla = Node {
        renderer: Some(MeshRenderer {
            mesh: Arc::from(mesh_bytes("Beanie")),
            material: Material {
                shader: "W/Character".into(),
                texture: None,
            },
        }),
        ..Node::new("Beanie")
    };
    let slot = graph.add_child(anchor, vanilla);

    CharacterEntity {
        graph,
        hat_slots: vec![slot],
    }
}

/// Option set holding the given vanilla hats
pub fn customization_with(names: &[&str]) -> Customization {
    Customization {
        hats: names
            .iter()
            .map(|name| CustomizationOption::hat(name, Arc::new(icon(name))))
            .collect(),
    }
}
