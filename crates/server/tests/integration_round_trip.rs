//! A bundle built by the server is loadable by the runtime registry.

use std::sync::Arc;

use hat_loader::{BundleRegistry, HatInjector, LifecycleHooks, LoaderConfig, Texture};
use hatbundle_server::build::BuildOrchestrator;
use hatbundle_server::fixtures::*;
use shared::TransformSpec;

#[tokio::test]
async fn test_built_bundle_loads_with_its_icon() {
    let dir = tempfile::tempdir().unwrap();
    let config = build_config(dir.path(), reference_tool(env!("CARGO_BIN_EXE_bundle-tool")));
    let bundles_dir = config.bundles_dir.clone();
    let orchestrator = BuildOrchestrator::new(config);

    orchestrator
        .build(
            upload("Fez.glb", Some("felt.png"), Some("Fez_icon.png")),
            TransformSpec::new([0.0, 0.5, 0.0], [0.0, 0.0, 0.0], 266.67),
        )
        .await
        .unwrap();
    orchestrator
        .build(upload("Cap.glb", None, None), TransformSpec::default())
        .await
        .unwrap();

    let registry = BundleRegistry::load_all(&bundles_dir);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.visuals().len(), registry.icons().len());

    let fez = registry.items().find(|item| item.name == "Fez").unwrap();
    assert!(!Texture::is_fallback(fez.icon));
    assert_eq!(&fez.icon.bytes[..], ICON_BYTES);
    assert_eq!(&fez.visual.mesh[..], MESH_BYTES);
    assert!((fez.visual.transform.scale - 0.5).abs() < 1e-9);
    let texture = fez.visual.material.texture.as_ref().unwrap();
    assert_eq!(&texture.bytes[..], TEXTURE_BYTES);

    let cap = registry.items().find(|item| item.name == "Cap").unwrap();
    assert!(Texture::is_fallback(cap.icon));
}

#[tokio::test]
async fn test_built_bundle_injects_into_host() {
    let dir = tempfile::tempdir().unwrap();
    let config = build_config(dir.path(), reference_tool(env!("CARGO_BIN_EXE_bundle-tool")));
    let bundles_dir = config.bundles_dir.clone();
    let orchestrator = BuildOrchestrator::new(config);
    orchestrator
        .build(upload("Fez.glb", None, Some("Fez_icon.png")), TransformSpec::default())
        .await
        .unwrap();

    let loader = LoaderConfig {
        bundles_dir,
        ..Default::default()
    };
    let registry = Arc::new(BundleRegistry::load_all(&loader.bundles_dir));
    let injector = Arc::new(HatInjector::new(registry, &loader));
    let mut hooks = LifecycleHooks::new();
    injector.install(&mut hooks);

    let mut customization = hat_loader::fixtures::customization_with(&[]);
    let mut entity = hat_loader::fixtures::rigged_entity();
    assert!(hooks.fire_customization_ready(&mut customization).is_empty());
    assert!(hooks.fire_entity_ready(&mut entity).is_empty());

    assert_eq!(customization.hats.len(), 1);
    assert_eq!(&customization.hats[0].icon.bytes[..], ICON_BYTES);
    let slot = *entity.hat_slots.last().unwrap();
    let node = entity.graph.node(slot);
    assert_eq!(node.name, "Fez");
    assert_eq!(node.renderer.as_ref().unwrap().material.shader, "W/Character");
}
