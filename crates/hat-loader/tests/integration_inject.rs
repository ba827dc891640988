//! Both lifecycle hooks driven through the host's extension points

use std::sync::Arc;

use hat_loader::config::DEFAULT_ATTACH_PATH;
use hat_loader::fixtures::{self, bundle, write_bundle};
use hat_loader::host::SceneGraph;
use hat_loader::{
    BundleRegistry, CharacterEntity, HatInjector, InjectError, LifecycleHooks, LoaderConfig,
};

fn installed(hats: &[&str]) -> (Arc<HatInjector>, LifecycleHooks) {
    let dir = tempfile::tempdir().unwrap();
    write_bundle(dir.path(), "hats", &bundle("hats", hats, &["Fez_icon"])).unwrap();

    let config = LoaderConfig {
        bundles_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let registry = Arc::new(BundleRegistry::load_all(&config.bundles_dir));
    let injector = Arc::new(HatInjector::new(registry, &config));
    let mut hooks = LifecycleHooks::new();
    Arc::clone(&injector).install(&mut hooks);
    (injector, hooks)
}

#[test]
fn test_option_registration_is_idempotent() {
    let (_, hooks) = installed(&["Fez", "Cap"]);
    let mut customization = fixtures::customization_with(&["Beanie"]);

    assert!(hooks.fire_customization_ready(&mut customization).is_empty());
    let once = customization.hats.len();
    assert!(hooks.fire_customization_ready(&mut customization).is_empty());
    assert_eq!(customization.hats.len(), once);
    assert_eq!(once, 3);

    let fez = customization.hats.iter().find(|h| h.name == "Fez").unwrap();
    assert_eq!(&fez.icon.bytes[..], &fixtures::icon_bytes("Fez_icon")[..]);
}

#[test]
fn test_existing_option_wins() {
    let (_, hooks) = installed(&["Beanie"]);
    let mut customization = fixtures::customization_with(&["Beanie"]);
    let original = customization.hats[0].clone();

    hooks.fire_customization_ready(&mut customization);
    assert_eq!(customization.hats, vec![original]);
}

#[test]
fn test_each_entity_gets_its_own_instances() {
    let (injector, hooks) = installed(&["Fez", "Cap"]);
    let mut first = fixtures::rigged_entity();
    let mut second = fixtures::rigged_entity();

    assert!(hooks.fire_entity_ready(&mut first).is_empty());
    assert!(hooks.fire_entity_ready(&mut second).is_empty());
    assert_eq!(first.hat_slots.len(), 3);
    assert_eq!(second.hat_slots.len(), 3);

    // firing again on the same entity adds nothing
    assert_eq!(injector.inject_visuals(&mut first).unwrap(), 0);
    assert_eq!(first.hat_slots.len(), 3);

    let anchor = first.graph.find_path(&DEFAULT_ATTACH_PATH).unwrap();
    for &slot in &first.hat_slots[1..] {
        let node = first.graph.node(slot);
        assert_eq!(node.parent(), Some(anchor));
        assert!(!node.active);
        assert_eq!(node.renderer.as_ref().unwrap().material.shader, "W/Character");
    }
    // the vanilla hat is untouched
    assert!(first.graph.node(first.hat_slots[0]).active);
}

#[test]
fn test_restructured_graph_fails_clearly() {
    let (injector, hooks) = installed(&["Fez"]);
    let mut entity = CharacterEntity::new(SceneGraph::new("Character"));
    entity.graph.ensure_path(&["Scout", "Armature", "Spine", "Head", "Hat"]);

    let errors = hooks.fire_entity_ready(&mut entity);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Scout/Armature/Hip/Mid/AimJoint/Torso/Head/Hat"));
    assert!(matches!(
        injector.inject_visuals(&mut entity),
        Err(InjectError::AttachPointNotFound(_))
    ));
    assert!(entity.hat_slots.is_empty());
}

#[test]
fn test_empty_registry_hooks_are_noops() {
    let registry = Arc::new(BundleRegistry::new());
    let injector = Arc::new(HatInjector::new(registry, &LoaderConfig::default()));
    let mut hooks = LifecycleHooks::new();
    injector.install(&mut hooks);

    let mut customization = fixtures::customization_with(&[]);
    let mut entity = CharacterEntity::new(SceneGraph::new("Character"));
    assert!(hooks.fire_customization_ready(&mut customization).is_empty());
    assert!(hooks.fire_entity_ready(&mut entity).is_empty());
    assert!(customization.hats.is_empty());
}
