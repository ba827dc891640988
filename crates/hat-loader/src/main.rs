use std::sync::Arc;

use hat_loader::fixtures;
use hat_loader::{BundleRegistry, Customization, HatInjector, LifecycleHooks, LoaderConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hat_loader=info".into()),
        )
        .init();

    let config = LoaderConfig::load();
    tracing::info!(dir = %config.bundles_dir.display(), "loading hat bundles");

    let registry = Arc::new(BundleRegistry::load_all(&config.bundles_dir));
    let injector = Arc::new(HatInjector::new(registry, &config));

    let mut hooks = LifecycleHooks::new();
    injector.install(&mut hooks);

    // Stub host: one customization subsystem, one character
    let mut customization = Customization::default();
    let mut entity = fixtures::rigged_entity();

    let mut failures = hooks.fire_customization_ready(&mut customization).len();
    failures += hooks.fire_entity_ready(&mut entity).len();

    tracing::info!(
        options = customization.hats.len(),
        slots = entity.hat_slots.len(),
        failures,
        "host initialized"
    );
}
