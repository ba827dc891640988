// Runtime side: loads pre-built hat bundles and injects them into a host
// through its lifecycle hooks. `main.rs` is a demo host.

pub mod config;
pub mod fixtures;
pub mod host;
pub mod inject;
pub mod registry;

pub use config::LoaderConfig;
pub use host::{CharacterEntity, Customization, LifecycleHooks, Texture};
pub use inject::{HatInjector, InjectError};
pub use registry::{BundleRegistry, RegisteredItem};
