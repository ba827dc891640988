//! Injection coordinator: wires registered hats into the host through its
//! two lifecycle events.

use std::sync::Arc;

use thiserror::Error;

use crate::config::LoaderConfig;
use crate::host::{CharacterEntity, Customization, CustomizationOption, LifecycleHooks};
use crate::registry::BundleRegistry;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("attach point '{0}' not found in entity graph")]
    AttachPointNotFound(String),
}

/// Stateless apart from its borrowed registry and settings
#[derive(Debug)]
pub struct HatInjector {
    registry: Arc<BundleRegistry>,
    shader: String,
    attach_path: Vec<String>,
}

impl HatInjector {
    pub fn new(registry: Arc<BundleRegistry>, config: &LoaderConfig) -> Self {
        Self {
            registry,
            shader: config.shader.clone(),
            attach_path: config.attach_path.clone(),
        }
    }

    /// Register both hooks with the host
    pub fn install(self: Arc<Self>, hooks: &mut LifecycleHooks) {
        let injector = Arc::clone(&self);
        hooks.on_customization_ready(move |customization| {
            injector.register_options(customization);
            Ok(())
        });
        hooks.on_entity_ready(move |entity| {
            self.inject_visuals(entity)?;
            Ok(())
        });
    }

    /// Hook A. Adds one hat option per registered item whose name is not taken yet.
    pub fn register_options(&self, customization: &mut Customization) -> usize {
        if self.registry.is_empty() {
            return 0;
        }

        let mut added = 0;
        for item in self.registry.items() {
            if customization.has_hat(item.name) {
                continue;
            }
            customization
                .hats
                .push(CustomizationOption::hat(item.name, item.icon.clone()));
            added += 1;
        }

        tracing::debug!(added, total = customization.hats.len(), "registered hat options");
        added
    }

    /// Hook B. Attaches a hidden instance of every registered hat under the attach point.
    pub fn inject_visuals(&self, entity: &mut CharacterEntity) -> Result<usize, InjectError> {
        if self.registry.is_empty() {
            return Ok(0);
        }

        let Some(anchor) = entity.graph.find_path(&self.attach_path) else {
            return Err(InjectError::AttachPointNotFound(self.attach_path.join("/")));
        };

        let mut attached = 0;
        for item in self.registry.items() {
            if entity.graph.child_named(anchor, item.name).is_some() {
                continue;
            }

            let mut node = item.visual.instantiate();
            if let Some(renderer) = node.renderer.as_mut() {
                renderer.material.shader = self.shader.clone();
            }
            node.active = false;

            let id = entity.graph.add_child(anchor, node);
            entity.hat_slots.push(id);
            attached += 1;
        }

        tracing::debug!(attached, slots = entity.hat_slots.len(), "injected hat visuals");
        Ok(attached)
    }
}
