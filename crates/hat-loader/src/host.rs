//! Host-side model: textures, materials, the character object graph, the
//! customization option set and the lifecycle extension points.

use std::sync::{Arc, OnceLock};

use shared::NormalizedTransform;
use thiserror::Error;

use crate::inject::InjectError;

// ── Textures and materials ─────────────────────────────────────

/// Encoded image data (icon or texture)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

static FALLBACK_ICON: OnceLock<Arc<Texture>> = OnceLock::new();

impl Texture {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Process-wide icon for items without one (2x2 white RGBA)
    pub fn fallback() -> Arc<Texture> {
        FALLBACK_ICON
            .get_or_init(|| Arc::new(Texture::new("default_hat_icon", vec![0xFFu8; 2 * 2 * 4])))
            .clone()
    }

    pub fn is_fallback(texture: &Arc<Texture>) -> bool {
        Arc::ptr_eq(texture, &Self::fallback())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shader: String,
    pub texture: Option<Arc<Texture>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    pub mesh: Arc<[u8]>,
    pub material: Material,
}

/// A bundled visual, copied out of its bundle
#[derive(Debug, Clone, PartialEq)]
pub struct VisualAsset {
    pub name: String,
    pub file_name: String,
    pub mesh: Arc<[u8]>,
    pub transform: NormalizedTransform,
    pub material: Material,
}

impl VisualAsset {
    /// Fresh node carrying its own copy of the material
    pub fn instantiate(&self) -> Node {
        Node {
            transform: self.transform,
            renderer: Some(MeshRenderer {
                mesh: self.mesh.clone(),
                material: self.material.clone(),
            }),
            ..Node::new(&self.name)
        }
    }
}

impl shared::Named for VisualAsset {
    fn name(&self) -> &str {
        &self.name
    }
}

// ── Object graph ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub active: bool,
    pub transform: NormalizedTransform,
    pub renderer: Option<MeshRenderer>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            transform: NormalizedTransform::identity(),
            renderer: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed node tree. Node ids are only valid for the graph that issued them.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![Node::new(root_name)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Panics if `id` came from another graph
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].name == name)
    }

    /// Walk child names from the root. The root itself is not part of the path.
    pub fn find_path<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, name| self.child_named(node, name.as_ref()))
    }

    /// Like `find_path`, creating missing nodes
    pub fn ensure_path<S: AsRef<str>>(&mut self, path: &[S]) -> NodeId {
        let mut node = self.root();
        for name in path {
            node = match self.child_named(node, name.as_ref()) {
                Some(child) => child,
                None => self.add_child(node, Node::new(name.as_ref())),
            };
        }
        node
    }

    /// Names from the root down to `id`, excluding the root
    pub fn path_of(&self, id: NodeId) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            match node.parent {
                Some(parent) => {
                    names.push(node.name.clone());
                    current = self.get(parent);
                }
                None => break,
            }
        }
        names.reverse();
        names
    }
}

/// One spawned character: its object graph and its hat renderers
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterEntity {
    pub graph: SceneGraph,
    pub hat_slots: Vec<NodeId>,
}

impl CharacterEntity {
    pub fn new(graph: SceneGraph) -> Self {
        Self {
            graph,
            hat_slots: Vec::new(),
        }
    }
}

// ── Customization ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Hat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomizationOption {
    pub name: String,
    pub icon: Arc<Texture>,
    pub kind: OptionKind,
    /// RGBA tint
    pub color: [f32; 4],
    pub required_achievement: Option<String>,
}

impl CustomizationOption {
    /// Untinted hat option with no unlock requirement
    pub fn hat(name: &str, icon: Arc<Texture>) -> Self {
        Self {
            name: name.to_string(),
            icon,
            kind: OptionKind::Hat,
            color: [1.0; 4],
            required_achievement: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customization {
    pub hats: Vec<CustomizationOption>,
}

impl Customization {
    pub fn has_hat(&self, name: &str) -> bool {
        self.hats.iter().any(|h| h.name == name)
    }
}

// ── Lifecycle extension points ─────────────────────────────────

#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Inject(#[from] InjectError),
    #[error("{0}")]
    Other(String),
}

pub type Handler<T> = Box<dyn Fn(&mut T) -> Result<(), HookError> + Send + Sync>;

/// Typed "after initialization" hooks. The host fires them; plugins register into them.
#[derive(Default)]
pub struct LifecycleHooks {
    customization_ready: Vec<Handler<Customization>>,
    entity_ready: Vec<Handler<CharacterEntity>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs after a customization subsystem has initialized
    pub fn on_customization_ready<F>(&mut self, handler: F)
    where
        F: Fn(&mut Customization) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.customization_ready.push(Box::new(handler));
    }

    /// Runs after each character entity has initialized
    pub fn on_entity_ready<F>(&mut self, handler: F)
    where
        F: Fn(&mut CharacterEntity) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.entity_ready.push(Box::new(handler));
    }

    pub fn fire_customization_ready(&self, customization: &mut Customization) -> Vec<HookError> {
        dispatch("customization_ready", &self.customization_ready, customization)
    }

    pub fn fire_entity_ready(&self, entity: &mut CharacterEntity) -> Vec<HookError> {
        dispatch("entity_ready", &self.entity_ready, entity)
    }

    pub fn handler_count(&self) -> (usize, usize) {
        (self.customization_ready.len(), self.entity_ready.len())
    }
}

fn dispatch<T>(event: &str, handlers: &[Handler<T>], target: &mut T) -> Vec<HookError> {
    let mut errors = Vec::new();
    for handler in handlers {
        if let Err(e) = handler(target) {
            tracing::error!(event, error = %e, "lifecycle hook failed");
            errors.push(e);
        }
    }
    errors
}
