//! Per-frame resource table
//!
//! Maps each resource to what currently backs it. Rebuilt at the start of
//! every frame and only mutated by the executor between passes, so all reads
//! made during one pass see the same handles.

use crate::backend::types::*;
use crate::render_graph::resource::*;
use std::collections::HashMap;

/// What a resource is bound to this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Externally owned texture
    Texture(TextureHandle),
    /// Off-screen target and its attachments
    Target {
        handle: RenderTargetHandle,
        info: RenderTargetInfo,
    },
    /// The display surface
    Surface,
}

impl Binding {
    /// Texture to sample for `selector`
    pub fn texture(&self, selector: AttachmentSelector) -> Option<TextureHandle> {
        match (self, selector) {
            (Binding::Texture(texture), AttachmentSelector::Color(0)) => Some(*texture),
            (Binding::Texture(_), _) => None,
            (Binding::Target { info, .. }, AttachmentSelector::Color(i)) => {
                info.color_textures.get(i as usize).copied()
            }
            (Binding::Target { info, .. }, AttachmentSelector::Depth) => info.depth_texture,
            (Binding::Surface, _) => None,
        }
    }

    /// Target to bind for writing; `None` is the display surface
    pub fn target(&self) -> Option<RenderTargetHandle> {
        match self {
            Binding::Target { handle, .. } => Some(*handle),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResourceTable {
    bindings: HashMap<ResourceId, Binding>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn bind(&mut self, resource: ResourceId, binding: Binding) {
        self.bindings.insert(resource, binding);
    }

    pub fn unbind(&mut self, resource: ResourceId) -> Option<Binding> {
        self.bindings.remove(&resource)
    }

    /// Make `dst` resolve to whatever `src` is bound to. Returns `false` if
    /// `src` is unbound.
    pub fn alias(&mut self, dst: ResourceId, src: ResourceId) -> bool {
        match self.bindings.get(&src).cloned() {
            Some(binding) => {
                self.bindings.insert(dst, binding);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, resource: ResourceId) -> Option<&Binding> {
        self.bindings.get(&resource)
    }

    pub fn is_bound(&self, resource: ResourceId) -> bool {
        self.bindings.contains_key(&resource)
    }

    /// `None` if nothing produced the resource this frame
    pub fn read_texture(
        &self,
        resource: ResourceId,
        selector: AttachmentSelector,
    ) -> Option<TextureHandle> {
        self.bindings.get(&resource)?.texture(selector)
    }

    /// `None` denotes the display surface
    pub fn write_target(&self, resource: ResourceId) -> Option<RenderTargetHandle> {
        self.bindings.get(&resource)?.target()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
