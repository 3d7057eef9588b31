//! Render graph resources
//!
//! Resources are named by strings in pass descriptors and interned into
//! [`ResourceId`]s when a pass is registered, so compilation and per-frame
//! lookups compare integers.

use crate::backend::types::*;
use std::collections::HashMap;

/// Interned identifier for a render graph resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) u32);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Name <-> id interning table
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    names: Vec<String>,
    lookup: HashMap<String, ResourceId>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, allocating one on first use
    pub fn intern(&mut self, name: &str) -> ResourceId {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = ResourceId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<ResourceId> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, id: ResourceId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (ResourceId(i as u32), name.as_str()))
    }
}

/// Describes texture dimensions that can be relative to screen size
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureSize {
    /// Absolute size in pixels
    Absolute { width: u32, height: u32 },
    /// Relative to the viewport (1.0 = full screen)
    Relative { width_scale: f32, height_scale: f32 },
}

impl Default for TextureSize {
    fn default() -> Self {
        TextureSize::Relative {
            width_scale: 1.0,
            height_scale: 1.0,
        }
    }
}

impl TextureSize {
    pub fn scaled(scale: f32) -> Self {
        TextureSize::Relative {
            width_scale: scale,
            height_scale: scale,
        }
    }

    /// Resolve against the viewport; never smaller than 1x1
    pub fn resolve(&self, screen_width: u32, screen_height: u32) -> (u32, u32) {
        let (width, height) = match self {
            TextureSize::Absolute { width, height } => (*width, *height),
            TextureSize::Relative {
                width_scale,
                height_scale,
            } => (
                ((screen_width as f32) * width_scale) as u32,
                ((screen_height as f32) * height_scale) as u32,
            ),
        };
        (width.max(1), height.max(1))
    }
}

/// Backing storage requested for a pass output
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDesc {
    pub size: TextureSize,
    pub format: TextureFormat,
    pub color_attachments: u32,
    pub depth: bool,
    pub kind: TargetKind,
}

impl Default for ResourceDesc {
    fn default() -> Self {
        Self {
            size: TextureSize::default(),
            format: TextureFormat::Rgba16Float,
            color_attachments: 1,
            depth: false,
            kind: TargetKind::Texture2d,
        }
    }
}

impl ResourceDesc {
    /// Full-viewport HDR color target
    pub fn hdr() -> Self {
        Self::default()
    }

    /// Full-viewport 8-bit color target
    pub fn ldr() -> Self {
        Self::default().with_format(TextureFormat::Rgba8Unorm)
    }

    /// Full-viewport depth-only target
    pub fn depth_only() -> Self {
        Self {
            format: TextureFormat::Depth32Float,
            color_attachments: 0,
            depth: true,
            ..Default::default()
        }
    }

    pub fn cube(size: u32) -> Self {
        Self {
            size: TextureSize::Absolute {
                width: size,
                height: size,
            },
            kind: TargetKind::CubeMap,
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: TextureSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_color_attachments(mut self, count: u32) -> Self {
        self.color_attachments = count;
        self
    }

    pub fn with_depth(mut self, depth: bool) -> Self {
        self.depth = depth;
        self
    }

    /// Concrete target descriptor for the given viewport
    pub fn to_target_descriptor(&self, label: &str, viewport: (u32, u32)) -> RenderTargetDescriptor {
        let (width, height) = self.size.resolve(viewport.0, viewport.1);
        RenderTargetDescriptor {
            label: Some(label.to_string()),
            width,
            height,
            format: self.format,
            color_attachments: self.color_attachments,
            depth: self.depth,
            kind: self.kind,
        }
    }
}

/// Which texture of a bound target a read resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSelector {
    Color(u32),
    Depth,
}

impl Default for AttachmentSelector {
    fn default() -> Self {
        AttachmentSelector::Color(0)
    }
}

/// First and last use of a resource in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLifetime {
    pub first_use: usize,
    pub last_use: usize,
}
