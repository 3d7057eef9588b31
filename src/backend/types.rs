//! Common types shared between the frame graph and graphics contexts

use glam::{Mat4, Vec3};
use std::borrow::Cow;

/// Handle to a GPU texture owned by the graphics context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u64);

impl TextureHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to an off-screen render target owned by the graphics context
///
/// The display surface has no handle; APIs use `None` to denote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetHandle(pub(crate) u64);

impl RenderTargetHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a scene supplied by the external 3D content layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SceneHandle(pub u64);

/// Handle to a camera supplied by the external 3D content layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CameraHandle(pub u64);

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    #[default]
    Rgba16Float,
    Rgba32Float,
    R8Unorm,
    R16Float,
    Depth24Plus,
    Depth32Float,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::Depth24Plus | TextureFormat::Depth32Float)
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::R16Float => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Depth24Plus
            | TextureFormat::Depth32Float => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// Shape of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetKind {
    #[default]
    Texture2d,
    /// Six square faces, each rendered separately by the host
    CubeMap,
}

/// Render target descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Number of simultaneously written color outputs (1 for a standard target)
    pub color_attachments: u32,
    pub depth: bool,
    pub kind: TargetKind,
}

impl Default for RenderTargetDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 1,
            height: 1,
            format: TextureFormat::Rgba16Float,
            color_attachments: 1,
            depth: false,
            kind: TargetKind::Texture2d,
        }
    }
}

impl RenderTargetDescriptor {
    pub fn new(label: &str, width: u32, height: u32) -> Self {
        Self {
            label: Some(label.to_string()),
            width,
            height,
            ..Default::default()
        }
    }

    /// Square cube map target with one color attachment per face
    pub fn cube(label: &str, size: u32) -> Self {
        Self {
            label: Some(label.to_string()),
            width: size,
            height: size,
            kind: TargetKind::CubeMap,
            ..Default::default()
        }
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
}

/// What the graphics context knows about a live render target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub kind: TargetKind,
    pub color_textures: Vec<TextureHandle>,
    pub depth_texture: Option<TextureHandle>,
}

impl RenderTargetInfo {
    pub fn color_attachment_count(&self) -> u32 {
        self.color_textures.len() as u32
    }
}

/// One entry of the context's draw-buffer (multi-attachment output) list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawBuffer {
    None,
    /// The display surface's default color buffer
    Back,
    ColorAttachment(u32),
}

const DRAW_BUFFERS_SURFACE: [DrawBuffer; 1] = [DrawBuffer::Back];
const DRAW_BUFFERS_DEPTH_ONLY: [DrawBuffer; 1] = [DrawBuffer::None];
const DRAW_BUFFERS_1: [DrawBuffer; 1] = [DrawBuffer::ColorAttachment(0)];
const DRAW_BUFFERS_2: [DrawBuffer; 2] = [DrawBuffer::ColorAttachment(0), DrawBuffer::ColorAttachment(1)];
const DRAW_BUFFERS_3: [DrawBuffer; 3] = [
    DrawBuffer::ColorAttachment(0),
    DrawBuffer::ColorAttachment(1),
    DrawBuffer::ColorAttachment(2),
];
const DRAW_BUFFERS_4: [DrawBuffer; 4] = [
    DrawBuffer::ColorAttachment(0),
    DrawBuffer::ColorAttachment(1),
    DrawBuffer::ColorAttachment(2),
    DrawBuffer::ColorAttachment(3),
];

/// Draw-buffer list for a bound target with `count` color attachments.
///
/// `0` means the display surface. Common counts come from static tables,
/// larger ones are synthesized.
pub fn draw_buffers_for(count: u32) -> Cow<'static, [DrawBuffer]> {
    match count {
        0 => Cow::Borrowed(&DRAW_BUFFERS_SURFACE),
        1 => Cow::Borrowed(&DRAW_BUFFERS_1),
        2 => Cow::Borrowed(&DRAW_BUFFERS_2),
        3 => Cow::Borrowed(&DRAW_BUFFERS_3),
        4 => Cow::Borrowed(&DRAW_BUFFERS_4),
        n => Cow::Owned((0..n).map(DrawBuffer::ColorAttachment).collect()),
    }
}

/// Draw-buffer list for an off-screen target without color attachments
pub fn depth_only_draw_buffers() -> Cow<'static, [DrawBuffer]> {
    Cow::Borrowed(&DRAW_BUFFERS_DEPTH_ONLY)
}

/// Inverse of [`draw_buffers_for`]: the attachment count a list configures
pub fn attachment_count_of(buffers: &[DrawBuffer]) -> u32 {
    if buffers == [DrawBuffer::Back] {
        0
    } else {
        buffers
            .iter()
            .filter(|b| matches!(b, DrawBuffer::ColorAttachment(_)))
            .count() as u32
    }
}

/// Material override applied by the host for a whole scene render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialOverride {
    DepthOnly,
    NormalDepth,
}

/// Top-level "render a frame" request forwarded to the host renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneRenderRequest {
    pub scene: SceneHandle,
    pub camera: CameraHandle,
    pub material_override: Option<MaterialOverride>,
}

/// Capture of the surroundings of `position` into the six faces of a cube target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeRenderRequest {
    pub scene: SceneHandle,
    pub target: RenderTargetHandle,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

/// A fullscreen-triangle draw into the currently bound target
#[derive(Debug, Clone, Copy)]
pub struct FullscreenDraw<'a> {
    pub label: &'a str,
    /// Name of the shader program registered with the host
    pub program: &'a str,
    /// Sampled inputs in binding order; `None` binds the host's fallback texture
    pub inputs: &'a [Option<TextureHandle>],
    pub uniforms: &'a [u8],
}

/// Camera matrices for the active view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraData {
    fn default() -> Self {
        let position = Vec3::new(0.0, 0.0, 5.0);
        Self {
            view: Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 1000.0),
            position,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraData {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}
