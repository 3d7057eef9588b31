//! Core graphics context abstraction
//!
//! [`GraphicsContext`] is the interface the frame graph consumes from the
//! underlying renderer: target creation and binding, the draw-buffer list,
//! fullscreen draws and the host library's top-level scene render.

use crate::backend::types::*;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Graphics context is unavailable (not initialized or lost)")]
    ContextUnavailable,
    #[error("Failed to create render target: {0}")]
    TargetCreationFailed(String),
    #[error("Unknown render target: {0:?}")]
    UnknownRenderTarget(RenderTargetHandle),
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Imperative, globally-mutable graphics context
///
/// Implementations forward to a real renderer. Calls are fire-and-forget in
/// submission order; nothing here waits for GPU completion.
pub trait GraphicsContext {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// `false` before initialization and after a context loss
    fn is_available(&self) -> bool;

    /// Maximum number of simultaneously written color attachments
    fn max_color_attachments(&self) -> u32 {
        8
    }

    // Render targets

    /// Create an off-screen render target
    fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle>;

    /// Resize the backing storage of a render target
    fn resize_render_target(
        &mut self,
        target: RenderTargetHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()>;

    /// Destroy a render target
    fn destroy_render_target(&mut self, target: RenderTargetHandle);

    /// Describe a live render target
    fn render_target_info(&self, target: RenderTargetHandle) -> Option<RenderTargetInfo>;

    // Binding state

    /// The target actually bound right now (`None` = display surface)
    fn bound_render_target(&self) -> Option<RenderTargetHandle>;

    /// Bind a target (`None` = display surface)
    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>);

    /// Configure the multi-attachment output list
    fn set_draw_buffers(&mut self, buffers: &[DrawBuffer]);

    // Commands

    /// Clear every attachment of the bound target
    fn clear(&mut self, color: [f32; 4]);

    /// Draw a fullscreen triangle into the bound target
    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>);

    /// The host's top-level "render a frame" entry point
    ///
    /// The host may perform internal sub-renders (shadow maps) that bind
    /// other targets and only partially restore state.
    fn render_scene(&mut self, request: &SceneRenderRequest);

    /// Render six faces of a cube target from a point in the scene
    fn render_cube(&mut self, request: &CubeRenderRequest);

    // Host scene state

    /// Background currently set on the scene
    fn scene_background(&self, scene: SceneHandle) -> Option<TextureHandle>;

    fn set_scene_background(&mut self, scene: SceneHandle, background: Option<TextureHandle>);

    /// Environment map used for image-based lighting
    fn set_scene_environment(&mut self, scene: SceneHandle, environment: Option<TextureHandle>);
}
