//! # Frame Graph
//!
//! A render graph-based frame scheduler for post-processing chains.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderGraph`] - Passes with declared inputs and outputs, ordered by a
//!   stable priority topological sort
//! - [`SyncedContext`] - Decorator keeping the graphics context's draw-buffer
//!   list in sync with the bound render target
//! - [`render_graph::TemporalResource`] - Multi-generation ring buffers for
//!   feedback-free history
//! - [`render_graph::ExternalState`] - Shared scene state, changed only at frame
//!   boundaries by deferred exports
//! - [`FrameRenderer`] - Rendering root running the built-in chain
//! - [`RecordingContext`] - Headless context for tests
//!
//! ## Example
//!
//! ```ignore
//! use frame_graph::{FrameRenderer, RecordingContext, RendererConfig};
//!
//! let mut renderer = FrameRenderer::new(Box::new(RecordingContext::new()), RendererConfig::default())?;
//! let report = renderer.render_frame(1.0 / 60.0)?;
//! ```

pub mod backend;
pub mod pipeline;
pub mod render_graph;
pub mod renderer;

// Re-export main types for convenience
pub use backend::{BackendError, GraphicsContext, RecordingContext, SyncedContext};
pub use pipeline::{build_postprocess_graph, EffectParams, PipelineConfig};
pub use render_graph::{
    FrameReport, GraphError, GraphResult, PassDescriptor, PassStatus, RenderGraph, RenderPass,
    SkipReason,
};
pub use renderer::FrameRenderer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for the rendering root
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial viewport width
    pub width: u32,
    /// Initial viewport height
    pub height: u32,
    pub pipeline: PipelineConfig,
    /// Initial effect parameters
    pub params: EffectParams,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            pipeline: PipelineConfig::default(),
            params: EffectParams::default(),
        }
    }
}

/// Initialize the library.
pub fn init() {
    log::info!("Frame Graph v{} initialized", VERSION);
}
