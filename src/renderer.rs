//! Rendering root
//!
//! [`FrameRenderer`] owns the one [`SyncedContext`] for its graphics context,
//! the render graph and the external state carried between frames. Every
//! consumer reaches the synchronizer through it.

use crate::backend::attachment_sync::SyncedContext;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::pipeline::{build_postprocess_graph, EffectParams};
use crate::render_graph::{ExternalState, FrameInfo, FrameReport, GraphResult, RenderGraph};
use crate::RendererConfig;
use glam::UVec2;

pub struct FrameRenderer {
    gpu: SyncedContext,
    graph: RenderGraph,
    external: ExternalState,
    config: RendererConfig,
    scene: SceneHandle,
    camera: CameraHandle,
    camera_data: CameraData,
    frame_index: u64,
    time: f32,
}

impl FrameRenderer {
    /// Renderer running the built-in chain
    ///
    /// Configuration errors surface here, before any frame executes.
    pub fn new(context: Box<dyn GraphicsContext>, config: RendererConfig) -> GraphResult<Self> {
        let graph = build_postprocess_graph(&config.pipeline)?;
        Self::with_graph(context, graph, config)
    }

    /// Renderer running a caller-built graph
    pub fn with_graph(
        context: Box<dyn GraphicsContext>,
        mut graph: RenderGraph,
        config: RendererConfig,
    ) -> GraphResult<Self> {
        graph.compile()?;
        graph.resize(config.width, config.height);

        let mut gpu = SyncedContext::new(context);
        gpu.force_sync();
        log::info!(
            "FrameRenderer created on '{}' ({}x{}, {} passes)",
            gpu.name(),
            config.width,
            config.height,
            graph.len()
        );

        Ok(Self {
            gpu,
            graph,
            external: ExternalState::new(),
            config,
            scene: SceneHandle::default(),
            camera: CameraHandle::default(),
            camera_data: CameraData::default(),
            frame_index: 0,
            time: 0.0,
        })
    }

    /// Scene and camera rendered by subsequent frames
    pub fn set_view(&mut self, scene: SceneHandle, camera: CameraHandle, camera_data: CameraData) {
        self.scene = scene;
        self.camera = camera;
        self.camera_data = camera_data;
    }

    pub fn set_camera_data(&mut self, camera_data: CameraData) {
        self.camera_data = camera_data;
    }

    pub fn params(&self) -> &EffectParams {
        &self.config.params
    }

    /// Settings polled by passes from the next frame on
    pub fn params_mut(&mut self) -> &mut EffectParams {
        &mut self.config.params
    }

    /// Toggle a pass by id without recompiling
    pub fn set_pass_enabled(&mut self, pass: &str, enabled: bool) -> bool {
        self.graph.set_pass_enabled(pass, enabled)
    }

    /// Render one frame
    pub fn render_frame(&mut self, delta_time: f32) -> GraphResult<FrameReport> {
        self.frame_index += 1;
        self.time += delta_time;

        let frame = FrameInfo {
            frame_index: self.frame_index,
            time: self.time,
            delta_time,
            viewport: UVec2::new(self.config.width, self.config.height),
            scene: self.scene,
            camera: self.camera,
            camera_data: self.camera_data,
            params: self.config.params,
        };
        self.graph.execute(&mut self.gpu, &frame, &mut self.external)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        log::debug!("Resizing renderer to {}x{}", width, height);
        self.config.width = width;
        self.config.height = height;
        self.graph.resize(width, height);
    }

    /// The graphics context was lost; frames are no-ops until restored
    pub fn handle_context_lost(&mut self) {
        self.gpu.invalidate_for_context_loss();
        self.graph.invalidate_for_context_loss();
        // Exported textures belonged to the lost context
        self.external.clear();
    }

    pub fn handle_context_restored(&mut self, context: Box<dyn GraphicsContext>) {
        self.gpu.reinitialize(context);
    }

    /// Release every GPU resource owned by the graph and its passes
    pub fn shutdown(mut self) {
        log::info!("FrameRenderer shutting down after {} frames", self.frame_index);
        self.graph.dispose(&mut self.gpu);
    }

    pub fn gpu(&self) -> &SyncedContext {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut SyncedContext {
        &mut self.gpu
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut RenderGraph {
        &mut self.graph
    }

    pub fn external(&self) -> &ExternalState {
        &self.external
    }

    pub fn external_mut(&mut self) -> &mut ExternalState {
        &mut self.external
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}
