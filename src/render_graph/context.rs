//! Per-frame context handed to each pass

use crate::backend::attachment_sync::SyncedContext;
use crate::backend::traits::GraphicsContext;
use crate::backend::types::*;
use crate::pipeline::EffectParams;
use crate::render_graph::export::{ExportQueue, ExportValue, ExternalState};
use crate::render_graph::pass::PassNode;
use crate::render_graph::resource::*;
use crate::render_graph::resource_table::{Binding, ResourceTable};
use glam::UVec2;

/// Read-only frame metadata
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    pub frame_index: u64,
    /// Seconds since the renderer started
    pub time: f32,
    pub delta_time: f32,
    pub viewport: UVec2,
    pub scene: SceneHandle,
    pub camera: CameraHandle,
    pub camera_data: CameraData,
    /// Application settings snapshot for this frame
    pub params: EffectParams,
}

impl FrameInfo {
    pub fn new(viewport: UVec2) -> Self {
        Self {
            frame_index: 0,
            time: 0.0,
            delta_time: 0.0,
            viewport,
            scene: SceneHandle::default(),
            camera: CameraHandle::default(),
            camera_data: CameraData::default(),
            params: EffectParams::default(),
        }
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport.x, self.viewport.y)
    }
}

/// Context for executing a render pass
///
/// This is the only sanctioned channel from a pass to graph resources. Reads
/// and writes of resources the pass did not declare are served but logged.
pub struct PassExecuteContext<'a> {
    pub(crate) gpu: &'a mut SyncedContext,
    pub(crate) frame: &'a FrameInfo,
    pub(crate) external: &'a ExternalState,
    pub(crate) table: &'a ResourceTable,
    pub(crate) registry: &'a ResourceRegistry,
    pub(crate) exports: &'a mut ExportQueue,
    pub(crate) node: &'a PassNode,
}

impl<'a> PassExecuteContext<'a> {
    pub fn gpu(&mut self) -> &mut SyncedContext {
        &mut *self.gpu
    }

    pub fn frame(&self) -> &FrameInfo {
        self.frame
    }

    pub fn params(&self) -> &EffectParams {
        &self.frame.params
    }

    /// Shared state as of the end of the previous frame
    pub fn external(&self) -> &ExternalState {
        self.external
    }

    pub fn pass_id(&self) -> &str {
        self.node.id()
    }

    /// Texture bound to `name`, using the attachment declared for it
    pub fn read_texture(&self, name: &str) -> Option<TextureHandle> {
        let id = self.registry.get(name)?;
        let selector = match self.node.input_selector(id) {
            Some(selector) => selector,
            None => {
                self.warn_undeclared("read", name);
                AttachmentSelector::default()
            }
        };
        self.table.read_texture(id, selector)
    }

    /// A specific attachment of the target bound to `name`
    pub fn read_attachment(&self, name: &str, selector: AttachmentSelector) -> Option<TextureHandle> {
        let id = self.registry.get(name)?;
        if !self.node.reads_resource(id) {
            self.warn_undeclared("read", name);
        }
        self.table.read_texture(id, selector)
    }

    /// Texture for the pass's `index`th declared input
    pub fn input(&self, index: usize) -> Option<TextureHandle> {
        let input = self.node.inputs.get(index)?;
        self.table.read_texture(input.resource, input.selector)
    }

    /// Every declared input in declaration order; `None` where absent
    pub fn inputs(&self) -> Vec<Option<TextureHandle>> {
        self.node
            .inputs
            .iter()
            .map(|i| self.table.read_texture(i.resource, i.selector))
            .collect()
    }

    /// What `name` is bound to; `None` if it is unknown or unbound this frame
    pub fn write_binding(&self, name: &str) -> Option<&Binding> {
        let id = self.registry.get(name)?;
        if !self.node.writes_resource(id) {
            self.warn_undeclared("write", name);
        }
        self.table.get(id)
    }

    /// Target bound to `name`; `None` denotes the display surface.
    ///
    /// Unknown or unbound names also fall back to the surface, with a warning.
    /// Use [`write_binding`](Self::write_binding) to tell the cases apart.
    pub fn write_target(&self, name: &str) -> Option<RenderTargetHandle> {
        match self.write_binding(name) {
            Some(binding) => binding.target(),
            None => {
                log::warn!(
                    "Pass '{}' writes '{}', which is not bound this frame; using the display surface",
                    self.node.id(),
                    name
                );
                None
            }
        }
    }

    /// The pass's first output, or the display surface if it has none
    pub fn output_target(&self) -> Option<RenderTargetHandle> {
        self.node
            .outputs
            .first()
            .and_then(|o| self.table.write_target(o.resource))
    }

    /// Bind [`output_target`](Self::output_target) on the graphics context
    pub fn bind_output(&mut self) -> Option<RenderTargetHandle> {
        let target = self.output_target();
        self.gpu.bind_render_target(target);
        target
    }

    /// Queue a write to shared state, applied after the frame
    pub fn queue_export(&mut self, id: &str, value: ExportValue) {
        self.exports.queue(id, value);
    }

    fn warn_undeclared(&self, access: &str, name: &str) {
        log::warn!(
            "Pass '{}' {}s undeclared resource '{}'",
            self.node.id(),
            access,
            name
        );
    }
}
