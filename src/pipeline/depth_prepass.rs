//! Depth pre-pass

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::PassExecuteContext;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use std::any::Any;

/// Renders scene depth with a depth-only material override
pub struct DepthPrepass {
    enabled: bool,
}

impl DepthPrepass {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for DepthPrepass {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RenderPass for DepthPrepass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor::new(pass_ids::DEPTH_PREPASS)
            .with_name("Depth Prepass")
            .output(OutputDecl::new(names::DEPTH, ResourceDesc::depth_only()))
            .enabled(self.enabled)
    }

    fn execute(&mut self, ctx: &mut PassExecuteContext<'_>) -> PassStatus {
        let frame = *ctx.frame();
        ctx.bind_output();

        let gpu = ctx.gpu();
        gpu.clear([1.0, 0.0, 0.0, 0.0]);
        gpu.render_scene(&SceneRenderRequest {
            scene: frame.scene,
            camera: frame.camera,
            material_override: Some(MaterialOverride::DepthOnly),
        });
        PassStatus::Rendered
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
