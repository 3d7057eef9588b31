//! Geometry capture
//!
//! Renders the scene once into a multi-attachment target: lit color,
//! view-space normals and material parameters, plus depth.

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::PassExecuteContext;
use crate::render_graph::export::slots;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use std::any::Any;

/// Attachment holding lit scene color
pub const COLOR_ATTACHMENT: AttachmentSelector = AttachmentSelector::Color(0);
/// Attachment holding view-space normals
pub const NORMAL_ATTACHMENT: AttachmentSelector = AttachmentSelector::Color(1);
/// Attachment holding roughness/metallic
pub const MATERIAL_ATTACHMENT: AttachmentSelector = AttachmentSelector::Color(2);

pub struct GeometryPass {
    clear_color: [f32; 4],
    /// Scene slots as last pushed to the host
    pushed_environment: Option<TextureHandle>,
    pushed_background: Option<TextureHandle>,
}

impl GeometryPass {
    pub fn new() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            pushed_environment: None,
            pushed_background: None,
        }
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }
}

impl Default for GeometryPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for GeometryPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor::new(pass_ids::GEOMETRY)
            .with_name("Geometry Capture")
            .output(OutputDecl::new(
                names::SCENE_COLOR,
                ResourceDesc::hdr().with_color_attachments(3).with_depth(true),
            ))
    }

    fn execute(&mut self, ctx: &mut PassExecuteContext<'_>) -> PassStatus {
        let frame = *ctx.frame();
        let environment = ctx.external().texture(slots::SCENE_ENVIRONMENT);
        let background = ctx.external().texture(slots::SCENE_BACKGROUND);

        // Shared scene state only changes at frame boundaries; a cleared
        // slot is pushed as `None`
        let gpu = ctx.gpu();
        if environment != self.pushed_environment {
            gpu.set_scene_environment(frame.scene, environment);
            self.pushed_environment = environment;
        }
        if background != self.pushed_background {
            gpu.set_scene_background(frame.scene, background);
            self.pushed_background = background;
        }

        ctx.bind_output();
        let gpu = ctx.gpu();
        gpu.clear(self.clear_color);
        gpu.render_scene(&SceneRenderRequest {
            scene: frame.scene,
            camera: frame.camera,
            material_override: None,
        });
        PassStatus::Rendered
    }

    fn invalidate_for_context_loss(&mut self) {
        self.pushed_environment = None;
        self.pushed_background = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
