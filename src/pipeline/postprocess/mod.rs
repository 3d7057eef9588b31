//! Post-processing effects
//!
//! Every effect here is a single fullscreen draw. They share [`FullscreenPass`]
//! and differ only in their declarations, shader program and uniform block.

mod ambient_occlusion;
mod bloom;
mod depth_of_field;
mod fxaa;
mod reflections;
mod resolve;
mod tonemapping;

pub use ambient_occlusion::{ambient_occlusion_pass, AmbientOcclusionUniform};
pub use bloom::{bloom_pass, BloomUniform};
pub use depth_of_field::{depth_of_field_pass, DepthOfFieldUniform};
pub use fxaa::{fxaa_pass, FxaaUniform};
pub use reflections::{reflections_pass, ReflectionsUniform};
pub use resolve::{resolve_pass, ResolveUniform};
pub use tonemapping::{tonemapping_pass, TonemappingUniform};

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::context::{FrameInfo, PassExecuteContext};
use crate::render_graph::pass::*;
use std::any::Any;

/// Builds the uniform block for one frame
pub type UniformFn = fn(&FrameInfo) -> Vec<u8>;

/// Fullscreen-triangle pass drawing one shader program into its first output
pub struct FullscreenPass {
    descriptor: PassDescriptor,
    program: &'static str,
    uniforms: UniformFn,
    draw_count: u64,
}

impl FullscreenPass {
    pub fn new(descriptor: PassDescriptor, program: &'static str, uniforms: UniformFn) -> Self {
        Self {
            descriptor,
            program,
            uniforms,
            draw_count: 0,
        }
    }

    pub fn program(&self) -> &str {
        self.program
    }

    /// Number of frames this pass has drawn
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }
}

impl RenderPass for FullscreenPass {
    fn descriptor(&self) -> PassDescriptor {
        self.descriptor.clone()
    }

    fn execute(&mut self, ctx: &mut PassExecuteContext<'_>) -> PassStatus {
        let inputs = ctx.inputs();
        let uniforms = (self.uniforms)(ctx.frame());

        ctx.bind_output();
        ctx.gpu().draw_fullscreen(&FullscreenDraw {
            label: &self.descriptor.name,
            program: self.program,
            inputs: &inputs,
            uniforms: &uniforms,
        });
        self.draw_count += 1;
        PassStatus::Rendered
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
