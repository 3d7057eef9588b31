//! Fast approximate anti-aliasing

use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FxaaUniform {
    pub subpixel: f32,
    pub inverse_width: f32,
    pub inverse_height: f32,
    pub _padding: f32,
}

fn uniforms(frame: &FrameInfo) -> Vec<u8> {
    let (width, height) = frame.viewport_size();
    let uniform = FxaaUniform {
        subpixel: frame.params.fxaa_subpixel,
        inverse_width: 1.0 / width.max(1) as f32,
        inverse_height: 1.0 / height.max(1) as f32,
        _padding: 0.0,
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

pub fn fxaa_pass(enabled: bool) -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::FXAA)
        .with_name("FXAA")
        .input(names::LDR_COLOR)
        .output(OutputDecl::new(names::AA_COLOR, ResourceDesc::ldr()))
        .passthrough()
        .enabled(enabled);
    FullscreenPass::new(descriptor, "fxaa", uniforms)
}
