//! HDR to LDR tone mapping

use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TonemappingUniform {
    pub exposure: f32,
    pub bloom_intensity: f32,
    pub _padding: [f32; 2],
}

fn uniforms(frame: &FrameInfo) -> Vec<u8> {
    let uniform = TonemappingUniform {
        exposure: frame.params.exposure,
        bloom_intensity: frame.params.bloom_intensity,
        _padding: [0.0; 2],
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

pub fn tonemapping_pass() -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::TONEMAPPING)
        .with_name("Tonemapping")
        .input(names::DOF_COLOR)
        .input(InputDecl::new(names::BLOOM).optional())
        .output(OutputDecl::new(names::LDR_COLOR, ResourceDesc::ldr()));
    FullscreenPass::new(descriptor, "tonemapping", uniforms)
}
