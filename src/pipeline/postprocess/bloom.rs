//! Bloom post-processing effect

use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BloomUniform {
    pub threshold: f32,
    pub intensity: f32,
    pub _padding: [f32; 2],
}

fn uniforms(frame: &FrameInfo) -> Vec<u8> {
    let uniform = BloomUniform {
        threshold: frame.params.bloom_threshold,
        intensity: frame.params.bloom_intensity,
        _padding: [0.0; 2],
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

/// Half-resolution bright-pass and blur
pub fn bloom_pass(enabled: bool) -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::BLOOM)
        .with_name("Bloom")
        .input(names::DOF_COLOR)
        .output(OutputDecl::new(
            names::BLOOM,
            ResourceDesc::hdr().with_size(TextureSize::scaled(0.5)),
        ))
        .enabled(enabled);
    FullscreenPass::new(descriptor, "bloom", uniforms)
}
