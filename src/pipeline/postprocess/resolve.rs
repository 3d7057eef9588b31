//! Combines scene color with the optional screen-space terms

use crate::pipeline::geometry_pass::COLOR_ATTACHMENT;
use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ResolveUniform {
    pub ao_intensity: f32,
    pub reflection_strength: f32,
    pub _padding: [f32; 2],
}

fn uniforms(frame: &FrameInfo) -> Vec<u8> {
    let uniform = ResolveUniform {
        ao_intensity: frame.params.ao_intensity,
        reflection_strength: frame.params.reflection_strength,
        _padding: [0.0; 2],
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

/// Missing AO or reflections bind the fallback texture
pub fn resolve_pass() -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::RESOLVE)
        .with_name("Resolve")
        .input(InputDecl::new(names::SCENE_COLOR).attachment(COLOR_ATTACHMENT))
        .input(InputDecl::new(names::AO).optional())
        .input(InputDecl::new(names::REFLECTIONS).optional())
        .output(OutputDecl::new(names::HDR_COLOR, ResourceDesc::hdr()));
    FullscreenPass::new(descriptor, "resolve", uniforms)
}
