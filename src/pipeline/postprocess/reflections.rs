//! Screen-space reflections

use crate::pipeline::geometry_pass::{COLOR_ATTACHMENT, NORMAL_ATTACHMENT};
use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ReflectionsUniform {
    pub view_projection: Mat4,
    pub strength: f32,
    pub max_distance: f32,
    pub _padding: [f32; 2],
}

fn uniforms(frame: &FrameInfo) -> Vec<u8> {
    let uniform = ReflectionsUniform {
        view_projection: frame.camera_data.view_projection(),
        strength: frame.params.reflection_strength,
        max_distance: frame.camera_data.far,
        _padding: [0.0; 2],
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

pub fn reflections_pass(enabled: bool) -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::REFLECTIONS)
        .with_name("Reflections")
        .input(InputDecl::new(names::SCENE_COLOR).attachment(COLOR_ATTACHMENT))
        .input(InputDecl::new(names::SCENE_COLOR).attachment(NORMAL_ATTACHMENT))
        .input(InputDecl::new(names::SCENE_COLOR).attachment(AttachmentSelector::Depth))
        .output(OutputDecl::new(names::REFLECTIONS, ResourceDesc::hdr()))
        .enabled(enabled);
    FullscreenPass::new(descriptor, "ssr", uniforms)
}
