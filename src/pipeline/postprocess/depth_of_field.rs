//! Depth of field

use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DepthOfFieldUniform {
    pub focus_distance: f32,
    pub aperture: f32,
    pub near: f32,
    pub far: f32,
}

fn uniforms(frame: &FrameInfo) -> Vec<u8> {
    let uniform = DepthOfFieldUniform {
        focus_distance: frame.params.focus_distance,
        aperture: frame.params.aperture,
        near: frame.camera_data.near,
        far: frame.camera_data.far,
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

/// Passes HDR color through unchanged when disabled
pub fn depth_of_field_pass(enabled: bool) -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::DEPTH_OF_FIELD)
        .with_name("Depth of Field")
        .input(names::HDR_COLOR)
        .input(InputDecl::new(names::SCENE_COLOR).attachment(AttachmentSelector::Depth))
        .output(OutputDecl::new(names::DOF_COLOR, ResourceDesc::hdr()))
        .passthrough()
        .enabled(enabled);
    FullscreenPass::new(descriptor, "depth_of_field", uniforms)
}
