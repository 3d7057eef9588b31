//! Screen-space ambient occlusion

use crate::backend::types::TextureFormat;
use crate::pipeline::geometry_pass::NORMAL_ATTACHMENT;
use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AmbientOcclusionUniform {
    pub projection: Mat4,
    pub radius: f32,
    pub intensity: f32,
    pub near: f32,
    pub far: f32,
}

fn uniforms(frame: &FrameInfo) -> Vec<u8> {
    let uniform = AmbientOcclusionUniform {
        projection: frame.camera_data.projection,
        radius: frame.params.ao_radius,
        intensity: frame.params.ao_intensity,
        near: frame.camera_data.near,
        far: frame.camera_data.far,
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

/// Half-resolution occlusion term from pre-pass depth and scene normals
pub fn ambient_occlusion_pass(enabled: bool) -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::AMBIENT_OCCLUSION)
        .with_name("Ambient Occlusion")
        .input(InputDecl::new(names::DEPTH).attachment(AttachmentSelector::Depth))
        .input(InputDecl::new(names::SCENE_COLOR).attachment(NORMAL_ATTACHMENT))
        .output(OutputDecl::new(
            names::AO,
            ResourceDesc::hdr()
                .with_format(TextureFormat::R8Unorm)
                .with_size(TextureSize::scaled(0.5)),
        ))
        .enabled(enabled);
    FullscreenPass::new(descriptor, "ssao", uniforms)
}
