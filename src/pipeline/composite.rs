//! Final passes writing to the display surface

use crate::pipeline::postprocess::FullscreenPass;
use crate::pipeline::{names, pass_ids, PRIORITY_LAST};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::pass::*;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OverlayUniform {
    pub time: f32,
    pub delta_time: f32,
    pub frame_index: u32,
    pub _padding: u32,
}

fn no_uniforms(_frame: &FrameInfo) -> Vec<u8> {
    Vec::new()
}

fn overlay_uniforms(frame: &FrameInfo) -> Vec<u8> {
    let uniform = OverlayUniform {
        time: frame.time,
        delta_time: frame.delta_time,
        frame_index: frame.frame_index as u32,
        _padding: 0,
    };
    bytemuck::bytes_of(&uniform).to_vec()
}

/// Copies the anti-aliased image to the display surface
pub fn composite_pass() -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::COMPOSITE)
        .with_name("Composite")
        .input(names::AA_COLOR);
    FullscreenPass::new(descriptor, "composite", no_uniforms)
}

/// Frame statistics drawn over the final image.
///
/// Has no dependencies, so it relies on its priority to run last.
pub fn debug_overlay_pass(enabled: bool) -> FullscreenPass {
    let descriptor = PassDescriptor::new(pass_ids::DEBUG_OVERLAY)
        .with_name("Debug Overlay")
        .priority(PRIORITY_LAST)
        .enabled(enabled);
    FullscreenPass::new(descriptor, "debug_overlay", overlay_uniforms)
}
