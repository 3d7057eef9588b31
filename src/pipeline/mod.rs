//! Post-processing pipeline
//!
//! The built-in chain, in dependency order:
//! 1. Environment capture - cube map of the surroundings, exported for the next frame
//! 2. Depth pre-pass and geometry capture (color, normals, material + depth)
//! 3. Screen-space effects - ambient occlusion, reflections, resolved into HDR color
//! 4. Post-processing - depth of field, bloom, tone mapping, FXAA
//! 5. Composite to the display surface, then the optional debug overlay

pub mod composite;
pub mod depth_prepass;
pub mod environment_capture;
pub mod geometry_pass;
pub mod postprocess;

pub use composite::{composite_pass, debug_overlay_pass};
pub use depth_prepass::DepthPrepass;
pub use environment_capture::EnvironmentCapturePass;
pub use geometry_pass::GeometryPass;
pub use postprocess::FullscreenPass;

use crate::render_graph::{GraphResult, RenderGraph};

/// Resource names used by the built-in chain
pub mod names {
    pub const DEPTH: &str = "depth";
    pub const SCENE_COLOR: &str = "scene_color";
    pub const AO: &str = "ao";
    pub const REFLECTIONS: &str = "reflections";
    pub const HDR_COLOR: &str = "hdr_color";
    pub const DOF_COLOR: &str = "dof_color";
    pub const BLOOM: &str = "bloom";
    pub const LDR_COLOR: &str = "ldr_color";
    pub const AA_COLOR: &str = "aa_color";
}

/// Pass ids of the built-in chain
pub mod pass_ids {
    pub const ENVIRONMENT_CAPTURE: &str = "environment_capture";
    pub const DEPTH_PREPASS: &str = "depth_prepass";
    pub const GEOMETRY: &str = "geometry";
    pub const AMBIENT_OCCLUSION: &str = "ambient_occlusion";
    pub const REFLECTIONS: &str = "reflections";
    pub const RESOLVE: &str = "resolve";
    pub const DEPTH_OF_FIELD: &str = "depth_of_field";
    pub const BLOOM: &str = "bloom";
    pub const TONEMAPPING: &str = "tonemapping";
    pub const FXAA: &str = "fxaa";
    pub const COMPOSITE: &str = "composite";
    pub const DEBUG_OVERLAY: &str = "debug_overlay";
}

/// Priority that keeps a pass ahead of everything with default priority
pub const PRIORITY_FIRST: i32 = -100;
/// Priority that keeps a dependency-free pass after everything else
pub const PRIORITY_LAST: i32 = 10000;

/// Environment capture settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentCaptureConfig {
    /// Cube face size in pixels
    pub resolution: u32,
    /// Generations kept in the ring (at least 2)
    pub history_length: usize,
    /// Capture every `interval` frames (0 and 1 both mean every frame)
    pub interval: u32,
    pub near: f32,
    pub far: f32,
}

impl Default for EnvironmentCaptureConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            history_length: 2,
            interval: 1,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Configuration for the post-processing pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub enable_depth_prepass: bool,
    pub enable_ambient_occlusion: bool,
    pub enable_reflections: bool,
    pub enable_depth_of_field: bool,
    pub enable_bloom: bool,
    pub enable_fxaa: bool,
    pub enable_environment_capture: bool,
    pub enable_debug_overlay: bool,
    pub environment_capture: EnvironmentCaptureConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_depth_prepass: true,
            enable_ambient_occlusion: true,
            enable_reflections: true,
            enable_depth_of_field: true,
            enable_bloom: true,
            enable_fxaa: true,
            enable_environment_capture: true,
            enable_debug_overlay: false,
            environment_capture: EnvironmentCaptureConfig::default(),
        }
    }
}

/// Effect parameters polled by passes every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub exposure: f32,
    pub bloom_threshold: f32,
    pub bloom_intensity: f32,
    pub ao_radius: f32,
    pub ao_intensity: f32,
    pub focus_distance: f32,
    pub aperture: f32,
    pub reflection_strength: f32,
    pub fxaa_subpixel: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            bloom_threshold: 1.0,
            bloom_intensity: 0.5,
            ao_radius: 0.5,
            ao_intensity: 1.0,
            focus_distance: 10.0,
            aperture: 0.05,
            reflection_strength: 0.5,
            fxaa_subpixel: 0.75,
        }
    }
}

/// Build the built-in render graph
///
/// Every pass is registered; disabled effects are registered disabled so they
/// can be toggled later with [`RenderGraph::set_pass_enabled`].
pub fn build_postprocess_graph(config: &PipelineConfig) -> GraphResult<RenderGraph> {
    let mut graph = RenderGraph::new();

    graph.add_pass(EnvironmentCapturePass::new(
        config.environment_capture,
        config.enable_environment_capture,
    ))?;
    graph.add_pass(DepthPrepass::new(config.enable_depth_prepass))?;
    graph.add_pass(GeometryPass::new())?;

    graph.add_pass(postprocess::ambient_occlusion_pass(config.enable_ambient_occlusion))?;
    graph.add_pass(postprocess::reflections_pass(config.enable_reflections))?;
    graph.add_pass(postprocess::resolve_pass())?;
    graph.add_pass(postprocess::depth_of_field_pass(config.enable_depth_of_field))?;
    graph.add_pass(postprocess::bloom_pass(config.enable_bloom))?;
    graph.add_pass(postprocess::tonemapping_pass())?;
    graph.add_pass(postprocess::fxaa_pass(config.enable_fxaa))?;

    graph.add_pass(composite_pass())?;
    graph.add_pass(debug_overlay_pass(config.enable_debug_overlay))?;

    graph.compile()?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_order() {
        let mut graph = build_postprocess_graph(&PipelineConfig::default()).unwrap();
        let order = graph.execution_order().unwrap();
        assert_eq!(
            order,
            vec![
                pass_ids::ENVIRONMENT_CAPTURE,
                pass_ids::DEPTH_PREPASS,
                pass_ids::GEOMETRY,
                pass_ids::AMBIENT_OCCLUSION,
                pass_ids::REFLECTIONS,
                pass_ids::RESOLVE,
                pass_ids::DEPTH_OF_FIELD,
                pass_ids::BLOOM,
                pass_ids::TONEMAPPING,
                pass_ids::FXAA,
                pass_ids::COMPOSITE,
                pass_ids::DEBUG_OVERLAY,
            ]
        );
    }

    #[test]
    fn test_disabled_effects_are_registered() {
        let config = PipelineConfig {
            enable_bloom: false,
            ..Default::default()
        };
        let graph = build_postprocess_graph(&config).unwrap();
        assert_eq!(graph.is_pass_enabled(pass_ids::BLOOM), Some(false));
        assert_eq!(graph.is_pass_enabled(pass_ids::DEBUG_OVERLAY), Some(false));
        assert_eq!(graph.is_pass_enabled(pass_ids::TONEMAPPING), Some(true));
    }
}
