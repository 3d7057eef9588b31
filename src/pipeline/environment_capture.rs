//! Environment capture
//!
//! Renders the surroundings of a probe position into a cube map and exports
//! it as the scene's background and image-based lighting environment. The
//! cube lives in a [`TemporalResource`], so the slot being rendered is never
//! the one the rest of the frame samples through the exported state.

use crate::backend::attachment_sync::SyncedContext;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::pipeline::{pass_ids, EnvironmentCaptureConfig, PRIORITY_FIRST};
use crate::render_graph::context::PassExecuteContext;
use crate::render_graph::error::GraphResult;
use crate::render_graph::export::{slots, ExportValue};
use crate::render_graph::pass::*;
use crate::render_graph::temporal::TemporalResource;
use glam::Vec3;
use std::any::Any;

pub struct EnvironmentCapturePass {
    config: EnvironmentCaptureConfig,
    enabled: bool,
    position: Vec3,
    history: Option<TemporalResource<RenderTargetHandle>>,
    /// Slots replaced after a resolution change, with the frame they were retired on
    retired: Vec<(RenderTargetHandle, u64)>,
    last_capture: Option<u64>,
}

impl EnvironmentCapturePass {
    pub fn new(config: EnvironmentCaptureConfig, enabled: bool) -> Self {
        Self {
            config,
            enabled,
            position: Vec3::ZERO,
            history: None,
            retired: Vec::new(),
            last_capture: None,
        }
    }

    pub fn config(&self) -> &EnvironmentCaptureConfig {
        &self.config
    }

    pub fn history(&self) -> Option<&TemporalResource<RenderTargetHandle>> {
        self.history.as_ref()
    }

    /// Probe position the cube is rendered from
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Takes effect on the next capture; old slots stay alive until no
    /// exported state can reference them
    pub fn set_resolution(&mut self, resolution: u32) {
        if resolution != self.config.resolution {
            self.config.resolution = resolution;
            self.last_capture = None;
        }
    }

    pub fn set_interval(&mut self, interval: u32) {
        self.config.interval = interval;
    }

    fn is_due(&self, frame_index: u64) -> bool {
        let interval = u64::from(self.config.interval.max(1));
        match self.last_capture {
            None => true,
            Some(last) => frame_index >= last + interval,
        }
    }

    fn create_slots(&self, gpu: &mut SyncedContext) -> GraphResult<Vec<RenderTargetHandle>> {
        let mut slots = Vec::with_capacity(self.config.history_length);
        for i in 0..self.config.history_length {
            let desc = RenderTargetDescriptor::cube(
                &format!("environment_capture_{}", i),
                self.config.resolution,
            )
            .with_depth(true);
            match gpu.create_render_target(&desc) {
                Ok(handle) => slots.push(handle),
                Err(e) => {
                    for handle in slots {
                        gpu.destroy_render_target(handle);
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(slots)
    }

    /// Make sure the ring exists at the configured resolution
    fn ensure_history(&mut self, gpu: &mut SyncedContext, frame_index: u64) -> GraphResult<()> {
        let current_resolution = match &self.history {
            Some(history) => gpu
                .render_target_info(history.write())
                .map(|info| info.width),
            None => None,
        };
        if current_resolution == Some(self.config.resolution) {
            return Ok(());
        }

        let slots = self.create_slots(gpu)?;
        match self.history.as_mut() {
            Some(history) if current_resolution.is_some() => {
                log::debug!(
                    "Environment capture resolution changed to {}",
                    self.config.resolution
                );
                let old = history.replace_slots(slots)?;
                self.retired
                    .extend(old.into_iter().map(|handle| (handle, frame_index)));
            }
            _ => {
                self.history = Some(TemporalResource::new(slots)?);
            }
        }
        Ok(())
    }

    fn release_retired(&mut self, gpu: &mut SyncedContext, frame_index: u64) {
        let (stale, keep): (Vec<_>, Vec<_>) = self
            .retired
            .drain(..)
            .partition(|&(_, retired_at)| frame_index > retired_at);
        for (handle, _) in stale {
            gpu.destroy_render_target(handle);
        }
        self.retired = keep;
    }
}

impl RenderPass for EnvironmentCapturePass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor::new(pass_ids::ENVIRONMENT_CAPTURE)
            .with_name("Environment Capture")
            .priority(PRIORITY_FIRST)
            .enabled(self.enabled)
    }

    fn execute(&mut self, ctx: &mut PassExecuteContext<'_>) -> PassStatus {
        let frame = *ctx.frame();
        self.release_retired(ctx.gpu(), frame.frame_index);

        if !self.is_due(frame.frame_index) {
            return PassStatus::Declined;
        }

        if let Err(e) = self.ensure_history(ctx.gpu(), frame.frame_index) {
            log::error!("Environment capture unavailable: {}", e);
            return PassStatus::Declined;
        }
        let Some(target) = self.history.as_ref().map(|h| h.write()) else {
            return PassStatus::Declined;
        };

        let gpu = ctx.gpu();
        // Sampling the background while rendering the cube would feed back
        let saved_background = gpu.scene_background(frame.scene);
        gpu.set_scene_background(frame.scene, None);
        gpu.render_cube(&CubeRenderRequest {
            scene: frame.scene,
            target,
            position: self.position,
            near: self.config.near,
            far: self.config.far,
        });
        gpu.set_scene_background(frame.scene, saved_background);

        let texture = gpu
            .render_target_info(target)
            .and_then(|info| info.color_textures.first().copied());
        let Some(texture) = texture else {
            log::warn!("Environment capture target {:?} has no color texture", target);
            return PassStatus::Declined;
        };

        ctx.queue_export(slots::SCENE_ENVIRONMENT, ExportValue::Texture(texture));
        ctx.queue_export(slots::SCENE_BACKGROUND, ExportValue::Texture(texture));
        self.last_capture = Some(frame.frame_index);
        PassStatus::Rendered
    }

    fn post_frame(&mut self) {
        if let Some(history) = self.history.as_mut() {
            history.advance_frame();
        }
    }

    fn dispose(&mut self, gpu: &mut SyncedContext) {
        if let Some(history) = self.history.take() {
            for handle in history.dispose() {
                gpu.destroy_render_target(handle);
            }
        }
        for (handle, _) in self.retired.drain(..) {
            gpu.destroy_render_target(handle);
        }
        self.last_capture = None;
    }

    fn invalidate_for_context_loss(&mut self) {
        self.history = None;
        self.retired.clear();
        self.last_capture = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
