//! Recording graphics context for headless runs and testing.
//!
//! This context doesn't talk to a GPU. It keeps just enough state to behave
//! like an imperative renderer (bound target, per-target draw-buffer lists,
//! scene background/environment slots) and records every call into a shared
//! log that stays readable after the context is boxed and handed to a
//! [`SyncedContext`](crate::backend::SyncedContext).
//!
//! Host quirks of the wrapped library can be reproduced:
//! - shadow-map sub-renders inside [`GraphicsContext::render_scene`]
//!   ([`ShadowBehavior`])
//! - cube captures that leave the cube target bound
//! - context loss ([`RecordingProbe::set_available`])

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::traits::*;
use crate::backend::types::*;

/// One recorded context call
#[derive(Debug, Clone, PartialEq)]
pub enum ContextCall {
    CreateRenderTarget {
        target: RenderTargetHandle,
        desc: RenderTargetDescriptor,
    },
    ResizeRenderTarget {
        target: RenderTargetHandle,
        width: u32,
        height: u32,
    },
    DestroyRenderTarget(RenderTargetHandle),
    BindRenderTarget(Option<RenderTargetHandle>),
    SetDrawBuffers(Vec<DrawBuffer>),
    Clear {
        target: Option<RenderTargetHandle>,
        color: [f32; 4],
    },
    DrawFullscreen {
        label: String,
        program: String,
        target: Option<RenderTargetHandle>,
        inputs: Vec<Option<TextureHandle>>,
        uniforms: Vec<u8>,
        /// Whether the draw-buffer list matched the bound target
        consistent: bool,
    },
    RenderScene {
        request: SceneRenderRequest,
        target: Option<RenderTargetHandle>,
        consistent: bool,
    },
    RenderCube {
        request: CubeRenderRequest,
        /// Scene background at capture time
        background: Option<TextureHandle>,
    },
    SetSceneBackground {
        scene: SceneHandle,
        background: Option<TextureHandle>,
    },
    SetSceneEnvironment {
        scene: SceneHandle,
        environment: Option<TextureHandle>,
    },
}

/// Shadow-map sub-render performed by the host inside `render_scene`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowBehavior {
    /// No internal sub-render
    #[default]
    None,
    /// Renders into an internal shadow target, then rebinds the caller's target
    Restore,
    /// Renders into an internal shadow target and leaves it bound
    LeaveShadowTargetBound,
}

/// State shared between a [`RecordingContext`] and its probes
#[derive(Debug)]
pub struct RecordingState {
    pub calls: Vec<ContextCall>,
    pub available: bool,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            available: true,
        }
    }
}

/// Read/control access to a recording context after it has been moved
#[derive(Debug, Clone)]
pub struct RecordingProbe {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingProbe {
    /// Snapshot of every recorded call
    pub fn calls(&self) -> Vec<ContextCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.state.lock().calls.clear();
    }

    /// Simulate context loss (`false`) or a working context (`true`)
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Attachment counts configured by each `set_draw_buffers` call, in order
    pub fn draw_buffer_counts(&self) -> Vec<u32> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ContextCall::SetDrawBuffers(buffers) => Some(attachment_count_of(buffers)),
                _ => None,
            })
            .collect()
    }

    /// Targets passed to `bind_render_target`, in order
    pub fn binds(&self) -> Vec<Option<RenderTargetHandle>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ContextCall::BindRenderTarget(target) => Some(*target),
                _ => None,
            })
            .collect()
    }

    /// Labels of fullscreen draws, in order
    pub fn fullscreen_labels(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ContextCall::DrawFullscreen { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    /// `true` when every draw and scene render saw a matching draw-buffer list
    pub fn all_draws_consistent(&self) -> bool {
        self.state.lock().calls.iter().all(|call| match call {
            ContextCall::DrawFullscreen { consistent, .. }
            | ContextCall::RenderScene { consistent, .. } => *consistent,
            _ => true,
        })
    }

    pub fn count(&self, predicate: impl Fn(&ContextCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }
}

/// Headless graphics context recording every call
pub struct RecordingContext {
    state: Arc<Mutex<RecordingState>>,
    next_id: u64,
    targets: HashMap<RenderTargetHandle, RenderTargetInfo>,
    bound: Option<RenderTargetHandle>,
    /// Draw-buffer lists are per-target state, as on the wrapped API
    draw_buffers: HashMap<Option<RenderTargetHandle>, Vec<DrawBuffer>>,
    backgrounds: HashMap<SceneHandle, Option<TextureHandle>>,
    environments: HashMap<SceneHandle, Option<TextureHandle>>,
    shadow_behavior: ShadowBehavior,
    shadow_target: Option<RenderTargetHandle>,
    cube_restores_binding: bool,
    max_color_attachments: u32,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState::default())),
            next_id: 1,
            targets: HashMap::new(),
            bound: None,
            draw_buffers: HashMap::new(),
            backgrounds: HashMap::new(),
            environments: HashMap::new(),
            shadow_behavior: ShadowBehavior::None,
            shadow_target: None,
            cube_restores_binding: false,
            max_color_attachments: 8,
        }
    }

    pub fn with_shadow_behavior(mut self, behavior: ShadowBehavior) -> Self {
        self.shadow_behavior = behavior;
        self
    }

    /// Rebind the caller's target after a cube capture (default: leave the cube bound)
    pub fn with_cube_restore(mut self, restores: bool) -> Self {
        self.cube_restores_binding = restores;
        self
    }

    pub fn with_max_color_attachments(mut self, max: u32) -> Self {
        self.max_color_attachments = max;
        self
    }

    /// Handle for inspecting the log after this context is moved
    pub fn probe(&self) -> RecordingProbe {
        RecordingProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// Current background of a scene, as seen by the host
    pub fn background_of(&self, scene: SceneHandle) -> Option<TextureHandle> {
        self.backgrounds.get(&scene).copied().flatten()
    }

    pub fn environment_of(&self, scene: SceneHandle) -> Option<TextureHandle> {
        self.environments.get(&scene).copied().flatten()
    }

    fn record(&self, call: ContextCall) {
        log::trace!("RecordingContext: {:?}", call);
        self.state.lock().calls.push(call);
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn default_draw_buffers(target: Option<RenderTargetHandle>) -> Vec<DrawBuffer> {
        match target {
            None => vec![DrawBuffer::Back],
            Some(_) => vec![DrawBuffer::ColorAttachment(0)],
        }
    }

    fn active_draw_buffers(&self) -> Vec<DrawBuffer> {
        self.draw_buffers
            .get(&self.bound)
            .cloned()
            .unwrap_or_else(|| Self::default_draw_buffers(self.bound))
    }

    /// Whether the bound target's draw-buffer list matches its attachment count
    fn is_consistent(&self) -> bool {
        let expected = match self.bound {
            None => 0,
            Some(target) => match self.targets.get(&target) {
                Some(info) => info.color_attachment_count(),
                None => return false,
            },
        };
        attachment_count_of(&self.active_draw_buffers()) == expected
    }

    fn internal_shadow_render(&mut self) {
        let shadow = match self.shadow_target {
            Some(target) => target,
            None => {
                let target = RenderTargetHandle(self.allocate_id());
                let depth = TextureHandle(self.allocate_id());
                self.targets.insert(
                    target,
                    RenderTargetInfo {
                        width: 1024,
                        height: 1024,
                        format: TextureFormat::Depth32Float,
                        kind: TargetKind::Texture2d,
                        color_textures: Vec::new(),
                        depth_texture: Some(depth),
                    },
                );
                // Depth-only: no color outputs
                self.draw_buffers.insert(Some(target), vec![DrawBuffer::None]);
                self.shadow_target = Some(target);
                target
            }
        };

        let previous = self.bound;
        self.bound = Some(shadow);
        if self.shadow_behavior == ShadowBehavior::Restore {
            self.bound = previous;
        }
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for RecordingContext {
    fn name(&self) -> &str {
        "Recording"
    }

    fn is_available(&self) -> bool {
        self.state.lock().available
    }

    fn max_color_attachments(&self) -> u32 {
        self.max_color_attachments
    }

    fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        if !self.is_available() {
            return Err(BackendError::ContextUnavailable);
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::InvalidDescriptor(format!(
                "{:?} has zero extent",
                desc.label
            )));
        }

        let target = RenderTargetHandle(self.allocate_id());
        let color_textures = (0..desc.color_attachments)
            .map(|_| TextureHandle(self.allocate_id()))
            .collect();
        let depth_texture = desc.depth.then(|| TextureHandle(self.allocate_id()));
        self.targets.insert(
            target,
            RenderTargetInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                kind: desc.kind,
                color_textures,
                depth_texture,
            },
        );
        self.record(ContextCall::CreateRenderTarget {
            target,
            desc: desc.clone(),
        });
        Ok(target)
    }

    fn resize_render_target(
        &mut self,
        target: RenderTargetHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        let info = self
            .targets
            .get_mut(&target)
            .ok_or(BackendError::UnknownRenderTarget(target))?;
        info.width = width;
        info.height = height;
        self.record(ContextCall::ResizeRenderTarget {
            target,
            width,
            height,
        });
        Ok(())
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) {
        if self.targets.remove(&target).is_some() {
            self.draw_buffers.remove(&Some(target));
            if self.bound == Some(target) {
                self.bound = None;
            }
            self.record(ContextCall::DestroyRenderTarget(target));
        }
    }

    fn render_target_info(&self, target: RenderTargetHandle) -> Option<RenderTargetInfo> {
        self.targets.get(&target).cloned()
    }

    fn bound_render_target(&self) -> Option<RenderTargetHandle> {
        self.bound
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) {
        self.bound = target;
        self.record(ContextCall::BindRenderTarget(target));
    }

    fn set_draw_buffers(&mut self, buffers: &[DrawBuffer]) {
        self.draw_buffers.insert(self.bound, buffers.to_vec());
        self.record(ContextCall::SetDrawBuffers(buffers.to_vec()));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.record(ContextCall::Clear {
            target: self.bound,
            color,
        });
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) {
        let consistent = self.is_consistent();
        self.record(ContextCall::DrawFullscreen {
            label: draw.label.to_string(),
            program: draw.program.to_string(),
            target: self.bound,
            inputs: draw.inputs.to_vec(),
            uniforms: draw.uniforms.to_vec(),
            consistent,
        });
    }

    fn render_scene(&mut self, request: &SceneRenderRequest) {
        let target = self.bound;
        let consistent = self.is_consistent();
        if self.shadow_behavior != ShadowBehavior::None {
            self.internal_shadow_render();
        }
        self.record(ContextCall::RenderScene {
            request: *request,
            target,
            consistent,
        });
    }

    fn render_cube(&mut self, request: &CubeRenderRequest) {
        let previous = self.bound;
        // One internal bind per face
        self.bound = Some(request.target);
        if self.cube_restores_binding {
            self.bound = previous;
        }
        self.record(ContextCall::RenderCube {
            request: *request,
            background: self.background_of(request.scene),
        });
    }

    fn scene_background(&self, scene: SceneHandle) -> Option<TextureHandle> {
        self.background_of(scene)
    }

    fn set_scene_background(&mut self, scene: SceneHandle, background: Option<TextureHandle>) {
        self.backgrounds.insert(scene, background);
        self.record(ContextCall::SetSceneBackground { scene, background });
    }

    fn set_scene_environment(&mut self, scene: SceneHandle, environment: Option<TextureHandle>) {
        self.environments.insert(scene, environment);
        self.record(ContextCall::SetSceneEnvironment { scene, environment });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_target_allocates_attachments() {
        let mut ctx = RecordingContext::new();
        let target = ctx
            .create_render_target(
                &RenderTargetDescriptor::new("mrt", 64, 64)
                    .with_color_attachments(3)
                    .with_depth(true),
            )
            .unwrap();
        let info = ctx.render_target_info(target).unwrap();
        assert_eq!(info.color_attachment_count(), 3);
        assert!(info.depth_texture.is_some());
    }

    #[test]
    fn test_zero_extent_rejected() {
        let mut ctx = RecordingContext::new();
        let result = ctx.create_render_target(&RenderTargetDescriptor::new("empty", 0, 16));
        assert!(matches!(result, Err(BackendError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_probe_survives_boxing() {
        let ctx = RecordingContext::new();
        let probe = ctx.probe();
        let mut boxed: Box<dyn GraphicsContext> = Box::new(ctx);
        boxed.bind_render_target(None);
        assert_eq!(probe.binds(), vec![None]);
    }

    #[test]
    fn test_unsynchronized_mrt_draw_is_inconsistent() {
        let mut ctx = RecordingContext::new();
        let mrt = ctx
            .create_render_target(&RenderTargetDescriptor::new("mrt", 8, 8).with_color_attachments(2))
            .unwrap();
        ctx.bind_render_target(Some(mrt));
        ctx.draw_fullscreen(&FullscreenDraw {
            label: "draw",
            program: "test",
            inputs: &[],
            uniforms: &[],
        });
        assert!(!ctx.probe().all_draws_consistent());
    }

    #[test]
    fn test_shadow_subrender_leaves_target_bound() {
        let mut ctx =
            RecordingContext::new().with_shadow_behavior(ShadowBehavior::LeaveShadowTargetBound);
        ctx.bind_render_target(None);
        ctx.render_scene(&SceneRenderRequest {
            scene: SceneHandle(1),
            camera: CameraHandle(1),
            material_override: None,
        });
        assert!(ctx.bound_render_target().is_some());
    }

    #[test]
    fn test_context_loss_blocks_creation() {
        let mut ctx = RecordingContext::new();
        ctx.probe().set_available(false);
        let result = ctx.create_render_target(&RenderTargetDescriptor::new("lost", 4, 4));
        assert_eq!(result, Err(BackendError::ContextUnavailable));
    }
}
