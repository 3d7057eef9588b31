//! Attachment state synchronization
//!
//! [`SyncedContext`] wraps a [`GraphicsContext`] and keeps the context's
//! draw-buffer list consistent with whatever render target is bound. Every
//! bind goes through the wrapper; the list is reconfigured only when the
//! `(attachment count, target identity)` pair changes.
//!
//! Host scene renders may bind internal targets (shadow maps, cube faces) and
//! only partially restore the previous binding. Those calls are wrapped in a
//! render scope: when the outermost scope exits, the actually bound target is
//! compared with the tracked one and a resync is forced on mismatch.
//!
//! After a context loss every operation is a no-op until
//! [`SyncedContext::reinitialize`] is called with the new context.

use crate::backend::traits::*;
use crate::backend::types::*;

/// Tracked binding of the wrapped context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackedBinding {
    /// Nothing is known; the next bind always reconfigures
    #[default]
    Unknown,
    Known {
        /// `None` is the display surface
        target: Option<RenderTargetHandle>,
        attachment_count: u32,
    },
}

impl TrackedBinding {
    pub fn attachment_count(&self) -> Option<u32> {
        match self {
            TrackedBinding::Unknown => None,
            TrackedBinding::Known {
                attachment_count, ..
            } => Some(*attachment_count),
        }
    }

    pub fn target(&self) -> Option<Option<RenderTargetHandle>> {
        match self {
            TrackedBinding::Unknown => None,
            TrackedBinding::Known { target, .. } => Some(*target),
        }
    }
}

/// Synchronizer state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachmentState {
    pub binding: TrackedBinding,
    /// Nesting depth of host render calls
    pub render_depth: u32,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub binds: u64,
    pub reconfigurations: u64,
    pub forced_resyncs: u64,
}

/// Graphics context decorator that keeps the draw-buffer list in sync
pub struct SyncedContext {
    inner: Box<dyn GraphicsContext>,
    state: AttachmentState,
    lost: bool,
    stats: SyncStats,
}

impl SyncedContext {
    pub fn new(inner: Box<dyn GraphicsContext>) -> Self {
        Self {
            inner,
            state: AttachmentState::default(),
            lost: false,
            stats: SyncStats::default(),
        }
    }

    pub fn inner(&self) -> &dyn GraphicsContext {
        self.inner.as_ref()
    }

    pub fn state(&self) -> AttachmentState {
        self.state
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// `true` between [`invalidate_for_context_loss`](Self::invalidate_for_context_loss)
    /// and [`reinitialize`](Self::reinitialize)
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    fn usable(&self) -> bool {
        !self.lost && self.inner.is_available()
    }

    /// Color attachment count of a target, clamped to the device maximum
    fn attachment_count(&self, target: Option<RenderTargetHandle>) -> Option<u32> {
        let Some(target) = target else {
            return Some(0);
        };
        let info = self.inner.render_target_info(target)?;
        let count = info.color_attachment_count();
        let max = self.inner.max_color_attachments();
        if count > max {
            log::warn!(
                "Render target {:?} has {} color attachments, clamping to {}",
                target,
                count,
                max
            );
            Some(max)
        } else {
            Some(count)
        }
    }

    /// Bring the draw-buffer list in line with `target`, if it differs
    fn reconcile(&mut self, target: Option<RenderTargetHandle>) {
        let Some(count) = self.attachment_count(target) else {
            log::warn!("Bound render target {:?} is unknown to the context", target);
            self.state.binding = TrackedBinding::Unknown;
            return;
        };

        let wanted = TrackedBinding::Known {
            target,
            attachment_count: count,
        };
        if self.state.binding == wanted {
            return;
        }

        let buffers = match (target, count) {
            (Some(_), 0) => depth_only_draw_buffers(),
            _ => draw_buffers_for(count),
        };
        log::trace!(
            "Reconfiguring draw buffers for {:?}: {} attachment(s)",
            target,
            count
        );
        self.inner.set_draw_buffers(&buffers);
        self.state.binding = wanted;
        self.stats.reconfigurations += 1;
    }

    /// Forget the tracked state and resync against the actually bound target.
    ///
    /// Call after any code path that changes the context's binding or
    /// draw-buffer list without going through this wrapper.
    pub fn force_sync(&mut self) {
        if !self.usable() {
            return;
        }
        self.state.binding = TrackedBinding::Unknown;
        self.stats.forced_resyncs += 1;
        let actual = self.inner.bound_render_target();
        self.reconcile(actual);
    }

    /// Enter a host render call
    pub fn enter_render(&mut self) {
        if !self.usable() {
            return;
        }
        self.state.render_depth += 1;
    }

    /// Leave a host render call; the outermost exit validates the binding
    pub fn exit_render(&mut self) {
        if !self.usable() {
            return;
        }
        if self.state.render_depth == 0 {
            log::warn!("Unbalanced exit_render on {}", self.inner.name());
            return;
        }
        self.state.render_depth -= 1;
        if self.state.render_depth > 0 {
            return;
        }

        // Tracked target equals the target bound when the scope began,
        // unless the scope itself rebound through this wrapper.
        let actual = self.inner.bound_render_target();
        if self.state.binding.target() != Some(actual) {
            log::debug!(
                "Host render left {:?} bound (tracked {:?}), forcing resync",
                actual,
                self.state.binding
            );
            self.force_sync();
        }
    }

    /// Run `f` inside a render scope
    pub fn with_render_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.enter_render();
        let result = f(self);
        self.exit_render();
        result
    }

    /// Mark the wrapped context as lost and reset tracked state to unknown
    pub fn invalidate_for_context_loss(&mut self) {
        log::info!("Graphics context '{}' lost", self.inner.name());
        self.lost = true;
        self.state = AttachmentState::default();
    }

    /// Replace the wrapped context after a loss.
    ///
    /// Nothing is assumed about the new context's configuration.
    pub fn reinitialize(&mut self, inner: Box<dyn GraphicsContext>) {
        log::info!("Reinitializing synchronizer with context '{}'", inner.name());
        self.inner = inner;
        self.lost = false;
        self.state = AttachmentState::default();
        self.force_sync();
    }
}

impl GraphicsContext for SyncedContext {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_available(&self) -> bool {
        self.usable()
    }

    fn max_color_attachments(&self) -> u32 {
        self.inner.max_color_attachments()
    }

    fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        if !self.usable() {
            return Err(BackendError::ContextUnavailable);
        }
        self.inner.create_render_target(desc)
    }

    fn resize_render_target(
        &mut self,
        target: RenderTargetHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        if !self.usable() {
            return Err(BackendError::ContextUnavailable);
        }
        self.inner.resize_render_target(target, width, height)
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) {
        if !self.usable() {
            return;
        }
        if self.state.binding.target() == Some(Some(target)) {
            self.state.binding = TrackedBinding::Unknown;
        }
        self.inner.destroy_render_target(target);
    }

    fn render_target_info(&self, target: RenderTargetHandle) -> Option<RenderTargetInfo> {
        if !self.usable() {
            return None;
        }
        self.inner.render_target_info(target)
    }

    fn bound_render_target(&self) -> Option<RenderTargetHandle> {
        self.inner.bound_render_target()
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) {
        if !self.usable() {
            return;
        }
        self.stats.binds += 1;
        self.inner.bind_render_target(target);
        self.reconcile(target);
    }

    fn set_draw_buffers(&mut self, buffers: &[DrawBuffer]) {
        if !self.usable() {
            return;
        }
        // Custom list: the next bind must reconfigure
        self.state.binding = TrackedBinding::Unknown;
        self.inner.set_draw_buffers(buffers);
    }

    fn clear(&mut self, color: [f32; 4]) {
        if self.usable() {
            self.inner.clear(color);
        }
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) {
        if self.usable() {
            self.inner.draw_fullscreen(draw);
        }
    }

    fn render_scene(&mut self, request: &SceneRenderRequest) {
        if !self.usable() {
            return;
        }
        self.enter_render();
        self.inner.render_scene(request);
        self.exit_render();
    }

    fn render_cube(&mut self, request: &CubeRenderRequest) {
        if !self.usable() {
            return;
        }
        self.enter_render();
        self.inner.render_cube(request);
        self.exit_render();
    }

    fn scene_background(&self, scene: SceneHandle) -> Option<TextureHandle> {
        if !self.usable() {
            return None;
        }
        self.inner.scene_background(scene)
    }

    fn set_scene_background(&mut self, scene: SceneHandle, background: Option<TextureHandle>) {
        if self.usable() {
            self.inner.set_scene_background(scene, background);
        }
    }

    fn set_scene_environment(&mut self, scene: SceneHandle, environment: Option<TextureHandle>) {
        if self.usable() {
            self.inner.set_scene_environment(scene, environment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{RecordingContext, RecordingProbe, ShadowBehavior};

    fn synced(ctx: RecordingContext) -> (SyncedContext, RecordingProbe) {
        let probe = ctx.probe();
        (SyncedContext::new(Box::new(ctx)), probe)
    }

    fn target(gpu: &mut SyncedContext, attachments: u32) -> RenderTargetHandle {
        gpu.create_render_target(
            &RenderTargetDescriptor::new("t", 16, 16).with_color_attachments(attachments),
        )
        .unwrap()
    }

    fn scene_request() -> SceneRenderRequest {
        SceneRenderRequest {
            scene: SceneHandle(1),
            camera: CameraHandle(1),
            material_override: None,
        }
    }

    #[test]
    fn test_rebinding_same_target_is_free() {
        let (mut gpu, probe) = synced(RecordingContext::new());
        let mrt = target(&mut gpu, 3);
        gpu.bind_render_target(Some(mrt));
        gpu.bind_render_target(Some(mrt));
        assert_eq!(probe.draw_buffer_counts(), vec![3]);
        assert_eq!(gpu.stats().binds, 2);
    }

    #[test]
    fn test_equal_count_different_target_reconfigures() {
        let (mut gpu, probe) = synced(RecordingContext::new());
        let a = target(&mut gpu, 2);
        let b = target(&mut gpu, 2);
        gpu.bind_render_target(Some(a));
        gpu.bind_render_target(Some(b));
        assert_eq!(probe.draw_buffer_counts(), vec![2, 2]);
    }

    #[test]
    fn test_surface_after_mrt_resets_list() {
        let (mut gpu, probe) = synced(RecordingContext::new());
        let mrt = target(&mut gpu, 3);
        gpu.bind_render_target(Some(mrt));
        gpu.bind_render_target(None);
        assert_eq!(probe.draw_buffer_counts(), vec![3, 0]);
        assert_eq!(
            gpu.state().binding,
            TrackedBinding::Known {
                target: None,
                attachment_count: 0
            }
        );
    }

    #[test]
    fn test_attachment_count_clamped() {
        let (mut gpu, probe) = synced(RecordingContext::new().with_max_color_attachments(4));
        let wide = target(&mut gpu, 6);
        gpu.bind_render_target(Some(wide));
        assert_eq!(probe.draw_buffer_counts(), vec![4]);
    }

    #[test]
    fn test_shadow_subrender_forces_resync() {
        let (mut gpu, probe) =
            synced(RecordingContext::new().with_shadow_behavior(ShadowBehavior::LeaveShadowTargetBound));
        gpu.bind_render_target(None);
        gpu.render_scene(&scene_request());

        assert_eq!(gpu.stats().forced_resyncs, 1);
        let shadow = gpu.bound_render_target();
        assert!(shadow.is_some());
        assert_eq!(gpu.state().binding.target(), Some(shadow));
        assert_eq!(probe.draw_buffer_counts(), vec![0, 0]);
    }

    #[test]
    fn test_restoring_host_render_needs_no_resync() {
        let (mut gpu, _probe) =
            synced(RecordingContext::new().with_shadow_behavior(ShadowBehavior::Restore));
        gpu.bind_render_target(None);
        gpu.render_scene(&scene_request());
        assert_eq!(gpu.stats().forced_resyncs, 0);
    }

    #[test]
    fn test_nested_scopes_validate_once() {
        let (mut gpu, _probe) = synced(RecordingContext::new());
        let cube = gpu
            .create_render_target(&RenderTargetDescriptor::cube("env", 32))
            .unwrap();
        gpu.bind_render_target(None);
        gpu.with_render_scope(|gpu| {
            assert_eq!(gpu.state().render_depth, 1);
            gpu.render_cube(&CubeRenderRequest {
                scene: SceneHandle(1),
                target: cube,
                position: glam::Vec3::ZERO,
                near: 0.1,
                far: 100.0,
            });
            // Inner scope exit does not validate
            assert_eq!(gpu.stats().forced_resyncs, 0);
        });
        assert_eq!(gpu.state().render_depth, 0);
        assert_eq!(gpu.stats().forced_resyncs, 1);
        assert_eq!(gpu.state().binding.target(), Some(Some(cube)));
    }

    #[test]
    fn test_unavailable_context_is_noop() {
        let (mut gpu, probe) = synced(RecordingContext::new());
        probe.set_available(false);
        gpu.bind_render_target(None);
        gpu.force_sync();
        gpu.render_scene(&scene_request());
        assert!(probe.calls().is_empty());
        assert_eq!(gpu.stats(), SyncStats::default());
    }

    #[test]
    fn test_context_loss_and_reinitialize() {
        let (mut gpu, _old_probe) = synced(RecordingContext::new());
        let mrt = target(&mut gpu, 3);
        gpu.bind_render_target(Some(mrt));

        gpu.invalidate_for_context_loss();
        assert!(gpu.is_lost());
        assert_eq!(gpu.state().binding, TrackedBinding::Unknown);
        gpu.bind_render_target(None);
        assert_eq!(gpu.stats().binds, 1);

        let fresh = RecordingContext::new();
        let probe = fresh.probe();
        gpu.reinitialize(Box::new(fresh));
        assert!(!gpu.is_lost());
        // Resynced against the new context's surface
        assert_eq!(probe.draw_buffer_counts(), vec![0]);
    }

    #[test]
    fn test_external_draw_buffer_change_invalidates() {
        let (mut gpu, probe) = synced(RecordingContext::new());
        gpu.bind_render_target(None);
        gpu.set_draw_buffers(&[DrawBuffer::None]);
        gpu.bind_render_target(None);
        assert_eq!(probe.draw_buffer_counts(), vec![0, 0, 0]);
    }
}
