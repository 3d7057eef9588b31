//! Physical render targets backing declared pass outputs

use crate::backend::attachment_sync::SyncedContext;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::resource::ResourceId;
use std::collections::HashMap;

struct PooledTarget {
    handle: RenderTargetHandle,
    desc: RenderTargetDescriptor,
}

impl PooledTarget {
    /// Same storage layout, ignoring extent and label
    fn layout_matches(&self, desc: &RenderTargetDescriptor) -> bool {
        self.desc.format == desc.format
            && self.desc.color_attachments == desc.color_attachments
            && self.desc.depth == desc.depth
            && self.desc.kind == desc.kind
    }
}

/// One render target per output resource, created on first use
#[derive(Default)]
pub struct TargetPool {
    targets: HashMap<ResourceId, PooledTarget>,
}

impl TargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target for `resource` matching `desc`, creating, resizing or
    /// recreating the backing storage as needed
    pub fn acquire(
        &mut self,
        gpu: &mut SyncedContext,
        resource: ResourceId,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        if let Some(existing) = self.targets.get_mut(&resource) {
            if existing.layout_matches(desc) {
                if existing.desc.width != desc.width || existing.desc.height != desc.height {
                    log::debug!(
                        "Resizing target for {:?} to {}x{}",
                        desc.label,
                        desc.width,
                        desc.height
                    );
                    gpu.resize_render_target(existing.handle, desc.width, desc.height)?;
                    existing.desc.width = desc.width;
                    existing.desc.height = desc.height;
                }
                return Ok(existing.handle);
            }
            if let Some(stale) = self.targets.remove(&resource) {
                gpu.destroy_render_target(stale.handle);
            }
        }

        let handle = gpu.create_render_target(desc)?;
        log::debug!("Created target {:?} for {:?}", handle, desc.label);
        self.targets.insert(
            resource,
            PooledTarget {
                handle,
                desc: desc.clone(),
            },
        );
        Ok(handle)
    }

    pub fn handle(&self, resource: ResourceId) -> Option<RenderTargetHandle> {
        self.targets.get(&resource).map(|t| t.handle)
    }

    /// Destroy targets whose resource no longer passes `keep`
    pub fn retain(&mut self, gpu: &mut SyncedContext, keep: impl Fn(ResourceId) -> bool) {
        let stale: Vec<ResourceId> = self
            .targets
            .keys()
            .copied()
            .filter(|&id| !keep(id))
            .collect();
        for id in stale {
            if let Some(target) = self.targets.remove(&id) {
                log::debug!("Releasing target {:?} for {:?}", target.handle, target.desc.label);
                gpu.destroy_render_target(target.handle);
            }
        }
    }

    pub fn release_all(&mut self, gpu: &mut SyncedContext) {
        for (_, target) in self.targets.drain() {
            gpu.destroy_render_target(target.handle);
        }
    }

    /// Drop every handle without destroying it (the context that owned them is gone)
    pub fn forget_all(&mut self) {
        self.targets.clear();
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{ContextCall, RecordingContext};

    #[test]
    fn test_acquire_reuses_and_resizes() {
        let ctx = RecordingContext::new();
        let probe = ctx.probe();
        let mut gpu = SyncedContext::new(Box::new(ctx));
        let mut pool = TargetPool::new();
        let id = ResourceId(0);

        let first = pool
            .acquire(&mut gpu, id, &RenderTargetDescriptor::new("ao", 64, 64))
            .unwrap();
        let again = pool
            .acquire(&mut gpu, id, &RenderTargetDescriptor::new("ao", 64, 64))
            .unwrap();
        assert_eq!(first, again);

        let resized = pool
            .acquire(&mut gpu, id, &RenderTargetDescriptor::new("ao", 32, 32))
            .unwrap();
        assert_eq!(first, resized);
        assert_eq!(gpu.render_target_info(first).unwrap().width, 32);
        assert_eq!(
            probe.count(|c| matches!(c, ContextCall::CreateRenderTarget { .. })),
            1
        );
    }

    #[test]
    fn test_layout_change_recreates() {
        let mut gpu = SyncedContext::new(Box::new(RecordingContext::new()));
        let mut pool = TargetPool::new();
        let id = ResourceId(0);
        let first = pool
            .acquire(&mut gpu, id, &RenderTargetDescriptor::new("scene", 8, 8))
            .unwrap();
        let second = pool
            .acquire(
                &mut gpu,
                id,
                &RenderTargetDescriptor::new("scene", 8, 8).with_color_attachments(3),
            )
            .unwrap();
        assert_ne!(first, second);
        assert!(gpu.render_target_info(first).is_none());
    }

    #[test]
    fn test_retain_destroys_unused() {
        let mut gpu = SyncedContext::new(Box::new(RecordingContext::new()));
        let mut pool = TargetPool::new();
        let kept = pool
            .acquire(&mut gpu, ResourceId(0), &RenderTargetDescriptor::new("a", 4, 4))
            .unwrap();
        let dropped = pool
            .acquire(&mut gpu, ResourceId(1), &RenderTargetDescriptor::new("b", 4, 4))
            .unwrap();
        pool.retain(&mut gpu, |id| id == ResourceId(0));
        assert_eq!(pool.len(), 1);
        assert!(gpu.render_target_info(kept).is_some());
        assert!(gpu.render_target_info(dropped).is_none());
    }
}
