//! Render graph executor
//!
//! Drives one frame: bind imports, run passes in compiled order, flush the
//! export queue, then let passes that rendered advance their history.

use crate::backend::attachment_sync::SyncedContext;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::compiler::CompiledGraph;
use crate::render_graph::context::{FrameInfo, PassExecuteContext};
use crate::render_graph::export::{ExportQueue, ExternalState};
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use crate::render_graph::resource_table::{Binding, ResourceTable};
use crate::render_graph::target_pool::TargetPool;
use std::collections::HashMap;

/// Why a pass did not run this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    /// A required input was not produced this frame
    MissingInput(String),
    /// The backing target for an output could not be created
    TargetUnavailable(String),
    /// The pass returned [`PassStatus::Declined`]
    PassDeclined,
}

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Passes that rendered, in execution order
    pub executed: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    pub exports_applied: usize,
    /// The graphics context was unavailable; nothing ran
    pub context_unavailable: bool,
}

impl FrameReport {
    pub fn was_executed(&self, pass: &str) -> bool {
        self.executed.iter().any(|p| p == pass)
    }

    pub fn skip_reason(&self, pass: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|(p, _)| p == pass)
            .map(|(_, reason)| reason)
    }
}

/// Executor for running the compiled render graph
#[derive(Default)]
pub struct RenderGraphExecutor {
    table: ResourceTable,
    pool: TargetPool,
    exports: ExportQueue,
}

impl RenderGraphExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &ResourceTable {
        &self.table
    }

    pub fn pool(&self) -> &TargetPool {
        &self.pool
    }

    pub(crate) fn pool_mut(&mut self) -> &mut TargetPool {
        &mut self.pool
    }

    /// Execute one frame
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &mut self,
        passes: &mut [Box<dyn RenderPass>],
        nodes: &[PassNode],
        compiled: &CompiledGraph,
        registry: &ResourceRegistry,
        imports: &HashMap<ResourceId, TextureHandle>,
        gpu: &mut SyncedContext,
        frame: &FrameInfo,
        external: &mut ExternalState,
    ) -> FrameReport {
        let mut report = FrameReport {
            frame_index: frame.frame_index,
            ..Default::default()
        };

        if !gpu.is_available() {
            log::debug!("Frame {} skipped: graphics context unavailable", frame.frame_index);
            report.context_unavailable = true;
            return report;
        }

        self.table.clear();
        self.exports.clear();
        for (&resource, &texture) in imports {
            self.table.bind(resource, Binding::Texture(texture));
        }

        let mut rendered = Vec::new();
        'passes: for &index in &compiled.pass_order {
            let node = &nodes[index];
            let id = node.id();

            if !node.descriptor.enabled {
                self.skip(node, SkipReason::Disabled, registry, &mut report);
                continue;
            }

            if let Some(missing) = node
                .inputs
                .iter()
                .find(|i| !i.optional && !self.table.is_bound(i.resource))
            {
                let name = registry.name(missing.resource).unwrap_or_default().to_string();
                log::warn!("Pass '{}' skipped: input '{}' is missing", id, name);
                self.skip(node, SkipReason::MissingInput(name), registry, &mut report);
                continue;
            }

            for output in &node.outputs {
                let name = registry.name(output.resource).unwrap_or_default();
                let desc = output.desc.to_target_descriptor(name, frame.viewport_size());
                let bound = self
                    .pool
                    .acquire(gpu, output.resource, &desc)
                    .and_then(|handle| {
                        gpu.render_target_info(handle)
                            .map(|info| (handle, info))
                            .ok_or(BackendError::UnknownRenderTarget(handle))
                    });
                match bound {
                    Ok((handle, info)) => {
                        self.table.bind(output.resource, Binding::Target { handle, info });
                    }
                    Err(e) => {
                        log::error!("Pass '{}': target for '{}' unavailable: {}", id, name, e);
                        let reason = SkipReason::TargetUnavailable(name.to_string());
                        self.skip(node, reason, registry, &mut report);
                        continue 'passes;
                    }
                }
            }

            // Exports of a declined pass are dropped
            let mut staged = ExportQueue::new();
            let status = {
                let mut ctx = PassExecuteContext {
                    gpu: &mut *gpu,
                    frame,
                    external: &*external,
                    table: &self.table,
                    registry,
                    exports: &mut staged,
                    node,
                };
                passes[index].execute(&mut ctx)
            };

            match status {
                PassStatus::Rendered => {
                    self.exports.merge(staged);
                    report.executed.push(id.to_string());
                    rendered.push(index);
                }
                PassStatus::Declined => {
                    log::debug!("Pass '{}' declined, dropping {} export(s)", id, staged.len());
                    self.skip(node, SkipReason::PassDeclined, registry, &mut report);
                }
            }
        }

        let batch = self.exports.take();
        report.exports_applied = external.apply(batch);
        if report.exports_applied > 0 {
            log::debug!("Applied {} export(s)", report.exports_applied);
        }

        for index in rendered {
            passes[index].post_frame();
        }

        report
    }

    /// Record a skip, unbinding the pass's outputs or passing its first input through
    fn skip(
        &mut self,
        node: &PassNode,
        reason: SkipReason,
        registry: &ResourceRegistry,
        report: &mut FrameReport,
    ) {
        for output in &node.outputs {
            self.table.unbind(output.resource);
        }

        if node.descriptor.skip_passthrough {
            if let (Some(input), Some(output)) = (node.inputs.first(), node.outputs.first()) {
                if self.table.alias(output.resource, input.resource) {
                    log::debug!(
                        "Pass '{}' passes '{}' through to '{}'",
                        node.id(),
                        registry.name(input.resource).unwrap_or_default(),
                        registry.name(output.resource).unwrap_or_default()
                    );
                }
            }
        }

        log::debug!("Pass '{}' skipped: {:?}", node.id(), reason);
        report.skipped.push((node.id().to_string(), reason));
    }

    /// Forget cached targets without destroying them
    pub fn invalidate_for_context_loss(&mut self) {
        self.table.clear();
        self.exports.clear();
        self.pool.forget_all();
    }

    /// Destroy every pooled target
    pub fn release(&mut self, gpu: &mut SyncedContext) {
        self.table.clear();
        self.pool.release_all(gpu);
    }
}
