//! Render graph definition and scheduling

use crate::backend::attachment_sync::SyncedContext;
use crate::backend::types::TextureHandle;
use crate::render_graph::compiler::{self, CompiledGraph};
use crate::render_graph::context::FrameInfo;
use crate::render_graph::error::{GraphError, GraphResult};
use crate::render_graph::executor::{FrameReport, RenderGraphExecutor};
use crate::render_graph::export::ExternalState;
use crate::render_graph::pass::*;
use crate::render_graph::resource::*;
use std::collections::{HashMap, HashSet};

/// The main render graph structure
///
/// Owns the passes and drives frames. Structural changes mark the compiled
/// order dirty; the next [`execute`](Self::execute) recompiles.
pub struct RenderGraph {
    passes: Vec<Box<dyn RenderPass>>,
    pass_nodes: Vec<PassNode>,
    registry: ResourceRegistry,

    /// Externally owned textures bound every frame
    imports: HashMap<ResourceId, TextureHandle>,

    compiled: Option<CompiledGraph>,
    /// Pool holds targets for resources that may no longer be declared
    pool_stale: bool,
    executor: RenderGraphExecutor,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            pass_nodes: Vec::new(),
            registry: ResourceRegistry::new(),
            imports: HashMap::new(),
            compiled: None,
            pool_stale: false,
            executor: RenderGraphExecutor::new(),
        }
    }

    /// Add a render pass to the graph
    pub fn add_pass<P: RenderPass + 'static>(&mut self, pass: P) -> GraphResult<()> {
        self.add_boxed_pass(Box::new(pass))
    }

    pub fn add_boxed_pass(&mut self, pass: Box<dyn RenderPass>) -> GraphResult<()> {
        let descriptor = pass.descriptor();
        if self.index_of(&descriptor.id).is_some() {
            return Err(GraphError::DuplicatePassId(descriptor.id));
        }
        log::debug!("Adding pass '{}'", descriptor.id);
        let node = PassNode::new(descriptor, &mut self.registry);
        self.passes.push(pass);
        self.pass_nodes.push(node);
        self.mark_dirty();
        Ok(())
    }

    /// Remove a pass; its pass-owned resources are not disposed
    pub fn remove_pass(&mut self, id: &str) -> Option<Box<dyn RenderPass>> {
        let Some(index) = self.index_of(id) else {
            log::warn!("remove_pass: unknown pass '{}'", id);
            return None;
        };
        self.pass_nodes.remove(index);
        self.mark_dirty();
        Some(self.passes.remove(index))
    }

    /// Remove a pass and release its GPU resources
    pub fn remove_and_dispose_pass(&mut self, id: &str, gpu: &mut SyncedContext) -> bool {
        match self.remove_pass(id) {
            Some(mut pass) => {
                pass.dispose(gpu);
                true
            }
            None => false,
        }
    }

    pub fn has_pass(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Pass ids in registration order
    pub fn pass_ids(&self) -> Vec<&str> {
        self.pass_nodes.iter().map(|n| n.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Toggle a pass without recompiling. Returns `false` for unknown ids.
    pub fn set_pass_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.pass_nodes[index].descriptor.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_pass_enabled(&self, id: &str) -> Option<bool> {
        self.index_of(id)
            .map(|index| self.pass_nodes[index].descriptor.enabled)
    }

    pub fn set_pass_priority(&mut self, id: &str, priority: i32) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.pass_nodes[index].descriptor.priority = priority;
                self.mark_dirty();
                true
            }
            None => false,
        }
    }

    /// Bind an externally owned texture under `name` every frame
    ///
    /// The name must not be a pass output; that is rejected at compile time.
    pub fn import_texture(&mut self, name: &str, texture: TextureHandle) -> ResourceId {
        let id = self.registry.intern(name);
        if self.imports.insert(id, texture).is_none() {
            self.mark_dirty();
        }
        id
    }

    pub fn remove_import(&mut self, name: &str) -> Option<TextureHandle> {
        let id = self.registry.get(name)?;
        self.imports.remove(&id)
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Compile now if the graph changed since the last compilation
    pub fn compile(&mut self) -> GraphResult<&CompiledGraph> {
        let compiled = match self.compiled.take() {
            Some(compiled) => compiled,
            None => {
                let compiled = compiler::compile(&self.pass_nodes, &self.registry)?;
                self.check_imports(&compiled)?;
                log::info!("Render graph compiled: {} passes", compiled.pass_order.len());
                self.pool_stale = true;
                compiled
            }
        };
        Ok(self.compiled.insert(compiled))
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn compiled(&self) -> Option<&CompiledGraph> {
        self.compiled.as_ref()
    }

    /// Pass ids in execution order
    pub fn execution_order(&mut self) -> GraphResult<Vec<String>> {
        let order = self.compile()?.pass_order.clone();
        Ok(order
            .into_iter()
            .map(|index| self.pass_nodes[index].id().to_string())
            .collect())
    }

    /// First and last use of a resource in execution order
    pub fn lifetime(&self, name: &str) -> Option<ResourceLifetime> {
        let id = self.registry.get(name)?;
        self.compiled.as_ref()?.lifetime(id)
    }

    /// Run one frame
    ///
    /// Fails only on configuration errors found while compiling.
    pub fn execute(
        &mut self,
        gpu: &mut SyncedContext,
        frame: &FrameInfo,
        external: &mut ExternalState,
    ) -> GraphResult<FrameReport> {
        self.compile()?;
        let Some(compiled) = self.compiled.as_ref() else {
            return Ok(FrameReport::default());
        };

        if self.pool_stale && !gpu.is_lost() {
            let declared: HashSet<ResourceId> = compiled.produced_resources().collect();
            self.executor
                .pool_mut()
                .retain(gpu, |id| declared.contains(&id));
            self.pool_stale = false;
        }

        Ok(self.executor.execute(
            &mut self.passes,
            &self.pass_nodes,
            compiled,
            &self.registry,
            &self.imports,
            gpu,
            frame,
            external,
        ))
    }

    /// Viewport changed; pooled targets resize lazily on the next frame
    pub fn resize(&mut self, width: u32, height: u32) {
        for pass in &mut self.passes {
            pass.on_resize(width, height);
        }
    }

    /// Forget every GPU handle held by the graph and its passes
    pub fn invalidate_for_context_loss(&mut self) {
        self.executor.invalidate_for_context_loss();
        for pass in &mut self.passes {
            pass.invalidate_for_context_loss();
        }
    }

    /// Release pass-owned resources and pooled targets
    pub fn dispose(&mut self, gpu: &mut SyncedContext) {
        for pass in &mut self.passes {
            pass.dispose(gpu);
        }
        self.executor.release(gpu);
    }

    /// Number of pooled render targets
    pub fn pooled_targets(&self) -> usize {
        self.executor.pool().len()
    }

    /// Get pass by id as a concrete type
    pub fn get_pass<T: RenderPass + 'static>(&self, id: &str) -> Option<&T> {
        let index = self.index_of(id)?;
        self.passes[index].as_any().downcast_ref::<T>()
    }

    pub fn get_pass_mut<T: RenderPass + 'static>(&mut self, id: &str) -> Option<&mut T> {
        let index = self.index_of(id)?;
        self.passes[index].as_any_mut().downcast_mut::<T>()
    }

    /// Get pass node (metadata) by id
    pub fn get_pass_node(&self, id: &str) -> Option<&PassNode> {
        self.pass_nodes.iter().find(|n| n.id() == id)
    }

    fn check_imports(&self, compiled: &CompiledGraph) -> GraphResult<()> {
        for &resource in self.imports.keys() {
            if let Some(producer) = compiled.producer_of(resource) {
                return Err(GraphError::ImportedResourceProduced {
                    resource: self.registry.name(resource).unwrap_or_default().to_string(),
                    pass: self.pass_nodes[producer].id().to_string(),
                });
            }
        }
        Ok(())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.pass_nodes.iter().position(|n| n.id() == id)
    }

    fn mark_dirty(&mut self) {
        self.compiled = None;
    }
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}
