//! Render pass definitions for the render graph

use crate::backend::attachment_sync::SyncedContext;
use crate::render_graph::context::PassExecuteContext;
use crate::render_graph::resource::*;
use std::any::Any;

/// Declared read of a resource
#[derive(Debug, Clone, PartialEq)]
pub struct InputDecl {
    pub resource: String,
    pub selector: Option<AttachmentSelector>,
    /// A missing optional input does not skip the pass
    pub optional: bool,
}

impl InputDecl {
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            selector: None,
            optional: false,
        }
    }

    /// Read a specific attachment of the bound target
    pub fn attachment(mut self, selector: AttachmentSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl From<&str> for InputDecl {
    fn from(resource: &str) -> Self {
        InputDecl::new(resource)
    }
}

/// Declared write of a resource, with its backing storage
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDecl {
    pub resource: String,
    pub desc: ResourceDesc,
}

impl OutputDecl {
    pub fn new(resource: &str, desc: ResourceDesc) -> Self {
        Self {
            resource: resource.to_string(),
            desc,
        }
    }
}

impl From<&str> for OutputDecl {
    fn from(resource: &str) -> Self {
        OutputDecl::new(resource, ResourceDesc::default())
    }
}

/// Pass configuration consumed by the scheduler
///
/// A pass with no outputs writes to the display surface. A pass with no
/// inputs is a pure producer.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    /// Unique, stable identifier
    pub id: String,
    /// Diagnostic name
    pub name: String,
    pub inputs: Vec<InputDecl>,
    pub outputs: Vec<OutputDecl>,
    pub enabled: bool,
    /// Tie-break between passes that are ready at the same time (ascending)
    pub priority: i32,
    /// Alias the first input to the first output when the pass doesn't run
    pub skip_passthrough: bool,
    /// Passes that must run before this one, without a resource edge
    pub run_after: Vec<String>,
}

impl PassDescriptor {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            enabled: true,
            priority: 0,
            skip_passthrough: false,
            run_after: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn input(mut self, input: impl Into<InputDecl>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn output(mut self, output: impl Into<OutputDecl>) -> Self {
        self.outputs.push(output.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.skip_passthrough = true;
        self
    }

    pub fn run_after(mut self, pass: &str) -> Self {
        self.run_after.push(pass.to_string());
        self
    }

    pub fn writes_to_surface(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn reads(&self, resource: &str) -> bool {
        self.inputs.iter().any(|i| i.resource == resource)
    }

    pub fn writes(&self, resource: &str) -> bool {
        self.outputs.iter().any(|o| o.resource == resource)
    }
}

/// Outcome of [`RenderPass::execute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// New data was produced
    Rendered,
    /// Nothing was produced this frame (e.g. capture interval not reached)
    Declined,
}

/// Trait for render passes
pub trait RenderPass: Send + Sync {
    /// Configuration read once at registration
    fn descriptor(&self) -> PassDescriptor;

    /// Record this frame's work
    fn execute(&mut self, ctx: &mut PassExecuteContext<'_>) -> PassStatus;

    /// Called after exports are flushed, only if this frame's execute returned
    /// [`PassStatus::Rendered`]
    fn post_frame(&mut self) {}

    /// Viewport changed
    fn on_resize(&mut self, _width: u32, _height: u32) {}

    /// Release pass-owned GPU resources
    fn dispose(&mut self, _gpu: &mut SyncedContext) {}

    /// Forget pass-owned GPU handles without destroying them
    fn invalidate_for_context_loss(&mut self) {}

    /// Allow downcasting
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Input with its interned resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInput {
    pub resource: ResourceId,
    pub selector: AttachmentSelector,
    pub optional: bool,
}

/// Output with its interned resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOutput {
    pub resource: ResourceId,
    pub desc: ResourceDesc,
}

/// Metadata about a pass in the graph
#[derive(Debug, Clone)]
pub struct PassNode {
    pub descriptor: PassDescriptor,
    pub inputs: Vec<ResolvedInput>,
    pub outputs: Vec<ResolvedOutput>,
}

impl PassNode {
    pub fn new(descriptor: PassDescriptor, registry: &mut ResourceRegistry) -> Self {
        let inputs = descriptor
            .inputs
            .iter()
            .map(|i| ResolvedInput {
                resource: registry.intern(&i.resource),
                selector: i.selector.unwrap_or_default(),
                optional: i.optional,
            })
            .collect();
        let outputs = descriptor
            .outputs
            .iter()
            .map(|o| ResolvedOutput {
                resource: registry.intern(&o.resource),
                desc: o.desc.clone(),
            })
            .collect();
        Self {
            descriptor,
            inputs,
            outputs,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn reads_resource(&self, resource: ResourceId) -> bool {
        self.inputs.iter().any(|a| a.resource == resource)
    }

    pub fn writes_resource(&self, resource: ResourceId) -> bool {
        self.outputs.iter().any(|a| a.resource == resource)
    }

    /// Selector declared for `resource`, if it is an input
    pub fn input_selector(&self, resource: ResourceId) -> Option<AttachmentSelector> {
        self.inputs
            .iter()
            .find(|a| a.resource == resource)
            .map(|a| a.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = PassDescriptor::new("resolve")
            .input("scene_color")
            .input(InputDecl::new("ao").optional())
            .input(InputDecl::new("scene_color").attachment(AttachmentSelector::Depth))
            .output(OutputDecl::new("hdr_color", ResourceDesc::hdr()))
            .priority(5)
            .passthrough();
        assert_eq!(desc.name, "resolve");
        assert!(desc.enabled);
        assert!(desc.skip_passthrough);
        assert!(desc.reads("ao"));
        assert!(desc.writes("hdr_color"));
        assert!(!desc.writes_to_surface());
        assert!(PassDescriptor::new("composite").writes_to_surface());
    }

    #[test]
    fn test_node_interns_declarations() {
        let mut registry = ResourceRegistry::new();
        let desc = PassDescriptor::new("ao")
            .input(InputDecl::new("depth").attachment(AttachmentSelector::Depth))
            .output("ao");
        let node = PassNode::new(desc, &mut registry);
        let depth = registry.get("depth").unwrap();
        let ao = registry.get("ao").unwrap();
        assert!(node.reads_resource(depth));
        assert!(node.writes_resource(ao));
        assert!(!node.writes_resource(depth));
        assert_eq!(node.input_selector(depth), Some(AttachmentSelector::Depth));
        assert_eq!(node.input_selector(ao), None);
    }
}
