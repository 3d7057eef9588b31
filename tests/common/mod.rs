//! Common utilities for frame graph integration tests.
//!
//! Everything runs headless against [`RecordingContext`]; [`ProbePass`]
//! records what each pass saw so tests can assert on ordering and visibility.

#![allow(dead_code)]

use std::any::Any;
use std::sync::Arc;

use frame_graph::backend::{
    GraphicsContext, RecordingContext, RecordingProbe, SyncedContext, TextureHandle,
};
use frame_graph::render_graph::{
    ExportValue, FrameInfo, PassDescriptor, PassExecuteContext, PassStatus, RenderPass,
};
use glam::UVec2;
use parking_lot::Mutex;

/// Initialise logging once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Synchronized context over a fresh recording context.
pub fn recording_gpu() -> (SyncedContext, RecordingProbe) {
    recording_gpu_with(RecordingContext::new())
}

pub fn recording_gpu_with(ctx: RecordingContext) -> (SyncedContext, RecordingProbe) {
    let probe = ctx.probe();
    (SyncedContext::new(Box::new(ctx)), probe)
}

/// Frame metadata for frame `index` at 320x240.
pub fn frame(index: u64) -> FrameInfo {
    let mut frame = FrameInfo::new(UVec2::new(320, 240));
    frame.frame_index = index;
    frame.time = index as f32 / 60.0;
    frame.delta_time = 1.0 / 60.0;
    frame
}

// ============================================================================
// Probe pass
// ============================================================================

/// Something a probe pass did
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Executed {
        pass: String,
        /// Declared inputs as seen by the pass
        inputs: Vec<Option<TextureHandle>>,
        /// Value of the observed external slot, if any
        observed: Option<TextureHandle>,
    },
    PostFrame(String),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Ids of executed passes, in order
pub fn executed(log: &EventLog) -> Vec<String> {
    log.lock()
        .iter()
        .filter_map(|e| match e {
            Event::Executed { pass, .. } => Some(pass.clone()),
            _ => None,
        })
        .collect()
}

pub fn post_frames(log: &EventLog) -> Vec<String> {
    log.lock()
        .iter()
        .filter_map(|e| match e {
            Event::PostFrame(pass) => Some(pass.clone()),
            _ => None,
        })
        .collect()
}

/// Inputs seen by `pass` on its most recent execution
pub fn inputs_seen(log: &EventLog, pass: &str) -> Option<Vec<Option<TextureHandle>>> {
    log.lock().iter().rev().find_map(|e| match e {
        Event::Executed { pass: p, inputs, .. } if p == pass => Some(inputs.clone()),
        _ => None,
    })
}

/// External slot value seen by `pass` on each execution
pub fn observed_by(log: &EventLog, pass: &str) -> Vec<Option<TextureHandle>> {
    log.lock()
        .iter()
        .filter_map(|e| match e {
            Event::Executed { pass: p, observed, .. } if p == pass => Some(*observed),
            _ => None,
        })
        .collect()
}

/// Configurable pass that records what it sees and draws into its output
pub struct ProbePass {
    descriptor: PassDescriptor,
    log: EventLog,
    exports: Vec<(String, ExportValue)>,
    observe: Option<String>,
    decline: bool,
}

impl ProbePass {
    pub fn new(descriptor: PassDescriptor, log: &EventLog) -> Self {
        Self {
            descriptor,
            log: Arc::clone(log),
            exports: Vec::new(),
            observe: None,
            decline: false,
        }
    }

    /// Queue `value` to `slot` every time the pass runs
    pub fn exporting(mut self, slot: &str, value: ExportValue) -> Self {
        self.exports.push((slot.to_string(), value));
        self
    }

    /// Record the external state of `slot` every time the pass runs
    pub fn observing(mut self, slot: &str) -> Self {
        self.observe = Some(slot.to_string());
        self
    }

    /// Return [`PassStatus::Declined`] from execute, after queueing exports
    pub fn declining(mut self) -> Self {
        self.decline = true;
        self
    }
}

impl RenderPass for ProbePass {
    fn descriptor(&self) -> PassDescriptor {
        self.descriptor.clone()
    }

    fn execute(&mut self, ctx: &mut PassExecuteContext<'_>) -> PassStatus {
        let inputs = ctx.inputs();
        let observed = self
            .observe
            .as_deref()
            .and_then(|slot| ctx.external().texture(slot));
        self.log.lock().push(Event::Executed {
            pass: self.descriptor.id.clone(),
            inputs: inputs.clone(),
            observed,
        });

        for (slot, value) in &self.exports {
            ctx.queue_export(slot, *value);
        }
        if self.decline {
            return PassStatus::Declined;
        }

        ctx.bind_output();
        ctx.gpu().draw_fullscreen(&frame_graph::backend::FullscreenDraw {
            label: &self.descriptor.id,
            program: "probe",
            inputs: &inputs,
            uniforms: &[],
        });
        PassStatus::Rendered
    }

    fn post_frame(&mut self) {
        self.log
            .lock()
            .push(Event::PostFrame(self.descriptor.id.clone()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
