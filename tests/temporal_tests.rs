//! History ring buffer tests, standalone and through environment capture.

mod common;

use std::any::Any;
use std::sync::Arc;

use common::{event_log, frame, init_logging, observed_by, recording_gpu, ProbePass};
use frame_graph::backend::{ContextCall, GraphicsContext, RenderTargetHandle, SyncedContext};
use frame_graph::pipeline::{pass_ids, EnvironmentCaptureConfig, EnvironmentCapturePass};
use frame_graph::render_graph::{
    slots, ExternalState, GraphError, PassDescriptor, PassExecuteContext, PassStatus, RenderGraph,
    RenderPass, SkipReason, TemporalResource,
};
use parking_lot::Mutex;
use rstest::rstest;

/// Frame index written into each slot, indexed by slot
type SlotData = Arc<Mutex<Vec<u64>>>;

/// Writes the frame index into its current slot and records what `read(1)` saw
struct RingPass {
    history: TemporalResource<usize>,
    data: SlotData,
    previous_seen: Arc<Mutex<Vec<Option<u64>>>>,
}

impl RenderPass for RingPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor::new("ring")
    }

    fn execute(&mut self, ctx: &mut PassExecuteContext<'_>) -> PassStatus {
        let previous = self
            .history
            .read_valid(0)
            .map(|slot| self.data.lock()[slot]);
        self.previous_seen.lock().push(previous);
        self.data.lock()[self.history.write()] = ctx.frame().frame_index;
        PassStatus::Rendered
    }

    fn post_frame(&mut self) {
        self.history.advance_frame();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_two_frame_history() {
    let mut history = TemporalResource::new(vec![0usize, 1]).unwrap();
    let mut data = [0u64; 2];

    data[history.write()] = 1;
    history.advance_frame();
    assert!(history.has_valid_history(0));
    assert!(!history.has_valid_history(1));

    data[history.write()] = 2;
    history.advance_frame();
    assert!(history.has_valid_history(1));
    assert_eq!(data[history.read(1).unwrap()], 1);
    assert_eq!(data[history.read(0).unwrap()], 2);
}

#[rstest]
#[case::double(2)]
#[case::triple(3)]
#[case::quad(4)]
fn test_write_slot_never_latest_read(#[case] length: usize) {
    let mut history = TemporalResource::new((0..length).collect::<Vec<_>>()).unwrap();
    for _ in 0..length * 3 {
        history.advance_frame();
        assert_ne!(Some(history.write()), history.read(0));
        assert_eq!(history.read(length), None);
    }
}

#[rstest]
#[case::empty(0)]
#[case::single(1)]
fn test_rejects_short_history(#[case] length: usize) {
    let result = TemporalResource::<u32>::try_from_fn(length, |i| Ok::<_, GraphError>(i as u32));
    assert!(matches!(result, Err(GraphError::InvalidHistoryLength(n)) if n == length));
}

#[test]
fn test_ring_pass_reads_previous_frame() {
    let data: SlotData = Arc::new(Mutex::new(vec![0; 2]));
    let previous_seen = Arc::new(Mutex::new(Vec::new()));
    let mut graph = RenderGraph::new();
    graph
        .add_pass(RingPass {
            history: TemporalResource::new(vec![0, 1]).unwrap(),
            data: Arc::clone(&data),
            previous_seen: Arc::clone(&previous_seen),
        })
        .unwrap();

    let (mut gpu, _probe) = recording_gpu();
    let mut external = ExternalState::new();
    for index in 1..=4 {
        graph.execute(&mut gpu, &frame(index), &mut external).unwrap();
    }

    // The first frame has no history; afterwards each frame sees the one before
    assert_eq!(*previous_seen.lock(), vec![None, Some(1), Some(2), Some(3)]);
}

// ============================================================================
// Environment capture
// ============================================================================

fn capture_graph(config: EnvironmentCaptureConfig) -> (RenderGraph, common::EventLog) {
    let log = event_log();
    let mut graph = RenderGraph::new();
    graph.add_pass(EnvironmentCapturePass::new(config, true)).unwrap();
    graph
        .add_pass(ProbePass::new(PassDescriptor::new("consumer"), &log).observing(slots::SCENE_ENVIRONMENT))
        .unwrap();
    (graph, log)
}

fn capture(graph: &RenderGraph) -> &EnvironmentCapturePass {
    graph
        .get_pass::<EnvironmentCapturePass>(pass_ids::ENVIRONMENT_CAPTURE)
        .unwrap()
}

fn color_texture(gpu: &SyncedContext, target: RenderTargetHandle) -> frame_graph::backend::TextureHandle {
    gpu.render_target_info(target).unwrap().color_textures[0]
}

#[test]
fn test_capture_history_validity() {
    init_logging();
    let (mut graph, _log) = capture_graph(EnvironmentCaptureConfig::default());
    let (mut gpu, _probe) = recording_gpu();
    let mut external = ExternalState::new();

    graph.execute(&mut gpu, &frame(1), &mut external).unwrap();
    let history = capture(&graph).history().unwrap();
    assert!(!history.has_valid_history(1));
    let first = history.read(0).unwrap();

    graph.execute(&mut gpu, &frame(2), &mut external).unwrap();
    let history = capture(&graph).history().unwrap();
    assert!(history.has_valid_history(1));
    assert_eq!(history.read(1), Some(first));
    assert_ne!(history.read(0), Some(first));
}

#[test]
fn test_capture_never_samples_its_own_output() {
    let (mut graph, log) = capture_graph(EnvironmentCaptureConfig::default());
    let (mut gpu, probe) = recording_gpu();
    let mut external = ExternalState::new();

    for index in 1..=3 {
        graph.execute(&mut gpu, &frame(index), &mut external).unwrap();
        // Hosts apply the exported background between frames
        let background = external.texture(slots::SCENE_BACKGROUND);
        gpu.set_scene_background(frame(index).scene, background);
    }

    for call in probe.calls() {
        if let ContextCall::RenderCube { background, .. } = call {
            assert_eq!(background, None);
        }
    }
    // The consumer sees last frame's capture, never the one in flight
    let observed = observed_by(&log, "consumer");
    assert_eq!(observed[0], None);
    assert!(observed[1].is_some());
    assert_ne!(observed[1], observed[2]);
}

#[test]
fn test_capture_exports_slot_it_wrote() {
    let (mut graph, _log) = capture_graph(EnvironmentCaptureConfig::default());
    let (mut gpu, _probe) = recording_gpu();
    let mut external = ExternalState::new();

    graph.execute(&mut gpu, &frame(1), &mut external).unwrap();
    let written = capture(&graph).history().unwrap().read(0).unwrap();
    let expected = color_texture(&gpu, written);
    assert_eq!(external.texture(slots::SCENE_ENVIRONMENT), Some(expected));
    assert_eq!(external.texture(slots::SCENE_BACKGROUND), Some(expected));
}

#[test]
fn test_capture_interval_declines_without_advancing() {
    let config = EnvironmentCaptureConfig {
        interval: 2,
        ..Default::default()
    };
    let (mut graph, _log) = capture_graph(config);
    let (mut gpu, _probe) = recording_gpu();
    let mut external = ExternalState::new();

    let first = graph.execute(&mut gpu, &frame(1), &mut external).unwrap();
    assert!(first.was_executed(pass_ids::ENVIRONMENT_CAPTURE));

    let second = graph.execute(&mut gpu, &frame(2), &mut external).unwrap();
    assert_eq!(
        second.skip_reason(pass_ids::ENVIRONMENT_CAPTURE),
        Some(&SkipReason::PassDeclined)
    );
    assert_eq!(capture(&graph).history().unwrap().frames_since_reset(), 1);
    // Declining does not hide the rest of the frame
    assert!(second.was_executed("consumer"));

    let third = graph.execute(&mut gpu, &frame(3), &mut external).unwrap();
    assert!(third.was_executed(pass_ids::ENVIRONMENT_CAPTURE));
    assert_eq!(capture(&graph).history().unwrap().frames_since_reset(), 2);
}

#[test]
fn test_capture_resolution_change_defers_release() {
    let (mut graph, _log) = capture_graph(EnvironmentCaptureConfig::default());
    let (mut gpu, probe) = recording_gpu();
    let mut external = ExternalState::new();
    let destroyed = |probe: &frame_graph::backend::RecordingProbe| {
        probe.count(|c| matches!(c, ContextCall::DestroyRenderTarget(_)))
    };

    graph.execute(&mut gpu, &frame(1), &mut external).unwrap();
    graph.execute(&mut gpu, &frame(2), &mut external).unwrap();
    let old_slots = capture(&graph).history().unwrap().slots().to_vec();

    graph
        .get_pass_mut::<EnvironmentCapturePass>(pass_ids::ENVIRONMENT_CAPTURE)
        .unwrap()
        .set_resolution(128);
    graph.execute(&mut gpu, &frame(3), &mut external).unwrap();

    let history = capture(&graph).history().unwrap();
    assert!(!history.has_valid_history(1));
    assert!(history.slots().iter().all(|slot| !old_slots.contains(slot)));
    assert_eq!(gpu.render_target_info(history.read(0).unwrap()).unwrap().width, 128);
    // Old slots may still be referenced by this frame's exported state
    assert_eq!(destroyed(&probe), 0);

    graph.execute(&mut gpu, &frame(4), &mut external).unwrap();
    assert_eq!(destroyed(&probe), old_slots.len());
}

#[test]
fn test_capture_dispose_releases_slots() {
    let (mut graph, _log) = capture_graph(EnvironmentCaptureConfig::default());
    let (mut gpu, probe) = recording_gpu();
    let mut external = ExternalState::new();
    graph.execute(&mut gpu, &frame(1), &mut external).unwrap();

    assert!(graph.remove_and_dispose_pass(pass_ids::ENVIRONMENT_CAPTURE, &mut gpu));
    assert_eq!(
        probe.count(|c| matches!(c, ContextCall::DestroyRenderTarget(_))),
        EnvironmentCaptureConfig::default().history_length
    );
}
