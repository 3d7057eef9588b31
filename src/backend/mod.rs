//! Backend abstraction layer
//!
//! Provides the graphics context trait consumed by the frame graph, the
//! attachment-synchronizing decorator wrapped around it, and a headless
//! recording implementation.

pub mod attachment_sync;
pub mod recording;
pub mod traits;
pub mod types;

pub use attachment_sync::{AttachmentState, SyncStats, SyncedContext, TrackedBinding};
pub use recording::{ContextCall, RecordingContext, RecordingProbe, ShadowBehavior};
pub use traits::*;
pub use types::*;
