//! Task-completion race and delivery subsystem.
//!
//! - [`JobRegistry`]: in-memory table of tasks awaiting a result; its
//!   [`take_if_present`](JobRegistry::take_if_present) is the single point
//!   that decides which completion path delivers.
//! - [`watchdog`]: the cancellable one-shot timer that starts the poll
//!   path after the grace period.
//! - [`poller`]: status query of the poll path.
//! - [`deliverer`]: audio delivery with caption and document fallbacks.
//! - [`GenerationTracker`]: wires the pieces together and broadcasts
//!   [`TrackerEvent`]s.

pub mod backend;
pub mod deliverer;
pub mod poller;
pub mod registry;
pub mod tracker;
pub mod watchdog;

pub use backend::GenerationBackend;
pub use registry::{JobRegistry, PendingTask};
pub use tracker::{GenerationTracker, PushAck, Resolution, StaleReason, SubmitError, TrackerEvent};
pub use watchdog::WatchdogHandle;
