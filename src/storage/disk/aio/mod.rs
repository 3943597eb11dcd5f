//! # Asynchronous Disk I/O Submission Queue
//!
//! This module implements the submission side of the engine's asynchronous
//! disk I/O layer. Application threads hand requests to an [`AioQueue`], which
//! forwards them to the OS asynchronous-I/O facility from a dedicated worker
//! thread, throttling submission whenever the OS-level queue is saturated.
//!
//! ## Modules
//!
//! - **`queue`**: The [`AioQueue`] facade, its waiting/posted sets, and the
//!   worker loop with its backpressure protocol.
//! - **`request`**: The [`AioRequest`] contract that submittable requests
//!   implement, plus the completion-handle primitive.
//! - **`metrics`**: Counters for queue observability.

pub mod metrics;
pub mod queue;
pub mod request;

pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use queue::{AioQueue, AioQueueConfig, ThreadState};
pub use request::{AioRequest, CompletionHandle, CompletionNotifier, SubmitOutcome};
