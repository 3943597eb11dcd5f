use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::Select;
use log::{debug, error, trace, warn};
use parking_lot::Mutex;

use crate::common::config::{DEFAULT_MAX_SIM_REQUESTS, DEFAULT_SUSPEND_POLL_INTERVAL};
use crate::common::exception::AioError;
use crate::common::semaphore::Semaphore;
use crate::storage::disk::aio::metrics::{QueueMetrics, QueueMetricsSnapshot};
use crate::storage::disk::aio::request::{
    AioRequest, CompletionHandle, SubmitOutcome, is_empty_request, same_target,
};

/// Lifecycle of the queue's worker thread.
///
/// `Running` from construction, `Terminating` once shutdown is requested, and
/// `Stopped` only after the worker has drained the waiting set and exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    Terminating,
    Stopped,
}

/// Tuning knobs for an [`AioQueue`].
#[derive(Debug, Clone)]
pub struct AioQueueConfig {
    /// Advisory ceiling on simultaneously posted requests. Pre-sizes the
    /// posted set and the worker's suspend buffer; actual throttling comes
    /// from the OS rejecting submissions once its own queue is full.
    pub max_sim_requests: usize,

    /// How long the worker sleeps when it must stall with nothing posted,
    /// i.e. when submission capacity is held by other queues.
    pub suspend_poll_interval: Duration,
}

impl Default for AioQueueConfig {
    fn default() -> Self {
        Self {
            max_sim_requests: DEFAULT_MAX_SIM_REQUESTS,
            suspend_poll_interval: DEFAULT_SUSPEND_POLL_INTERVAL,
        }
    }
}

/// Waiting set and lifecycle state share one lock: closing the queue must be
/// ordered against concurrent enqueues, so an `add_request` that passed the
/// state check has its push serialized before the close (and is therefore
/// drained before the worker stops).
struct Intake {
    requests: VecDeque<Arc<dyn AioRequest>>,
    state: ThreadState,
}

/// A request currently owned by the OS, with the completion handle captured
/// at posting time.
struct PostedEntry {
    request: Arc<dyn AioRequest>,
    handle: CompletionHandle,
}

struct QueueShared {
    intake: Mutex<Intake>,
    posted: Mutex<Vec<PostedEntry>>,
    /// Counts submittable work; one token per waiting request, plus one
    /// sentinel posted at shutdown so an idle worker observes the close.
    work_signal: Semaphore,
    metrics: QueueMetrics,
    config: AioQueueConfig,
}

/// Submission queue for asynchronous disk I/O.
///
/// Producers enqueue requests with [`add_request`](Self::add_request); a
/// dedicated worker thread hands them to the OS in FIFO order, stalling on a
/// saturated OS queue until an in-flight request completes. The completion
/// path reports finished requests via
/// [`complete_request`](Self::complete_request).
pub struct AioQueue {
    shared: Arc<QueueShared>,
    worker_thread: Option<thread::JoinHandle<()>>,
}

impl AioQueue {
    /// Creates a queue with the given advisory bound on simultaneous
    /// requests and starts its worker thread.
    pub fn new(max_sim_requests: usize) -> Self {
        Self::with_config(AioQueueConfig {
            max_sim_requests,
            ..AioQueueConfig::default()
        })
    }

    pub fn with_config(config: AioQueueConfig) -> Self {
        let shared = Arc::new(QueueShared {
            intake: Mutex::new(Intake {
                requests: VecDeque::new(),
                state: ThreadState::Running,
            }),
            posted: Mutex::new(Vec::with_capacity(config.max_sim_requests)),
            work_signal: Semaphore::new(0),
            metrics: QueueMetrics::default(),
            config,
        });

        let mut queue = AioQueue {
            shared,
            worker_thread: None,
        };
        queue.start_worker_thread();
        queue
    }

    /// Accepts a request into the waiting set and wakes the worker.
    ///
    /// Non-blocking apart from the intake critical section; no submission
    /// happens on the caller's thread.
    pub fn add_request(&self, request: Arc<dyn AioRequest>) -> Result<(), AioError> {
        if is_empty_request(request.as_ref()) {
            return Err(AioError::EmptyRequest);
        }

        {
            let mut intake = self.shared.intake.lock();
            if intake.state != ThreadState::Running {
                return Err(AioError::NotAccepting);
            }
            intake.requests.push_back(request);
        }

        self.shared.work_signal.post();
        self.shared.metrics.record_enqueued();
        Ok(())
    }

    /// Cancels a request, wherever it currently is.
    ///
    /// Returns `Ok(true)` when the request was still waiting and is now gone
    /// without ever reaching the OS. Otherwise the request's own OS-level
    /// cancellation decides the outcome; `Ok(false)` means the operation is
    /// already irrevocably in flight and will complete normally.
    pub fn cancel_request(&self, request: &dyn AioRequest) -> Result<bool, AioError> {
        if is_empty_request(request) {
            return Err(AioError::EmptyRequest);
        }

        let removed = {
            let mut intake = self.shared.intake.lock();
            if intake.state != ThreadState::Running {
                return Err(AioError::NotAccepting);
            }
            match intake
                .requests
                .iter()
                .position(|queued| same_target(queued.as_ref(), request))
            {
                Some(index) => {
                    let _ = intake.requests.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            // The worker may already have claimed this request's token; its
            // next wakeup then pops an empty set and burns the token instead.
            self.shared.work_signal.try_wait();
            self.shared.metrics.record_cancelled_waiting();
            trace!(
                "cancelled waiting request (file {}, offset {})",
                request.file(),
                request.offset()
            );
            return Ok(true);
        }

        let cancelled = request.cancel();
        if !cancelled {
            self.shared.metrics.record_cancellation_race();
        }
        Ok(cancelled)
    }

    /// Removes a finished request from the posted set.
    ///
    /// Invoked by the completion-notification path once the OS reports the
    /// request done (or cancelled at OS level). Calling it again for an
    /// already-removed request is a no-op.
    pub fn complete_request(&self, request: &dyn AioRequest) {
        let mut posted = self.shared.posted.lock();
        match posted
            .iter()
            .position(|entry| same_target(entry.request.as_ref(), request))
        {
            Some(index) => {
                posted.swap_remove(index);
                drop(posted);
                self.shared.metrics.record_completed();
            }
            None => {
                drop(posted);
                debug!(
                    "completion for request not in posted set (file {}, offset {})",
                    request.file(),
                    request.offset()
                );
            }
        }
    }

    /// Closes the queue to new requests and asks the worker to drain and
    /// exit. Already-accepted requests are still submitted.
    pub fn shut_down(&self) {
        {
            let mut intake = self.shared.intake.lock();
            if intake.state != ThreadState::Running {
                return;
            }
            intake.state = ThreadState::Terminating;
        }
        // Sentinel token: the worker may be asleep with no pending work.
        self.shared.work_signal.post();
    }

    pub fn state(&self) -> ThreadState {
        self.shared.intake.lock().state
    }

    pub fn waiting_len(&self) -> usize {
        self.shared.intake.lock().requests.len()
    }

    pub fn posted_len(&self) -> usize {
        self.shared.posted.lock().len()
    }

    /// True while the request is in the posted set.
    /// (useful for monitoring and for completion-path assertions)
    pub fn is_posted(&self, request: &dyn AioRequest) -> bool {
        self.shared
            .posted
            .lock()
            .iter()
            .any(|entry| same_target(entry.request.as_ref(), request))
    }

    /// True when nothing is waiting and nothing is in flight.
    pub fn is_drained(&self) -> bool {
        self.waiting_len() == 0 && self.posted_len() == 0
    }

    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &AioQueueConfig {
        &self.shared.config
    }

    fn start_worker_thread(&mut self) {
        let shared = Arc::clone(&self.shared);
        self.worker_thread = Some(thread::spawn(move || worker_loop(shared)));
    }
}

impl Drop for AioQueue {
    fn drop(&mut self) {
        self.shut_down();
        if let Some(handle) = self.worker_thread.take() {
            if let Err(e) = handle.join() {
                warn!("Failed to join I/O worker thread: {:?}", e);
            }
        }
    }
}

/// Worker loop: moves requests from the waiting set to the posted set, one at
/// a time, submitting each to the OS with retry under backpressure.
fn worker_loop(shared: Arc<QueueShared>) {
    debug!("I/O worker started");

    // Reused across stalls; rebuilt from the posted set on each Suspend-Wait.
    let mut suspend_handles: Vec<CompletionHandle> =
        Vec::with_capacity(shared.config.max_sim_requests);

    loop {
        shared.work_signal.wait();

        let request = shared.intake.lock().requests.pop_front();
        if let Some(request) = request {
            submit_with_backpressure(&shared, &mut suspend_handles, request);
        }
        // A token with no request behind it is either the shutdown sentinel
        // or the trace of a cancellation that lost the token race; neither
        // is re-posted.

        let intake = shared.intake.lock();
        if intake.state == ThreadState::Terminating && intake.requests.is_empty() {
            break;
        }
    }

    shared.intake.lock().state = ThreadState::Stopped;
    debug!("I/O worker stopped");
}

fn submit_with_backpressure(
    shared: &QueueShared,
    suspend_handles: &mut Vec<CompletionHandle>,
    request: Arc<dyn AioRequest>,
) {
    loop {
        match request.try_submit() {
            SubmitOutcome::Submitted => {
                let handle = request.completion_handle();
                trace!(
                    "posted request (file {}, offset {})",
                    request.file(),
                    request.offset()
                );
                shared.posted.lock().push(PostedEntry { request, handle });
                shared.metrics.record_submitted();
                return;
            }
            SubmitOutcome::QueueFull => {
                shared.metrics.record_backpressure_stall();
                suspend(shared, suspend_handles);
            }
            SubmitOutcome::Failed(err) => {
                // The request has already surfaced the error on its own
                // result channel; it must not reach the posted set.
                error!(
                    "submission failed for request (file {}, offset {}): {}",
                    request.file(),
                    request.offset(),
                    err
                );
                shared.metrics.record_submit_failure();
                return;
            }
        }
    }
}

/// Suspend-Wait: blocks until at least one posted request's completion handle
/// fires, freeing OS submission capacity for the retry.
fn suspend(shared: &QueueShared, suspend_handles: &mut Vec<CompletionHandle>) {
    suspend_handles.clear();
    {
        let posted = shared.posted.lock();
        suspend_handles.extend(posted.iter().map(|entry| entry.handle.clone()));
    }

    if suspend_handles.is_empty() {
        // Nothing of ours is in flight; submission capacity is held by other
        // queues, so poll instead of waiting on an empty set.
        thread::sleep(shared.config.suspend_poll_interval);
        return;
    }

    let mut select = Select::new();
    for handle in suspend_handles.iter() {
        select.recv(handle.receiver());
    }
    select.ready();
}
