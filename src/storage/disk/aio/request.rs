//! # I/O Request Contract
//!
//! This module defines the contract between the submission queue and the
//! request objects it schedules. The queue never looks inside a request: it
//! identifies requests by their `(file, offset)` target, asks them to submit
//! themselves to the OS, and waits on their completion handles when the OS
//! submission queue is saturated.
//!
//! ## Request lifecycle
//!
//! ```text
//!   add_request            worker picks up          OS reports done
//!        │                       │                        │
//!        ▼                       ▼                        ▼
//!   ┌─────────┐  pop front  ┌─────────┐  try_submit  ┌─────────┐
//!   │ Waiting │────────────►│ posting │─────────────►│ Posted  │──► removed
//!   └─────────┘             └─────────┘              └─────────┘
//!        │                       ▲    │ QueueFull         ▲
//!        │ cancel_request        └────┘ (Suspend-Wait,    │
//!        ▼                              then retry)       │
//!     removed                                   completion handle fires
//! ```
//!
//! A request sits in at most one of {Waiting, Posted} at any time. Cancellation
//! while Waiting removes it before it ever reaches the OS; cancellation while
//! Posted is delegated to the request's own OS-level `cancel`, which may
//! legitimately fail against an operation already in flight.

use std::io;

use crossbeam::channel::{Receiver, Sender, TryRecvError, bounded};

use crate::common::config::{FileId, INVALID_FILE_ID, Offset};

/// Outcome of a non-blocking submission attempt against the OS queue.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The OS accepted the request; its completion handle is now live.
    Submitted,

    /// The OS submission queue is saturated. The caller should wait for an
    /// in-flight request to complete and retry.
    QueueFull,

    /// The OS rejected the request for a reason other than queue depth.
    ///
    /// Contract: the request has already recorded this failure on its own
    /// result channel before returning it, so its originator learns of the
    /// error without the queue's involvement.
    Failed(io::Error),
}

/// Contract for requests scheduled by the submission queue.
///
/// Implementations are shared between the producer that created the request,
/// the queue, and the completion path, so all methods take `&self`.
pub trait AioRequest: Send + Sync {
    /// File this request targets. Together with [`offset`](Self::offset) this
    /// forms the request's identity within the queue.
    fn file(&self) -> FileId;

    /// Byte offset this request targets.
    fn offset(&self) -> Offset;

    /// Hands the request to the OS without blocking.
    fn try_submit(&self) -> SubmitOutcome;

    /// Handle that fires once the OS reports this request complete.
    ///
    /// Only meaningful after [`try_submit`](Self::try_submit) returned
    /// [`SubmitOutcome::Submitted`].
    fn completion_handle(&self) -> CompletionHandle;

    /// Attempts OS-level cancellation. Returns `false` when the operation is
    /// already irrevocably in flight; such requests complete normally.
    fn cancel(&self) -> bool;
}

/// True when both requests target the same file and byte offset.
pub(crate) fn same_target(a: &dyn AioRequest, b: &dyn AioRequest) -> bool {
    a.file() == b.file() && a.offset() == b.offset()
}

/// True for requests carrying no real target. Such requests are rejected at
/// the queue boundary before touching any internal state.
pub(crate) fn is_empty_request(req: &dyn AioRequest) -> bool {
    req.file() == INVALID_FILE_ID
}

/// Waitable side of a completion notification.
///
/// Cloning yields another handle on the same notification. The handle stays
/// signalled once fired, matching the OS semantics of a completed control
/// block, and also fires if the notifier is dropped without being fired.
#[derive(Clone)]
pub struct CompletionHandle {
    inner: Receiver<()>,
}

/// Firing side of a completion notification, held by the completion path.
pub struct CompletionNotifier {
    inner: Sender<()>,
}

impl CompletionHandle {
    /// Creates a connected notifier/handle pair.
    pub fn pair() -> (CompletionNotifier, CompletionHandle) {
        let (tx, rx) = bounded(1);
        (
            CompletionNotifier { inner: tx },
            CompletionHandle { inner: rx },
        )
    }

    /// Returns `true` once the notifier has fired or been dropped.
    pub fn is_signalled(&self) -> bool {
        // A fired notification stays observable: consuming the buffered
        // message leaves the channel disconnected, which still reads as
        // signalled here and as ready to the worker's Suspend-Wait.
        !matches!(self.inner.try_recv(), Err(TryRecvError::Empty))
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.inner
    }
}

impl CompletionNotifier {
    /// Fires the associated handles. Consumes the notifier: a completion is
    /// reported at most once.
    pub fn notify(self) {
        // A dropped handle just means nobody is waiting anymore.
        let _ = self.inner.send(());
    }
}
