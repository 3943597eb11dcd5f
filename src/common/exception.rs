use thiserror::Error;

/// Errors surfaced synchronously by the disk I/O queue.
///
/// These are misuse errors, not operational failures: submission backpressure
/// is recovered internally by the queue's worker and never reaches callers,
/// and OS-level submission failures travel on the failing request's own
/// result channel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AioError {
    #[error("Empty request submitted to disk queue.")]
    EmptyRequest,
    #[error("Request submitted to not running queue.")]
    NotAccepting,
}
