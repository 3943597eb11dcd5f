use std::time::Duration;

pub const INVALID_FILE_ID: FileId = u64::MAX; // invalid file id
pub const INVALID_OFFSET: u64 = u64::MAX; // invalid byte offset

/// Default advisory bound on simultaneously posted requests per queue.
pub const DEFAULT_MAX_SIM_REQUESTS: usize = 64;

/// How long the I/O worker sleeps when it must stall with nothing posted.
pub const DEFAULT_SUSPEND_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub type FileId = u64; // file id type
pub type Offset = u64; // byte offset type
