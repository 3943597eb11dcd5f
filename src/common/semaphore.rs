use parking_lot::{Condvar, Mutex};

/// Counting semaphore built on a mutex-guarded counter and a condvar.
///
/// Producers `post` once per unit of work; the consumer `wait`s, blocking
/// while the count is zero. `try_wait` is the non-blocking probe used where
/// the caller must not sleep (cancellation).
pub struct Semaphore {
    count: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }

    /// Increments the count and wakes one waiter.
    pub fn post(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.cond.notify_one();
    }

    /// Blocks until the count is positive, then decrements it.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.cond.wait(&mut count);
        }
        *count -= 1;
    }

    /// Decrements the count if it is positive. Never blocks.
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> usize {
        *self.count.lock()
    }
}
