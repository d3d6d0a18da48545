//! Cross-thread command handoff.
//!
//! The queue is the only channel between the network thread and the main
//! loop. Producers push one record at a time; the single consumer takes the
//! whole backlog at once.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::core::{CommandRecord, Result};

/// Unbounded, insertion-ordered FIFO of [`CommandRecord`]s behind one lock.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<CommandRecord>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. O(1) while holding the lock.
    pub fn push(&self, record: CommandRecord) -> Result<()> {
        let mut queue = self.inner.lock()?;
        queue.push_back(record);
        debug!(queued = queue.len(), "command enqueued");
        Ok(())
    }

    /// Removes and returns every queued record in arrival order.
    ///
    /// The lock is held only for the swap; an empty queue returns an empty
    /// vector without waiting on anything but the lock itself.
    pub fn drain(&self) -> Result<Vec<CommandRecord>> {
        let taken = {
            let mut queue = self.inner.lock()?;
            std::mem::take(&mut *queue)
        };
        Ok(taken.into())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.inner.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
