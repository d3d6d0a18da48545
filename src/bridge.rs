//! Main-loop side of the pipeline.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::core::Result;
use crate::events::{CommandListener, SubscriptionRegistry};
use crate::queue::CommandQueue;

/// Owns the subscription registry and the consuming end of the queue.
///
/// Lives on the host's single-threaded update loop. Hand [`queue`](Self::queue)
/// to the network side; call [`tick`](Self::tick) once per frame.
#[derive(Debug, Default)]
pub struct CommandBridge {
    queue: CommandQueue,
    registry: SubscriptionRegistry,
}

impl CommandBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(queue: CommandQueue) -> Self {
        Self {
            queue,
            registry: SubscriptionRegistry::new(),
        }
    }

    /// Producer handle sharing this bridge's queue.
    pub fn queue(&self) -> CommandQueue {
        self.queue.clone()
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn subscribe<L>(&mut self, listener: Rc<RefCell<L>>) -> bool
    where
        L: CommandListener + 'static,
    {
        self.registry.subscribe(listener)
    }

    pub fn unsubscribe<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: CommandListener + ?Sized,
    {
        self.registry.unsubscribe(listener)
    }

    /// Drains the queue and notifies every listener once per record, in
    /// arrival order. Listeners run after the queue lock is released.
    ///
    /// Returns the number of records drained.
    pub fn tick(&self) -> Result<usize> {
        let records = self.queue.drain()?;
        for record in &records {
            debug!(
                command = record.command(),
                strength = record.strength(),
                timestamp = record.timestamp(),
                "processing command"
            );
            self.registry.notify(record.command(), record.strength());
        }
        Ok(records.len())
    }
}
