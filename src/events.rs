//! Explicit "command received" multicast.
//!
//! Listeners live on the main-loop thread, so the registry holds them as
//! `Rc<RefCell<_>>`. Identity is the allocation: subscribing the same
//! listener twice is a no-op and it is notified once per command.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

/// Receiver of drained commands.
pub trait CommandListener {
    fn on_command(&mut self, label: &str, strength: f32);
}

impl<F> CommandListener for F
where
    F: FnMut(&str, f32),
{
    fn on_command(&mut self, label: &str, strength: f32) {
        self(label, strength)
    }
}

type SharedListener = Rc<RefCell<dyn CommandListener>>;

#[derive(Default)]
pub struct SubscriptionRegistry {
    listeners: Vec<SharedListener>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. Returns `false` if it was already registered.
    pub fn subscribe<L>(&mut self, listener: Rc<RefCell<L>>) -> bool
    where
        L: CommandListener + 'static,
    {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Removes `listener`. Returns `false` if it was not registered.
    pub fn unsubscribe<L>(&mut self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: CommandListener + ?Sized,
    {
        let before = self.listeners.len();
        let target = Rc::as_ptr(listener).cast::<()>();
        self.listeners
            .retain(|existing| Rc::as_ptr(existing).cast::<()>() != target);
        self.listeners.len() != before
    }

    pub fn contains<L>(&self, listener: &Rc<RefCell<L>>) -> bool
    where
        L: CommandListener + ?Sized,
    {
        let target = Rc::as_ptr(listener).cast::<()>();
        self.listeners
            .iter()
            .any(|existing| Rc::as_ptr(existing).cast::<()>() == target)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers one command to every listener in registration order.
    ///
    /// Returns how many listeners received it. A listener that is already
    /// borrowed (re-entrant delivery) is skipped.
    pub fn notify(&self, label: &str, strength: f32) -> usize {
        let mut delivered = 0;
        for listener in &self.listeners {
            match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    listener.on_command(label, strength);
                    delivered += 1;
                }
                Err(_) => warn!(label, "listener busy, skipping re-entrant delivery"),
            }
        }
        delivered
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
