// ============================================================================
// BCI Bridge Library
// ============================================================================

pub mod bridge;
pub mod clock;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod events;
pub mod queue;
pub mod server;

// Re-export main types for convenience
pub use bridge::CommandBridge;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::BridgeConfig;
pub use crate::core::{BridgeError, CommandRecord, MentalCommand, Result, Vec3};
pub use events::{CommandListener, SubscriptionRegistry};
pub use queue::CommandQueue;

// Re-export dispatch API
pub use dispatch::{
    Actuation, Actuator, CommandDispatcher, DispatchConfig, DispatchOutcome, GroundSensor,
    RecordingActuator,
};

// Re-export transport API
pub use server::{ApiError, CommandServer, ServerConfig, ServerHandle, build_router};

// ============================================================================
// Wiring overview
// ============================================================================

/// Connects a queue, a dispatcher and the main-loop drain in one call.
///
/// The returned dispatcher is already subscribed to the bridge. Start a
/// [`CommandServer`] with `bridge.queue()` to feed it over HTTP, or push
/// records directly as below.
///
/// # Examples
///
/// ```
/// use bci_bridge::{CommandRecord, DispatchConfig, RecordingActuator, attach_dispatcher};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (bridge, player) = attach_dispatcher(DispatchConfig::default(), RecordingActuator::new())?;
///
/// bridge.queue().push(CommandRecord::new("left", 0.8, 0))?;
/// bridge.tick()?;
///
/// assert_eq!(player.borrow().actuator().actuations().len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn attach_dispatcher<A>(
    config: DispatchConfig,
    actuator: A,
) -> Result<(
    CommandBridge,
    std::rc::Rc<std::cell::RefCell<CommandDispatcher<A>>>,
)>
where
    A: Actuator + 'static,
{
    let dispatcher = CommandDispatcher::new(config, actuator)?;
    let dispatcher = std::rc::Rc::new(std::cell::RefCell::new(dispatcher));

    let mut bridge = CommandBridge::new();
    bridge.subscribe(dispatcher.clone());
    Ok((bridge, dispatcher))
}
