pub mod command;
pub mod error;
pub mod math;

pub use command::{CommandRecord, MentalCommand};
pub use error::{BridgeError, Result};
pub use math::Vec3;
