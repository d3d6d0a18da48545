use tracing::debug;

use crate::core::Vec3;

/// Physics capability of an actuatable entity.
///
/// Implementations forward to whatever body the host simulates; nothing here
/// integrates motion.
pub trait Actuator {
    /// Continuous force for the current physics step.
    fn apply_directional_force(&mut self, direction: Vec3, magnitude: f32);

    /// Instantaneous velocity change.
    fn apply_impulse(&mut self, direction: Vec3, magnitude: f32);

    fn is_grounded(&self) -> bool;
}

/// One call made against an [`Actuator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Actuation {
    Force { direction: Vec3, magnitude: f32 },
    Impulse { direction: Vec3, magnitude: f32 },
}

impl Actuation {
    pub fn direction(&self) -> Vec3 {
        match self {
            Actuation::Force { direction, .. } | Actuation::Impulse { direction, .. } => *direction,
        }
    }

    pub fn magnitude(&self) -> f32 {
        match self {
            Actuation::Force { magnitude, .. } | Actuation::Impulse { magnitude, .. } => *magnitude,
        }
    }

    pub fn apply_to<A: Actuator + ?Sized>(&self, actuator: &mut A) {
        match *self {
            Actuation::Force {
                direction,
                magnitude,
            } => actuator.apply_directional_force(direction, magnitude),
            Actuation::Impulse {
                direction,
                magnitude,
            } => actuator.apply_impulse(direction, magnitude),
        }
    }
}

/// Tracks contact with the designated ground surface.
///
/// Contact begin/end events for any other surface tag are ignored.
#[derive(Debug, Clone)]
pub struct GroundSensor {
    ground_tag: String,
    grounded: bool,
}

impl GroundSensor {
    pub const DEFAULT_TAG: &'static str = "Ground";

    pub fn new(ground_tag: impl Into<String>) -> Self {
        Self {
            ground_tag: ground_tag.into(),
            grounded: false,
        }
    }

    pub fn contact_begin(&mut self, surface_tag: &str) {
        if surface_tag == self.ground_tag {
            self.grounded = true;
            debug!("grounded");
        }
    }

    pub fn contact_end(&mut self, surface_tag: &str) {
        if surface_tag == self.ground_tag {
            self.grounded = false;
            debug!("airborne");
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }
}

impl Default for GroundSensor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TAG)
    }
}

/// Actuator that keeps every call it receives.
///
/// Used by the demo binary and by tests; a game host supplies its own
/// implementation backed by a rigid body.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    ground: GroundSensor,
    actuations: Vec<Actuation>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ground(ground: GroundSensor) -> Self {
        Self {
            ground,
            actuations: Vec::new(),
        }
    }

    pub fn ground_mut(&mut self) -> &mut GroundSensor {
        &mut self.ground
    }

    pub fn actuations(&self) -> &[Actuation] {
        &self.actuations
    }

    /// Takes the recorded calls, leaving the log empty.
    pub fn take_actuations(&mut self) -> Vec<Actuation> {
        std::mem::take(&mut self.actuations)
    }
}

impl Actuator for RecordingActuator {
    fn apply_directional_force(&mut self, direction: Vec3, magnitude: f32) {
        self.actuations.push(Actuation::Force {
            direction,
            magnitude,
        });
    }

    fn apply_impulse(&mut self, direction: Vec3, magnitude: f32) {
        self.actuations.push(Actuation::Impulse {
            direction,
            magnitude,
        });
    }

    fn is_grounded(&self) -> bool {
        self.ground.is_grounded()
    }
}
