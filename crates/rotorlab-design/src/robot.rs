//! Validated multirotor airframe configuration.
//!
//! [`RobotParameter`] is the value handed to the flight simulator. It is built fresh from a
//! design vector on every evaluation (see [`crate::airframe`]) and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::{DesignError, bounds::Bounds};

/// Standard gravity used for hover thrust.
pub const GRAVITY: f64 = 9.81;

/// Spin direction of a rotor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum MotorDirection {
    CounterClockwise,
    Clockwise,
}

impl MotorDirection {
    /// Returns `+1` for [`MotorDirection::CounterClockwise`] and `-1` for
    /// [`MotorDirection::Clockwise`].
    #[must_use]
    pub fn sign(self) -> i8 {
        match self {
            Self::CounterClockwise => 1,
            Self::Clockwise => -1,
        }
    }

    /// Direction pattern for `rotor_count` rotors: `+1, -1` repeated, with a trailing `+1`
    /// when the count is odd.
    ///
    /// ```
    /// use rotorlab_design::robot::MotorDirection;
    ///
    /// let signs: Vec<i8> = MotorDirection::alternating(5).into_iter().map(|d| d.sign()).collect();
    /// assert_eq!(signs, [1, -1, 1, -1, 1]);
    /// ```
    #[must_use]
    pub fn alternating(rotor_count: usize) -> Vec<Self> {
        let mut directions = Vec::with_capacity(rotor_count);
        for _ in 0..rotor_count / 2 {
            directions.push(Self::CounterClockwise);
            directions.push(Self::Clockwise);
        }
        if rotor_count % 2 == 1 {
            directions.push(Self::CounterClockwise);
        }
        directions
    }
}

impl From<MotorDirection> for i8 {
    fn from(direction: MotorDirection) -> Self {
        direction.sign()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("motor direction must be 1 or -1, got {_0}")]
pub struct InvalidDirectionError(#[error(not(source))] pub i8);

impl TryFrom<i8> for MotorDirection {
    type Error = InvalidDirectionError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::CounterClockwise),
            -1 => Ok(Self::Clockwise),
            _ => Err(InvalidDirectionError(value)),
        }
    }
}

/// Scalar properties of an airframe that are not encoded in the design vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotDefaults {
    /// Frame mass in kilograms.
    pub frame_mass: f64,
    /// Rotor drag/torque coefficient.
    pub cq: f64,
    /// Mass of each motor in kilograms.
    pub motor_mass: f64,
    /// Upper actuator bound.
    pub max_u: f64,
    /// Lower actuator bound.
    pub min_u: f64,
}

impl Default for RobotDefaults {
    fn default() -> Self {
        Self {
            frame_mass: 0.5,
            cq: 0.1,
            motor_mass: 0.1,
            max_u: 20.0,
            min_u: 0.0,
        }
    }
}

/// Multirotor airframe configuration.
///
/// Invariants checked by [`RobotParameter::new`]:
///
/// - all per-rotor sequences have the same, non-zero length
/// - every translation component is in `[-1, 1]`
/// - every orientation component (degrees, xyz Euler order) is in `[0, 360)`
/// - masses are finite and non-negative, `0 < max_u` and `min_u <= max_u`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRobotParameter")]
pub struct RobotParameter {
    frame_mass: f64,
    cq: f64,
    motor_masses: Vec<f64>,
    motor_translations: Vec<[f64; 3]>,
    motor_orientations: Vec<[f64; 3]>,
    motor_directions: Vec<MotorDirection>,
    max_u: f64,
    min_u: f64,
}

/// Per-rotor geometry and mass, the part of a [`RobotParameter`] that varies per rotor.
#[derive(Debug, Clone, PartialEq)]
pub struct RotorSet {
    pub masses: Vec<f64>,
    pub translations: Vec<[f64; 3]>,
    pub orientations: Vec<[f64; 3]>,
    pub directions: Vec<MotorDirection>,
}

impl RobotParameter {
    pub fn new(defaults: &RobotDefaults, rotors: RotorSet) -> Result<Self, DesignError> {
        let RotorSet {
            masses,
            translations,
            orientations,
            directions,
        } = rotors;
        let robot = Self {
            frame_mass: defaults.frame_mass,
            cq: defaults.cq,
            motor_masses: masses,
            motor_translations: translations,
            motor_orientations: orientations,
            motor_directions: directions,
            max_u: defaults.max_u,
            min_u: defaults.min_u,
        };
        robot.validate()?;
        Ok(robot)
    }

    fn validate(&self) -> Result<(), DesignError> {
        let n = self.motor_masses.len();
        if n == 0 {
            return Err(DesignError::EmptyEncoding);
        }
        if self.motor_translations.len() != n
            || self.motor_orientations.len() != n
            || self.motor_directions.len() != n
        {
            return Err(DesignError::InconsistentRotorData);
        }

        let invalid = |reason: String| Err(DesignError::InvalidRobot { reason });

        if !is_mass(self.frame_mass) {
            return invalid(format!("frame mass {} is not a mass", self.frame_mass));
        }
        if !self.cq.is_finite() {
            return invalid(format!("cq {} is not finite", self.cq));
        }
        if !(self.max_u.is_finite() && self.min_u.is_finite())
            || self.max_u <= 0.0
            || self.min_u > self.max_u
        {
            return invalid(format!(
                "actuator bounds [{}, {}] are invalid",
                self.min_u, self.max_u
            ));
        }
        for (i, &mass) in self.motor_masses.iter().enumerate() {
            if !is_mass(mass) {
                return invalid(format!("motor {i} mass {mass} is not a mass"));
            }
        }
        for (i, t) in self.motor_translations.iter().enumerate() {
            if !t.iter().all(|&c| Bounds::TRANSLATION.contains(c)) {
                return invalid(format!("motor {i} translation {t:?} outside [-1, 1]"));
            }
        }
        for (i, o) in self.motor_orientations.iter().enumerate() {
            if !o.iter().all(|&c| (0.0..360.0).contains(&c)) {
                return invalid(format!("motor {i} orientation {o:?} outside [0, 360)"));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn rotor_count(&self) -> usize {
        self.motor_masses.len()
    }

    #[must_use]
    pub fn frame_mass(&self) -> f64 {
        self.frame_mass
    }

    #[must_use]
    pub fn cq(&self) -> f64 {
        self.cq
    }

    #[must_use]
    pub fn motor_masses(&self) -> &[f64] {
        &self.motor_masses
    }

    #[must_use]
    pub fn motor_translations(&self) -> &[[f64; 3]] {
        &self.motor_translations
    }

    #[must_use]
    pub fn motor_orientations(&self) -> &[[f64; 3]] {
        &self.motor_orientations
    }

    #[must_use]
    pub fn motor_directions(&self) -> &[MotorDirection] {
        &self.motor_directions
    }

    #[must_use]
    pub fn max_u(&self) -> f64 {
        self.max_u
    }

    #[must_use]
    pub fn min_u(&self) -> f64 {
        self.min_u
    }

    /// Frame mass plus all motor masses.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.frame_mass + self.motor_masses.iter().sum::<f64>()
    }

    /// Per-rotor normalized actuator command that compensates gravity when every rotor
    /// shares the load equally and points straight up.
    ///
    /// Each entry is `GRAVITY * total_mass / rotor_count / max_u`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hover_command(&self) -> Vec<f64> {
        let n = self.rotor_count();
        let per_rotor = GRAVITY * self.total_mass() / n as f64 / self.max_u;
        vec![per_rotor; n]
    }
}

fn is_mass(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[derive(Deserialize)]
struct RawRobotParameter {
    frame_mass: f64,
    cq: f64,
    motor_masses: Vec<f64>,
    motor_translations: Vec<[f64; 3]>,
    motor_orientations: Vec<[f64; 3]>,
    motor_directions: Vec<MotorDirection>,
    max_u: f64,
    min_u: f64,
}

impl TryFrom<RawRobotParameter> for RobotParameter {
    type Error = DesignError;

    fn try_from(raw: RawRobotParameter) -> Result<Self, Self::Error> {
        let defaults = RobotDefaults {
            frame_mass: raw.frame_mass,
            cq: raw.cq,
            // per-motor masses come from the rotor set below
            motor_mass: 0.0,
            max_u: raw.max_u,
            min_u: raw.min_u,
        };
        Self::new(
            &defaults,
            RotorSet {
                masses: raw.motor_masses,
                translations: raw.motor_translations,
                orientations: raw.motor_orientations,
                directions: raw.motor_directions,
            },
        )
    }
}
