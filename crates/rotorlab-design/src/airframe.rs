//! Airframe encodings: from normalized design vectors to [`RobotParameter`].
//!
//! Two encodings are provided:
//!
//! - [`UnconstrainedEncoding`] - six values per rotor, `[r_x, r_y, r_z, euler_x, euler_y, euler_z]`
//! - [`SymmetricEncoding`] - five values per *pair* of rotors, mirrored across a plane
//!
//! Both produce a `rotor_count × 6` matrix of normalized rows ([`NormalizedRotor`]) that is
//! converted to physical units by [`to_robot_parameter`].
//!
//! # Symmetric Encoding
//!
//! The symmetric encoding halves the number of free rotor parameters. For each independent
//! rotor `i`, the five values `(r_x, r_y_half, r_z, euler_x, euler_z)` produce two rows:
//!
//! ```text
//! rotor 2i     (primary):  r_x,  r_y_half / 2,      r_z,  s(euler_x),      0.5,  euler_z
//! rotor 2i + 1 (mirror):   r_x,  1 - r_y_half / 2,  r_z,  s(1 - euler_x),  0.5,  1 - euler_z
//!
//! s(v) = v * E + (0.5 - E / 2),  E = 0.2
//! ```
//!
//! `r_y` of the primary rotor is confined to `[0, 0.5]` and the mirror to `[0.5, 1]`, so
//! each pair straddles the y mirror plane. `s` squeezes the x tilt into `[0.4, 0.6]`, i.e.
//! within ±36° of the mid-range angle once mapped to degrees, and `euler_y` is fixed at
//! mid-range.

use serde::{Deserialize, Serialize};

use crate::{
    DesignError,
    bounds::{self, Bounds},
    robot::{MotorDirection, RobotDefaults, RobotParameter, RotorSet},
};

/// Number of normalized values per rotor in the unconstrained encoding.
pub const VALUES_PER_ROTOR: usize = 6;

/// Number of normalized values per independent rotor in the symmetric encoding.
pub const VALUES_PER_SYMMETRIC_ROTOR: usize = 5;

/// Fraction of the normalized `euler_x` range a symmetric rotor may use.
pub const EULER_X_MAX_PROPORTION: f64 = 0.2;

/// One row of the normalized rotor matrix. Every value is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRotor {
    /// `[r_x, r_y, r_z]`
    pub translation: [f64; 3],
    /// `[euler_x, euler_y, euler_z]`
    pub euler: [f64; 3],
}

impl NormalizedRotor {
    fn from_row(row: &[f64]) -> Self {
        Self {
            translation: [row[0], row[1], row[2]],
            euler: [row[3], row[4], row[5]],
        }
    }

    /// Returns the row as `[r_x, r_y, r_z, euler_x, euler_y, euler_z]`.
    #[must_use]
    pub fn to_row(&self) -> [f64; VALUES_PER_ROTOR] {
        let [tx, ty, tz] = self.translation;
        let [ex, ey, ez] = self.euler;
        [tx, ty, tz, ex, ey, ez]
    }
}

/// Mirror plane of a [`SymmetricEncoding`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetryPlane {
    /// Rotor pairs mirror each other across the plane `r_y = 0`.
    #[default]
    Y,
}

/// Symmetric encoding with `half_rotors` independent rotors and `2 * half_rotors` in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricEncoding {
    half_rotors: usize,
    plane: SymmetryPlane,
}

impl SymmetricEncoding {
    pub fn new(half_rotors: usize, plane: SymmetryPlane) -> Result<Self, DesignError> {
        if half_rotors == 0 {
            return Err(DesignError::EmptyEncoding);
        }
        Ok(Self { half_rotors, plane })
    }

    /// Six rotors mirrored across the y plane, 15 design values.
    #[must_use]
    pub fn hexarotor() -> Self {
        Self {
            half_rotors: 3,
            plane: SymmetryPlane::Y,
        }
    }

    #[must_use]
    pub fn rotor_count(&self) -> usize {
        self.half_rotors * 2
    }

    /// Length of the design vector this encoding accepts.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.half_rotors * VALUES_PER_SYMMETRIC_ROTOR
    }

    /// Expands `x` into the full normalized rotor matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use rotorlab_design::airframe::SymmetricEncoding;
    ///
    /// let rows = SymmetricEncoding::hexarotor().expand(&[0.0; 15]).unwrap();
    /// assert_eq!(rows.len(), 6);
    /// assert_eq!(rows[0].to_row(), [0.0, 0.0, 0.0, 0.4, 0.5, 0.0]);
    /// assert_eq!(rows[1].translation, [0.0, 1.0, 0.0]);
    /// assert!((rows[1].euler[0] - 0.6).abs() < 1e-12);
    /// assert_eq!(rows[1].euler[2], 1.0);
    /// ```
    pub fn expand(&self, x: &[f64]) -> Result<Vec<NormalizedRotor>, DesignError> {
        bounds::validate_length(x, self.dim())?;
        bounds::validate_normalized(x)?;

        let mut rows = Vec::with_capacity(self.rotor_count());
        for half in x.chunks_exact(VALUES_PER_SYMMETRIC_ROTOR) {
            let &[r_x, r_y_half, r_z, euler_x, euler_z] = half else {
                unreachable!("chunks_exact yields full chunks");
            };
            match self.plane {
                SymmetryPlane::Y => {
                    rows.push(NormalizedRotor {
                        translation: [r_x, r_y_half / 2.0, r_z],
                        euler: [scale_down_euler_x(euler_x), 0.5, euler_z],
                    });
                    rows.push(NormalizedRotor {
                        translation: [r_x, 1.0 - r_y_half / 2.0, r_z],
                        euler: [scale_down_euler_x(1.0 - euler_x), 0.5, 1.0 - euler_z],
                    });
                }
            }
        }
        Ok(rows)
    }

    /// Decodes `x` into a robot configuration.
    pub fn decode(
        &self,
        x: &[f64],
        defaults: &RobotDefaults,
    ) -> Result<RobotParameter, DesignError> {
        let rows = self.expand(x)?;
        to_robot_parameter(&rows, defaults)
    }
}

/// Per-rotor encoding: six normalized values for each of `rotors` rotors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnconstrainedEncoding {
    rotors: usize,
}

impl UnconstrainedEncoding {
    pub fn new(rotors: usize) -> Result<Self, DesignError> {
        if rotors == 0 {
            return Err(DesignError::EmptyEncoding);
        }
        Ok(Self { rotors })
    }

    #[must_use]
    pub fn rotor_count(&self) -> usize {
        self.rotors
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.rotors * VALUES_PER_ROTOR
    }

    /// Splits `x` into rows of six values.
    pub fn expand(&self, x: &[f64]) -> Result<Vec<NormalizedRotor>, DesignError> {
        bounds::validate_length(x, self.dim())?;
        bounds::validate_normalized(x)?;
        Ok(x
            .chunks_exact(VALUES_PER_ROTOR)
            .map(NormalizedRotor::from_row)
            .collect())
    }

    pub fn decode(
        &self,
        x: &[f64],
        defaults: &RobotDefaults,
    ) -> Result<RobotParameter, DesignError> {
        let rows = self.expand(x)?;
        to_robot_parameter(&rows, defaults)
    }
}

/// Either airframe encoding, selected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AirframeEncoding {
    Symmetric(SymmetricEncoding),
    Unconstrained(UnconstrainedEncoding),
}

impl AirframeEncoding {
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Self::Symmetric(e) => e.dim(),
            Self::Unconstrained(e) => e.dim(),
        }
    }

    #[must_use]
    pub fn rotor_count(&self) -> usize {
        match self {
            Self::Symmetric(e) => e.rotor_count(),
            Self::Unconstrained(e) => e.rotor_count(),
        }
    }

    pub fn expand(&self, x: &[f64]) -> Result<Vec<NormalizedRotor>, DesignError> {
        match self {
            Self::Symmetric(e) => e.expand(x),
            Self::Unconstrained(e) => e.expand(x),
        }
    }

    pub fn decode(
        &self,
        x: &[f64],
        defaults: &RobotDefaults,
    ) -> Result<RobotParameter, DesignError> {
        let rows = self.expand(x)?;
        to_robot_parameter(&rows, defaults)
    }
}

impl From<SymmetricEncoding> for AirframeEncoding {
    fn from(encoding: SymmetricEncoding) -> Self {
        Self::Symmetric(encoding)
    }
}

impl From<UnconstrainedEncoding> for AirframeEncoding {
    fn from(encoding: UnconstrainedEncoding) -> Self {
        Self::Unconstrained(encoding)
    }
}

fn scale_down_euler_x(euler_x: f64) -> f64 {
    euler_x * EULER_X_MAX_PROPORTION + (0.5 - EULER_X_MAX_PROPORTION / 2.0)
}

/// Converts normalized rotor rows to a [`RobotParameter`].
///
/// - translations: each component mapped to `[-1, 1]`
/// - orientations: each component mapped to `[0, 360]` degrees, then wrapped into `[0, 360)`
/// - directions: `+1, -1` alternating, trailing `+1` for odd rotor counts
/// - masses and scalar properties: taken from `defaults`
pub fn to_robot_parameter(
    rows: &[NormalizedRotor],
    defaults: &RobotDefaults,
) -> Result<RobotParameter, DesignError> {
    // out-of-range errors index into the flattened `rotor_count × 6` matrix
    let flat: Vec<f64> = rows.iter().flat_map(NormalizedRotor::to_row).collect();
    bounds::validate_normalized(&flat)?;

    let mut translations = Vec::with_capacity(rows.len());
    let mut orientations = Vec::with_capacity(rows.len());
    for row in rows {
        translations.push(map3(Bounds::TRANSLATION, row.translation)?);
        let degrees = map3(Bounds::ORIENTATION_DEG, row.euler)?;
        orientations.push(degrees.map(|d| d.rem_euclid(360.0)));
    }

    RobotParameter::new(
        defaults,
        RotorSet {
            masses: vec![defaults.motor_mass; rows.len()],
            translations,
            orientations,
            directions: MotorDirection::alternating(rows.len()),
        },
    )
}

fn map3(bounds: Bounds, values: [f64; 3]) -> Result<[f64; 3], DesignError> {
    let [a, b, c] = values;
    Ok([bounds.map(a)?, bounds.map(b)?, bounds.map(c)?])
}
