//! Design-vector decoding and feasibility margins for airframe and wind-farm layouts.
//!
//! Every optimizer used with this project speaks one language: flat vectors of values in
//! `[0.0, 1.0]`. This crate turns those vectors into physical configurations and scores
//! them without touching any simulator.
//!
//! # Pipeline
//!
//! ```text
//! Normalized design vector ([0,1]^d)
//!     ↓ bounds::Bounds (linear rescale, rejects out-of-range input)
//!     ├─ airframe::SymmetricEncoding / UnconstrainedEncoding
//!     │      ↓
//!     │  robot::RobotParameter ──→ external flight simulator ──→ objective::weighted_tracking_error
//!     └─ turbine::TerrainConfig
//!            ↓
//!        turbine::TurbineLayout ──→ constraint::LayoutConstraints (margins)
//!                               └─→ external wind-farm simulator ──→ objective::farm_power_objective
//! ```
//!
//! # Modules
//!
//! - [`bounds`] - Linear mapping from `[0, 1]` to a physical range
//! - [`robot`] - Validated multirotor configuration ([`robot::RobotParameter`])
//! - [`airframe`] - Symmetric and per-rotor airframe encodings
//! - [`turbine`] - Turbine layout decoding on a square terrain
//! - [`constraint`] - Separation, quadrant-balance and forbidden-zone margins
//! - [`objective`] - Reductions from simulator output to scalar objectives
//!
//! # Constraint Margins
//!
//! Constraint functions never fail on infeasible designs. They return real-valued margins
//! where a positive value means satisfied and a non-positive value means violated, so that
//! penalty-based and gradient-aware constraint handlers can use the magnitude.
//!
//! # Example
//!
//! ```
//! use rotorlab_design::{airframe::SymmetricEncoding, robot::RobotDefaults};
//!
//! let encoding = SymmetricEncoding::hexarotor();
//! let robot = encoding.decode(&[0.5; 15], &RobotDefaults::default()).unwrap();
//! assert_eq!(robot.rotor_count(), 6);
//! ```

pub mod airframe;
pub mod bounds;
pub mod constraint;
pub mod objective;
pub mod robot;
pub mod turbine;

/// Errors raised when a design vector or configuration is malformed.
///
/// Infeasible designs are not errors; see [`constraint`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum DesignError {
    #[display("expected a design vector of length {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[display("design vector component {index} is {value}, expected a value in [0, 1]")]
    OutOfRange { index: usize, value: f64 },
    #[display("invalid bounds [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },
    #[display("encoding must describe at least one rotor")]
    EmptyEncoding,
    #[display("per-rotor data has inconsistent lengths")]
    InconsistentRotorData,
    #[display("invalid robot parameter: {reason}")]
    InvalidRobot { reason: String },
}
