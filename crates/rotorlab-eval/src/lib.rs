//! Evaluation layer: design problems, external simulators and feasibility sampling.
//!
//! This crate connects the pure transforms of `rotorlab-design` to the outside world. The
//! physics simulator and the wind-farm simulator are opaque collaborators reached through
//! the traits in [`simulator`]; the usual implementation is a [`worker::WorkerClient`]
//! talking to a separate process over its stdin/stdout.
//!
//! # Architecture
//!
//! ```text
//! Optimizer / sampler (normalized vectors)
//!     ↓
//! problem::Problem (objective + constraint margins)
//!     ├─ AirframeProblem ──→ FlightSimulator + AirframeAnalyzer (worker process)
//!     ├─ WindFarmProblem ──→ WindFarmContext ──→ WindFarmSimulator (worker process)
//!     └─ ToyProblem       (in-process test function)
//!     ↓
//! problem::evaluate_with (constraint handling)   feasibility::run_feasibility (Monte Carlo)
//! ```
//!
//! # Errors
//!
//! Malformed design vectors surface as [`EvalError::Design`]. Failures of external
//! collaborators are propagated as they are, wrapped but never retried.

pub mod feasibility;
pub mod problem;
pub mod simulator;
pub mod worker;

use rotorlab_design::DesignError;

use crate::worker::WorkerError;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EvalError {
    #[display("invalid design vector")]
    #[from]
    Design(DesignError),
    #[display("simulator worker failed")]
    #[from]
    Worker(WorkerError),
    #[display("simulator failed: {message}")]
    Simulator { message: String },
    #[display("invalid sampler: {reason}")]
    InvalidSampler { reason: String },
}
