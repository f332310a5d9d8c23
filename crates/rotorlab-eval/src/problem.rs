//! Benchmark problems over normalized design vectors, and constraint handling.
//!
//! A [`Problem`] exposes an objective (lower is better) and a list of constraint margins
//! (positive = satisfied) for vectors in `[0, 1]^dim`. [`evaluate_with`] combines the two
//! according to a [`ConstraintMethod`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rotorlab_design::{
    airframe::SymmetricEncoding,
    bounds::{self, Bounds},
    constraint::LayoutConstraints,
    objective::{self, LANGERMANN_BOUNDS},
    robot::{RobotDefaults, RobotParameter},
    turbine::TerrainConfig,
};
use serde::{Deserialize, Serialize};

use crate::{
    EvalError,
    simulator::{AirframeAnalyzer, Episode, FlightSimulator, WindFarmContext, WindFarmSimulator},
};

/// Objective reported for infeasible vectors by [`ConstraintMethod::ConstantPenaltyNoEvaluation`].
pub const CONSTANT_PENALTY: f64 = 1e10;

/// Default target point of the airframe flight task.
pub const DEFAULT_TARGET: [f64; 3] = [2.3, 0.75, 1.5];

pub trait Problem: fmt::Debug + Send {
    /// Short identifier used in logs and records.
    fn name(&self) -> &'static str;

    /// Length of the normalized design vector.
    fn dim(&self) -> usize;

    /// Number of margins returned by [`Problem::constraint_check`].
    fn n_constraints(&self) -> usize;

    fn objective(&mut self, x: &[f64]) -> Result<f64, EvalError>;

    fn constraint_check(&mut self, x: &[f64]) -> Result<Vec<f64>, EvalError>;
}

/// Hexarotor design: symmetric encoding, simulated flight toward a target point, external
/// feasibility analysis.
#[derive(Debug)]
pub struct AirframeProblem<W> {
    encoding: SymmetricEncoding,
    defaults: RobotDefaults,
    target: [f64; 3],
    worker: W,
}

impl<W> AirframeProblem<W>
where
    W: FlightSimulator + AirframeAnalyzer,
{
    pub fn new(worker: W, defaults: RobotDefaults, target: [f64; 3]) -> Self {
        Self {
            encoding: SymmetricEncoding::hexarotor(),
            defaults,
            target,
            worker,
        }
    }

    pub fn robot(&self, x: &[f64]) -> Result<RobotParameter, EvalError> {
        Ok(self.encoding.decode(x, &self.defaults)?)
    }

    /// Runs one episode and returns the objective together with the raw episode.
    pub fn simulate(&mut self, x: &[f64]) -> Result<(f64, Episode), EvalError> {
        let robot = self.robot(x)?;
        let episode = self.worker.run_episode(&robot, self.target)?;
        let f = objective::weighted_tracking_error(self.target, &episode.poses);
        tracing::debug!(f, steps = episode.poses.len(), "episode finished");
        Ok((f, episode))
    }

    pub fn into_inner(self) -> W {
        self.worker
    }
}

impl<W> Problem for AirframeProblem<W>
where
    W: FlightSimulator + AirframeAnalyzer,
{
    fn name(&self) -> &'static str {
        "airframes"
    }

    fn dim(&self) -> usize {
        self.encoding.dim()
    }

    fn n_constraints(&self) -> usize {
        2
    }

    fn objective(&mut self, x: &[f64]) -> Result<f64, EvalError> {
        self.simulate(x).map(|(f, _)| f)
    }

    fn constraint_check(&mut self, x: &[f64]) -> Result<Vec<f64>, EvalError> {
        let robot = self.robot(x)?;
        Ok(self.worker.analyze(&robot)?.to_vec())
    }
}

/// Wind-farm layout: maximize power subject to the three layout constraints.
#[derive(Debug)]
pub struct WindFarmProblem<S> {
    terrain: TerrainConfig,
    constraints: LayoutConstraints,
    context: WindFarmContext<S>,
}

impl<S> WindFarmProblem<S>
where
    S: WindFarmSimulator,
{
    pub fn new(simulator: S, terrain: TerrainConfig, constraints: LayoutConstraints) -> Self {
        Self {
            terrain,
            constraints,
            context: WindFarmContext::new(simulator),
        }
    }

    pub fn context(&self) -> &WindFarmContext<S> {
        &self.context
    }

    pub fn into_inner(self) -> S {
        self.context.into_inner()
    }
}

impl<S> Problem for WindFarmProblem<S>
where
    S: WindFarmSimulator,
{
    fn name(&self) -> &'static str {
        "windflo"
    }

    fn dim(&self) -> usize {
        self.terrain.dim()
    }

    fn n_constraints(&self) -> usize {
        rotorlab_design::constraint::ConstraintMargins::COUNT
    }

    fn objective(&mut self, x: &[f64]) -> Result<f64, EvalError> {
        let layout = self.terrain.decode(x)?;
        self.context.evaluate(&layout)
    }

    fn constraint_check(&mut self, x: &[f64]) -> Result<Vec<f64>, EvalError> {
        let layout = self.terrain.decode(x)?;
        Ok(self.constraints.evaluate(&layout).as_array().to_vec())
    }
}

/// In-process test problem: Langermann function on `[-2, 10]²` with one disc constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToyProblem;

impl ToyProblem {
    fn point(x: &[f64]) -> Result<[f64; 2], EvalError> {
        bounds::validate_length(x, 2)?;
        let (lower, upper) = LANGERMANN_BOUNDS;
        let point = Bounds::new(lower, upper)?.map_slice(x)?;
        Ok([point[0], point[1]])
    }
}

impl Problem for ToyProblem {
    fn name(&self) -> &'static str {
        "toy"
    }

    fn dim(&self) -> usize {
        2
    }

    fn n_constraints(&self) -> usize {
        1
    }

    fn objective(&mut self, x: &[f64]) -> Result<f64, EvalError> {
        Ok(objective::langermann(Self::point(x)?))
    }

    fn constraint_check(&mut self, x: &[f64]) -> Result<Vec<f64>, EvalError> {
        Ok(vec![objective::langermann_constraint(Self::point(x)?)])
    }
}

/// How infeasible vectors are treated by [`evaluate_with`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintMethod {
    /// Evaluate the objective only; constraints are not checked.
    #[default]
    Ignore,
    /// Check constraints first; infeasible vectors get `NaN` without an objective call.
    NanOnUnfeasible,
    /// Check constraints first; infeasible vectors get [`CONSTANT_PENALTY`] without an
    /// objective call.
    ConstantPenaltyNoEvaluation,
}

impl ConstraintMethod {
    pub const ALL: [Self; 3] = [
        Self::Ignore,
        Self::NanOnUnfeasible,
        Self::ConstantPenaltyNoEvaluation,
    ];

    #[must_use]
    pub fn to_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::NanOnUnfeasible => "nan_on_unfeasible",
            Self::ConstantPenaltyNoEvaluation => "constant_penalty_no_evaluation",
        }
    }

    fn infeasible_value(self) -> Option<f64> {
        match self {
            Self::Ignore => None,
            Self::NanOnUnfeasible => Some(f64::NAN),
            Self::ConstantPenaltyNoEvaluation => Some(CONSTANT_PENALTY),
        }
    }
}

impl fmt::Display for ConstraintMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.to_str(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown constraint method `{name}`")]
pub struct ParseConstraintMethodError {
    #[error(not(source))]
    pub name: String,
}

impl FromStr for ConstraintMethod {
    type Err = ParseConstraintMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.to_str() == s)
            .ok_or_else(|| ParseConstraintMethodError { name: s.to_owned() })
    }
}

/// Outcome of evaluating one vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub evaluated_at: DateTime<Utc>,
    /// Objective value, or the substitute assigned to an infeasible vector.
    pub objective: f64,
    /// Constraint margins, `None` when constraints were not checked.
    pub margins: Option<Vec<f64>>,
    pub feasible: Option<bool>,
    /// Whether the objective function was actually called.
    pub objective_evaluated: bool,
}

/// Evaluates `x` on `problem`, handling constraints as `method` prescribes.
///
/// Infeasibility is never an error; only malformed vectors and simulator failures are.
pub fn evaluate_with<P>(
    problem: &mut P,
    method: ConstraintMethod,
    x: &[f64],
) -> Result<Evaluation, EvalError>
where
    P: Problem + ?Sized,
{
    let evaluated_at = Utc::now();
    tracing::debug!(
        problem = problem.name(),
        %method,
        ?x,
        %evaluated_at,
        "evaluating design"
    );

    let Some(infeasible_value) = method.infeasible_value() else {
        let objective = problem.objective(x)?;
        return Ok(Evaluation {
            evaluated_at,
            objective,
            margins: None,
            feasible: None,
            objective_evaluated: true,
        });
    };

    let margins = problem.constraint_check(x)?;
    let feasible = margins.iter().all(|&m| m > 0.0);
    let (objective, objective_evaluated) = if feasible {
        (problem.objective(x)?, true)
    } else {
        tracing::debug!(problem = problem.name(), ?margins, "infeasible design skipped");
        (infeasible_value, false)
    };
    Ok(Evaluation {
        evaluated_at,
        objective,
        margins: Some(margins),
        feasible: Some(feasible),
        objective_evaluated,
    })
}

#[cfg(test)]
mod tests {
    use rotorlab_design::DesignError;

    use super::*;
    use crate::simulator::testing::{FakeFlight, FakeWindFarm};

    #[test]
    fn test_constraint_method_names() {
        for method in ConstraintMethod::ALL {
            assert_eq!(method.to_string().parse::<ConstraintMethod>(), Ok(method));
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{method}\""));
        }
        assert!("algo_specific".parse::<ConstraintMethod>().is_err());
    }

    #[test]
    fn test_toy_maps_to_langermann_domain() {
        let mut toy = ToyProblem;
        // normalized (1/6, 1/4) is (0, 1) in problem coordinates
        let margins = toy.constraint_check(&[1.0 / 6.0, 0.25]).unwrap();
        assert!((margins[0] - (20.048_95 - 4.0 - 4.0)).abs() < 1e-9);
        assert!(toy.constraint_check(&[1.0, 1.0]).unwrap()[0] < 0.0);
        assert!(toy.objective(&[0.5, 0.5]).unwrap().is_finite());
    }

    #[test]
    fn test_toy_rejects_bad_vectors() {
        let mut toy = ToyProblem;
        assert!(matches!(
            toy.objective(&[0.5]),
            Err(EvalError::Design(DesignError::InvalidLength { .. }))
        ));
        assert!(matches!(
            toy.objective(&[0.5, 1.5]),
            Err(EvalError::Design(DesignError::OutOfRange { index: 1, .. }))
        ));
    }

    #[test]
    fn test_ignore_skips_constraints() {
        let mut toy = ToyProblem;
        let eval = evaluate_with(&mut toy, ConstraintMethod::Ignore, &[1.0, 1.0]).unwrap();
        assert!(eval.objective_evaluated);
        assert_eq!(eval.margins, None);
        assert_eq!(eval.feasible, None);
        assert_eq!(eval.objective, toy.objective(&[1.0, 1.0]).unwrap());
    }

    #[test]
    fn test_infeasible_substitutes() {
        let mut toy = ToyProblem;
        let nan = evaluate_with(&mut toy, ConstraintMethod::NanOnUnfeasible, &[1.0, 1.0]).unwrap();
        assert!(nan.objective.is_nan());
        assert_eq!(nan.feasible, Some(false));
        assert!(!nan.objective_evaluated);

        let penalty = evaluate_with(
            &mut toy,
            ConstraintMethod::ConstantPenaltyNoEvaluation,
            &[1.0, 1.0],
        )
        .unwrap();
        assert_eq!(penalty.objective, CONSTANT_PENALTY);
        assert!(!penalty.objective_evaluated);
    }

    #[test]
    fn test_feasible_is_evaluated() {
        let mut toy = ToyProblem;
        let x = [1.0 / 6.0, 0.25];
        let eval = evaluate_with(&mut toy, ConstraintMethod::NanOnUnfeasible, &x).unwrap();
        assert_eq!(eval.feasible, Some(true));
        assert!(eval.objective_evaluated);
        assert_eq!(eval.objective, toy.objective(&x).unwrap());
    }

    #[test]
    fn test_airframe_problem_with_fake_worker() {
        let mut problem = AirframeProblem::new(
            FakeFlight::new(3, [0.2, -0.1]),
            RobotDefaults::default(),
            DEFAULT_TARGET,
        );
        assert_eq!(problem.dim(), 15);
        assert_eq!(problem.n_constraints(), 2);

        let x = [0.5; 15];
        // poses at 0, target/2, target: 1 * |target|/2 + 2 * 0
        let norm = DEFAULT_TARGET.iter().map(|v| v * v).sum::<f64>().sqrt();
        let f = problem.objective(&x).unwrap();
        assert!((f - norm / 2.0).abs() < 1e-12);

        let eval = evaluate_with(
            &mut problem,
            ConstraintMethod::ConstantPenaltyNoEvaluation,
            &x,
        )
        .unwrap();
        assert_eq!(eval.margins, Some(vec![0.2, -0.1]));
        assert_eq!(eval.objective, CONSTANT_PENALTY);

        let fake = problem.into_inner();
        assert_eq!(fake.episodes, 1);
        assert_eq!(fake.analyses, 1);
    }

    #[test]
    fn test_airframe_problem_rejects_short_vector() {
        let mut problem = AirframeProblem::new(
            FakeFlight::new(3, [1.0, 1.0]),
            RobotDefaults::default(),
            DEFAULT_TARGET,
        );
        assert!(matches!(
            problem.objective(&[0.5; 14]),
            Err(EvalError::Design(DesignError::InvalidLength {
                expected: 15,
                actual: 14
            }))
        ));
    }

    #[test]
    fn test_wind_farm_problem() {
        let terrain = TerrainConfig {
            side_length: 2000.0,
            turbine_count: 2,
        };
        let mut problem =
            WindFarmProblem::new(FakeWindFarm::default(), terrain, LayoutConstraints::default());
        assert_eq!(problem.dim(), 4);
        assert_eq!(problem.n_constraints(), 3);

        // (100, 100) and (1900, 1900): far apart, separate quadrants, far from the zone
        let x = [0.05, 0.05, 0.95, 0.95];
        let margins = problem.constraint_check(&x).unwrap();
        assert_eq!(margins.len(), 3);

        let f = problem.objective(&x).unwrap();
        assert!((f - (-(2000.0 * 1e4) / 1e7)).abs() < 1e-12);
        assert_eq!(problem.context().evaluations(), 1);
    }
}
