//! Contracts of the external simulators.
//!
//! Implementations live outside this workspace (GPU physics environment, wind-farm
//! simulator). [`crate::worker::WorkerClient`] implements all three traits by forwarding
//! calls to a worker process.

use std::fmt;

use rotorlab_design::{
    objective::{self, Pose},
    robot::RobotParameter,
    turbine::TurbineLayout,
};
use serde::{Deserialize, Serialize};

use crate::EvalError;

/// Output of one simulated episode. An episode that was reset early has fewer steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub rewards: Vec<f64>,
    pub poses: Vec<Pose>,
}

/// Flies a robot toward a target point and reports per-step rewards and poses.
pub trait FlightSimulator: fmt::Debug + Send {
    fn run_episode(
        &mut self,
        robot: &RobotParameter,
        target: [f64; 3],
    ) -> Result<Episode, EvalError>;
}

/// External airframe feasibility analysis, returning two margins (positive = feasible).
pub trait AirframeAnalyzer: fmt::Debug + Send {
    fn analyze(&mut self, robot: &RobotParameter) -> Result<[f64; 2], EvalError>;
}

/// Computes the total power output of a turbine layout.
pub trait WindFarmSimulator: fmt::Debug + Send {
    fn farm_power(&mut self, layout: &TurbineLayout) -> Result<f64, EvalError>;
}

/// Owns a wind-farm simulator for the duration of an experiment.
///
/// The simulator keeps internal state between runs, so every evaluation goes through
/// `&mut self`; callers that parallelize must give each thread its own context.
#[derive(Debug)]
pub struct WindFarmContext<S> {
    simulator: S,
    evaluations: usize,
}

impl<S> WindFarmContext<S>
where
    S: WindFarmSimulator,
{
    pub fn new(simulator: S) -> Self {
        Self {
            simulator,
            evaluations: 0,
        }
    }

    /// Runs the simulator on `layout` and returns the raw farm power.
    pub fn power(&mut self, layout: &TurbineLayout) -> Result<f64, EvalError> {
        let power = self.simulator.farm_power(layout)?;
        self.evaluations += 1;
        tracing::debug!(power, evaluations = self.evaluations, "wind farm evaluated");
        Ok(power)
    }

    /// Minimization objective of `layout`: `-power / 1e7`.
    pub fn evaluate(&mut self, layout: &TurbineLayout) -> Result<f64, EvalError> {
        self.power(layout).map(objective::farm_power_objective)
    }

    /// Number of successful simulator runs so far.
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Ends the context and hands the simulator back.
    pub fn into_inner(self) -> S {
        self.simulator
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process stand-ins for the external simulators.

    use super::*;

    /// Reports the sum of all x coordinates as power, or fails on demand.
    #[derive(Debug, Default)]
    pub(crate) struct FakeWindFarm {
        pub(crate) fail: bool,
        pub(crate) runs: usize,
    }

    impl WindFarmSimulator for FakeWindFarm {
        fn farm_power(&mut self, layout: &TurbineLayout) -> Result<f64, EvalError> {
            if self.fail {
                return Err(EvalError::Simulator {
                    message: "license server unreachable".to_owned(),
                });
            }
            self.runs += 1;
            Ok(layout.positions().iter().map(|p| p[0]).sum::<f64>() * 1e4)
        }
    }

    /// Moves straight to the target over `steps` steps, starting at the origin.
    #[derive(Debug)]
    pub(crate) struct FakeFlight {
        pub(crate) steps: usize,
        pub(crate) margins: [f64; 2],
        pub(crate) episodes: usize,
        pub(crate) analyses: usize,
    }

    impl FakeFlight {
        pub(crate) fn new(steps: usize, margins: [f64; 2]) -> Self {
            Self {
                steps,
                margins,
                episodes: 0,
                analyses: 0,
            }
        }
    }

    impl FlightSimulator for FakeFlight {
        #[expect(clippy::cast_precision_loss)]
        fn run_episode(
            &mut self,
            robot: &RobotParameter,
            target: [f64; 3],
        ) -> Result<Episode, EvalError> {
            self.episodes += 1;
            let n = self.steps;
            let poses = (0..n)
                .map(|i| {
                    let t = if n <= 1 { 1.0 } else { i as f64 / (n - 1) as f64 };
                    [
                        target[0] * t,
                        target[1] * t,
                        target[2] * t,
                        0.0,
                        0.0,
                        0.0,
                        1.0,
                    ]
                })
                .collect();
            Ok(Episode {
                rewards: vec![-robot.total_mass(); n],
                poses,
            })
        }
    }

    impl AirframeAnalyzer for FakeFlight {
        fn analyze(&mut self, _robot: &RobotParameter) -> Result<[f64; 2], EvalError> {
            self.analyses += 1;
            Ok(self.margins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::FakeWindFarm, *};

    fn layout() -> TurbineLayout {
        TurbineLayout::from_positions(vec![[100.0, 0.0], [400.0, 0.0]])
    }

    #[test]
    fn test_context_objective_is_negated_and_scaled() {
        let mut context = WindFarmContext::new(FakeWindFarm::default());
        assert_eq!(context.power(&layout()).unwrap(), 5e6);
        assert_eq!(context.evaluate(&layout()).unwrap(), -0.5);
        assert_eq!(context.evaluations(), 2);
        assert_eq!(context.into_inner().runs, 2);
    }

    #[test]
    fn test_context_propagates_simulator_failure() {
        let mut context = WindFarmContext::new(FakeWindFarm {
            fail: true,
            runs: 0,
        });
        let err = context.evaluate(&layout()).unwrap_err();
        assert!(
            matches!(&err, EvalError::Simulator { message } if message == "license server unreachable")
        );
        assert_eq!(context.evaluations(), 0);
    }
}
