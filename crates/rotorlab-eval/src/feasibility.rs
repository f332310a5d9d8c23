//! Monte Carlo estimate of how much of the design space satisfies each constraint.
//!
//! Vectors are drawn from a [`Sampler`], passed through [`Problem::constraint_check`], and
//! tallied per constraint and per feasibility region. A region is the set of constraints a
//! vector satisfies, encoded as a bitmask (bit `i` set when margin `i` is positive), so a
//! problem with `m` constraints has `2^m` regions and region `2^m - 1` is the feasible set.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg64Mcg;
//! use rotorlab_eval::{
//!     feasibility::{self, Sampler},
//!     problem::ToyProblem,
//! };
//!
//! let mut rng = Pcg64Mcg::seed_from_u64(42);
//! let report = feasibility::run_feasibility(&mut ToyProblem, &Sampler::Uniform, 500, &mut rng)
//!     .unwrap();
//! assert_eq!(report.samples, 500);
//! assert!(report.fraction_feasible(0) > 0.0 && report.fraction_feasible(0) < 1.0);
//! ```

use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::Normal;
use rotorlab_design::bounds;
use rotorlab_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};
use serde::{Deserialize, Serialize};

use crate::{EvalError, problem::Problem};

/// Percentile points reported for every margin.
pub const PERCENTILE_POINTS: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

/// Largest constraint count whose regions fit in a `u32` bitmask.
pub const MAX_CONSTRAINTS: usize = 32;

/// Distribution of sampled design vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sampler {
    /// Independent uniform components on `[0, 1]`.
    Uniform,
    /// Gaussian perturbations of `center`, clamped to `[0, 1]`.
    Gaussian { center: Vec<f64>, sigma: f64 },
}

impl Sampler {
    /// Draws one vector of length `dim`.
    pub fn sample<R>(&self, dim: usize, rng: &mut R) -> Result<Vec<f64>, EvalError>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Uniform => Ok((0..dim).map(|_| rng.random_range(0.0..=1.0)).collect()),
            Self::Gaussian { center, sigma } => {
                let normal = gaussian(center, *sigma, dim)?;
                Ok(center
                    .iter()
                    .map(|c| (c + rng.sample(normal)).clamp(0.0, 1.0))
                    .collect())
            }
        }
    }

    /// Checks that the sampler can produce vectors of length `dim`.
    pub fn validate(&self, dim: usize) -> Result<(), EvalError> {
        match self {
            Self::Uniform => Ok(()),
            Self::Gaussian { center, sigma } => gaussian(center, *sigma, dim).map(|_| ()),
        }
    }
}

fn gaussian(center: &[f64], sigma: f64, dim: usize) -> Result<Normal<f64>, EvalError> {
    bounds::validate_length(center, dim)?;
    bounds::validate_normalized(center)?;
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(EvalError::InvalidSampler {
            reason: format!("sigma must be positive and finite, got {sigma}"),
        });
    }
    Normal::new(0.0, sigma).map_err(|e| EvalError::InvalidSampler {
        reason: e.to_string(),
    })
}

/// Distribution of one constraint margin over the finite samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginSummary {
    /// Samples whose margin was infinite or `NaN`; they are left out of the statistics.
    pub non_finite: usize,
    pub stats: Option<DescriptiveStats>,
    pub percentiles: Option<Percentiles>,
}

impl MarginSummary {
    fn from_margins(margins: &[f64]) -> Self {
        let mut finite = margins
            .iter()
            .copied()
            .filter(|m| m.is_finite())
            .collect::<Vec<_>>();
        finite.sort_by(f64::total_cmp);
        let stats = DescriptiveStats::from_sorted(&finite);
        let percentiles =
            (!finite.is_empty()).then(|| Percentiles::from_sorted(&finite, &PERCENTILE_POINTS));
        Self {
            non_finite: margins.len() - finite.len(),
            stats,
            percentiles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub problem: String,
    pub samples: usize,
    /// Number of samples satisfying each constraint.
    pub constraint_feasible: Vec<usize>,
    /// Number of samples satisfying every constraint.
    pub all_feasible: usize,
    /// Sample count per region bitmask; regions never hit are absent.
    pub regions: BTreeMap<u32, usize>,
    pub margins: Vec<MarginSummary>,
}

impl FeasibilityReport {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction_feasible(&self, constraint: usize) -> f64 {
        self.constraint_feasible[constraint] as f64 / self.samples as f64
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction_all_feasible(&self) -> f64 {
        self.all_feasible as f64 / self.samples as f64
    }

    /// Samples in exactly `region`.
    #[must_use]
    pub fn region_count(&self, region: u32) -> usize {
        self.regions.get(&region).copied().unwrap_or(0)
    }
}

/// Human-readable name of a region: the satisfied constraints joined by `&`, or `none`.
///
/// ```
/// use rotorlab_eval::feasibility::region_label;
///
/// assert_eq!(region_label(0b101, 3), "constraint_0&constraint_2");
/// assert_eq!(region_label(0, 3), "none");
/// ```
#[must_use]
pub fn region_label(region: u32, n_constraints: usize) -> String {
    let names = (0..n_constraints.min(MAX_CONSTRAINTS))
        .filter(|i| region & (1 << i) != 0)
        .map(|i| format!("constraint_{i}"))
        .collect::<Vec<_>>();
    if names.is_empty() {
        "none".to_owned()
    } else {
        names.join("&")
    }
}

/// Draws `samples` vectors and tallies which constraints they satisfy.
pub fn run_feasibility<P, R>(
    problem: &mut P,
    sampler: &Sampler,
    samples: usize,
    rng: &mut R,
) -> Result<FeasibilityReport, EvalError>
where
    P: Problem + ?Sized,
    R: Rng + ?Sized,
{
    let dim = problem.dim();
    let n_constraints = problem.n_constraints();
    if samples == 0 {
        return Err(EvalError::InvalidSampler {
            reason: "at least one sample is required".to_owned(),
        });
    }
    if n_constraints > MAX_CONSTRAINTS {
        return Err(EvalError::InvalidSampler {
            reason: format!("{n_constraints} constraints exceed the region bitmask"),
        });
    }
    sampler.validate(dim)?;

    let mut constraint_feasible = vec![0; n_constraints];
    let mut regions = BTreeMap::new();
    let mut margins_by_constraint = vec![Vec::with_capacity(samples); n_constraints];

    for i in 0..samples {
        let x = sampler.sample(dim, rng)?;
        let margins = problem.constraint_check(&x)?;
        if margins.len() != n_constraints {
            return Err(EvalError::Simulator {
                message: format!(
                    "expected {n_constraints} constraint margins, got {}",
                    margins.len()
                ),
            });
        }

        let mut region = 0_u32;
        for (c, &margin) in margins.iter().enumerate() {
            if margin > 0.0 {
                constraint_feasible[c] += 1;
                region |= 1 << c;
            }
            margins_by_constraint[c].push(margin);
        }
        *regions.entry(region).or_insert(0) += 1;
        tracing::trace!(sample = i, region, "sample classified");
    }

    let feasible_region = if n_constraints == MAX_CONSTRAINTS {
        u32::MAX
    } else {
        (1_u32 << n_constraints) - 1
    };
    let all_feasible = regions.get(&feasible_region).copied().unwrap_or(0);
    tracing::info!(
        problem = problem.name(),
        samples,
        all_feasible,
        "feasibility sampling finished"
    );

    Ok(FeasibilityReport {
        problem: problem.name().to_owned(),
        samples,
        constraint_feasible,
        all_feasible,
        regions,
        margins: margins_by_constraint
            .iter()
            .map(|m| MarginSummary::from_margins(m))
            .collect(),
    })
}
