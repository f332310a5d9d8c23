use std::path::PathBuf;

use anyhow::bail;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use rotorlab_eval::feasibility::{self, FeasibilityReport, Sampler};

use crate::{command::ProblemArg, util};

/// Sample count of a default run.
const DEFAULT_SAMPLES: usize = 5000;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct FeasibilityArg {
    #[clap(flatten)]
    problem: ProblemArg,
    /// Number of sampled design vectors
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,
    /// Random seed; a fresh one is drawn and printed when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Sample around this vector (comma-separated) instead of uniformly
    #[arg(long, value_name = "X0,X1,...")]
    center: Option<String>,
    /// Standard deviation of the samples around --center
    #[arg(long, default_value_t = 0.05)]
    sigma: f64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl FeasibilityArg {
    fn sampler(&self) -> anyhow::Result<Sampler> {
        let Some(center) = &self.center else {
            return Ok(Sampler::Uniform);
        };
        Ok(Sampler::Gaussian {
            center: util::parse_vector(center)?,
            sigma: self.sigma,
        })
    }
}

pub(crate) fn run(arg: &FeasibilityArg) -> anyhow::Result<()> {
    if arg.samples == 0 {
        bail!("--samples must be at least 1");
    }
    let sampler = arg.sampler()?;
    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let mut instance = arg.problem.open()?;
    let problem = instance.problem_mut();
    eprintln!(
        "Sampling {} vector(s) of {} (dim {}, seed {seed})",
        arg.samples,
        problem.name(),
        problem.dim()
    );
    let report = feasibility::run_feasibility(problem, &sampler, arg.samples, &mut rng)?;
    instance.finish()?;

    print_summary(&report);
    util::Output::save_json(&report, arg.output.clone())?;
    Ok(())
}

fn print_summary(report: &FeasibilityReport) {
    let n_constraints = report.constraint_feasible.len();
    eprintln!("Constraints:");
    for (i, summary) in report.margins.iter().enumerate() {
        eprintln!(
            "  constraint_{i}: {:6.2}% feasible",
            100.0 * report.fraction_feasible(i)
        );
        if let Some(stats) = &summary.stats {
            eprintln!(
                "    Margin min/median/max: {:.3} / {:.3} / {:.3}",
                stats.min, stats.median, stats.max
            );
        }
        if summary.non_finite > 0 {
            eprintln!("    Non-finite margins: {}", summary.non_finite);
        }
    }

    eprintln!("Regions:");
    for (&region, &count) in &report.regions {
        #[expect(clippy::cast_precision_loss)]
        let percent = 100.0 * count as f64 / report.samples as f64;
        eprintln!(
            "  {:<40} {count:6} ({percent:6.2}%)",
            feasibility::region_label(region, n_constraints)
        );
    }
    eprintln!(
        "All constraints: {}/{} ({:.2}%)",
        report.all_feasible,
        report.samples,
        100.0 * report.fraction_all_feasible()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_selection() {
        let uniform = FeasibilityArg::default();
        assert_eq!(uniform.sampler().unwrap(), Sampler::Uniform);

        let gaussian = FeasibilityArg {
            center: Some("0.25,0.75".to_owned()),
            sigma: 0.1,
            ..FeasibilityArg::default()
        };
        assert_eq!(
            gaussian.sampler().unwrap(),
            Sampler::Gaussian {
                center: vec![0.25, 0.75],
                sigma: 0.1
            }
        );
    }
}
