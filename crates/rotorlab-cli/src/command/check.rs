use std::path::PathBuf;

use anyhow::Context as _;
use serde::Serialize;

use crate::{
    command::ProblemArg,
    util::{Output, VectorArg},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CheckArg {
    #[clap(flatten)]
    problem: ProblemArg,
    #[clap(flatten)]
    vectors: VectorArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CheckRecord {
    x: Vec<f64>,
    margins: Vec<f64>,
    feasible: bool,
}

pub(crate) fn run(arg: &CheckArg) -> anyhow::Result<()> {
    let CheckArg {
        problem,
        vectors,
        output,
    } = arg;
    let vectors = vectors.vectors()?;
    let mut instance = problem.open()?;
    let problem = instance.problem_mut();

    eprintln!(
        "Checking {} vector(s) against {} constraint(s) of {}",
        vectors.len(),
        problem.n_constraints(),
        problem.name()
    );
    let mut records = Vec::with_capacity(vectors.len());
    for (i, x) in vectors.into_iter().enumerate() {
        let margins = problem
            .constraint_check(&x)
            .with_context(|| format!("Failed to check vector #{i}"))?;
        let feasible = margins.iter().all(|&m| m > 0.0);
        eprintln!("  {i:3}: {margins:.3?} => feasible: {feasible}");
        records.push(CheckRecord {
            x,
            margins,
            feasible,
        });
    }
    instance.finish()?;

    Output::save_json(&records, output.clone())?;
    Ok(())
}
