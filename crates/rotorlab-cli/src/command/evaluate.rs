use std::path::PathBuf;

use anyhow::Context as _;
use rotorlab_eval::problem::{ConstraintMethod, evaluate_with};

use crate::{
    command::ProblemArg,
    record::{EvaluationLog, EvaluationRecord},
    util::{Output, VectorArg},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    #[clap(flatten)]
    problem: ProblemArg,
    /// Constraint handling: ignore, nan_on_unfeasible or constant_penalty_no_evaluation
    #[arg(long, default_value = "ignore")]
    method: ConstraintMethod,
    #[clap(flatten)]
    vectors: VectorArg,
    /// Append `;`-delimited records to this log file
    #[arg(long)]
    log: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        problem,
        method,
        vectors,
        log,
        output,
    } = arg;
    let vectors = vectors.vectors()?;
    let mut log = log
        .clone()
        .map(|path| {
            let (output, is_empty) = Output::append(path)?;
            EvaluationLog::new(output, is_empty)
        })
        .transpose()?;
    let mut instance = problem.open()?;
    let problem = instance.problem_mut();
    let problem_name = problem.name();

    eprintln!(
        "Evaluating {} vector(s) on {problem_name} with {method}",
        vectors.len()
    );
    let mut records = Vec::with_capacity(vectors.len());
    for (i, x) in vectors.into_iter().enumerate() {
        let evaluation = evaluate_with(&mut *problem, *method, &x)
            .with_context(|| format!("Failed to evaluate vector #{i}"))?;
        let feasible = match evaluation.feasible {
            Some(true) => "feasible",
            Some(false) => "infeasible",
            None => "unchecked",
        };
        eprintln!("  {i:3}: f = {:.6} ({feasible})", evaluation.objective);

        let record = EvaluationRecord {
            problem: problem_name.to_owned(),
            method: *method,
            x,
            evaluation,
        };
        if let Some(log) = &mut log {
            log.append(&record)?;
        }
        records.push(record);
    }
    instance.finish()?;

    if let Some(log) = &log {
        eprintln!("Appended {} record(s) to the log", log.written());
    }
    Output::save_json(&records, output.clone())?;
    Ok(())
}
