use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use rotorlab_eval::{
    problem::{AirframeProblem, Problem, ToyProblem, WindFarmProblem},
    worker::{WorkerClient, WorkerCommand},
};

use crate::config::HarnessConfig;

use self::{
    check::CheckArg, decode::DecodeArg, evaluate::EvaluateArg, feasibility::FeasibilityArg,
    layout::LayoutArg,
};

mod check;
mod decode;
mod evaluate;
mod feasibility;
mod layout;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Decode airframe vectors into robot parameters
    Decode(#[clap(flatten)] DecodeArg),
    /// Decode turbine vectors into positions and layout margins
    Layout(#[clap(flatten)] LayoutArg),
    /// Print constraint margins of design vectors
    Check(#[clap(flatten)] CheckArg),
    /// Evaluate design vectors with a constraint handling method
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Estimate the feasible fraction of a design space by sampling
    Feasibility(#[clap(flatten)] FeasibilityArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Decode(arg) => decode::run(&arg)?,
        Mode::Layout(arg) => layout::run(&arg)?,
        Mode::Check(arg) => check::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Feasibility(arg) => feasibility::run(&arg)?,
    }
    Ok(())
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum ProblemKind {
    Airframes,
    Windflo,
    #[default]
    Toy,
}

/// Problem selection shared by the commands that evaluate problems.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ProblemArg {
    /// Problem to run: airframes, windflo or toy
    #[arg(long, default_value = "toy")]
    problem: ProblemKind,
    /// Harness configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulator worker program, overriding the configured one
    #[arg(long)]
    worker: Option<String>,
    /// Argument passed to the worker program (repeatable)
    #[arg(long = "worker-arg", allow_hyphen_values = true)]
    worker_args: Vec<String>,
}

impl ProblemArg {
    pub(crate) fn open(&self) -> anyhow::Result<ProblemInstance> {
        let config = HarnessConfig::load(self.config.as_deref())?;
        let instance = match self.problem {
            ProblemKind::Toy => ProblemInstance::Toy(ToyProblem),
            ProblemKind::Airframes => ProblemInstance::Airframes(AirframeProblem::new(
                self.spawn_worker(&config)?,
                config.robot,
                config.target,
            )),
            ProblemKind::Windflo => ProblemInstance::WindFarm(WindFarmProblem::new(
                self.spawn_worker(&config)?,
                config.terrain,
                config.constraints,
            )),
        };
        tracing::info!(
            problem = instance.problem().name(),
            dim = instance.problem().dim(),
            "problem ready"
        );
        Ok(instance)
    }

    fn spawn_worker(&self, config: &HarnessConfig) -> anyhow::Result<WorkerClient> {
        let command = match (&self.worker, &config.worker) {
            (Some(program), _) => WorkerCommand {
                program: program.clone(),
                args: self.worker_args.clone(),
            },
            (None, Some(command)) => command.clone(),
            (None, None) => bail!(
                "Problem {:?} needs a simulator worker; pass --worker or set `worker` in the config",
                self.problem
            ),
        };
        eprintln!("Starting worker: {}", command.program);
        WorkerClient::spawn(&command)
            .with_context(|| format!("Failed to start worker `{}`", command.program))
    }
}

/// A problem together with the worker process it owns.
#[derive(Debug)]
pub(crate) enum ProblemInstance {
    Airframes(AirframeProblem<WorkerClient>),
    WindFarm(WindFarmProblem<WorkerClient>),
    Toy(ToyProblem),
}

impl ProblemInstance {
    pub(crate) fn problem(&self) -> &dyn Problem {
        match self {
            Self::Airframes(p) => p,
            Self::WindFarm(p) => p,
            Self::Toy(p) => p,
        }
    }

    pub(crate) fn problem_mut(&mut self) -> &mut dyn Problem {
        match self {
            Self::Airframes(p) => p,
            Self::WindFarm(p) => p,
            Self::Toy(p) => p,
        }
    }

    /// Lets the worker exit on its own and reports a non-zero exit status.
    pub(crate) fn finish(self) -> anyhow::Result<()> {
        let worker = match self {
            Self::Airframes(p) => p.into_inner(),
            Self::WindFarm(p) => p.into_inner(),
            Self::Toy(_) => return Ok(()),
        };
        let status = worker.shutdown().context("Failed to stop worker")?;
        if !status.success() {
            tracing::warn!(%status, "worker exited with failure");
            eprintln!("Worker exited with {status}");
        }
        Ok(())
    }
}
