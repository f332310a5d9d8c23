use std::path::PathBuf;

use anyhow::Context as _;
use rotorlab_design::{
    constraint::{ConstraintMargins, LayoutConstraints},
    turbine::TerrainConfig,
};
use serde::Serialize;

use crate::{
    config::HarnessConfig,
    util::{Output, VectorArg},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct LayoutArg {
    /// Harness configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    #[clap(flatten)]
    vectors: VectorArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    positions: Vec<[f64; 2]>,
    quadrant_counts: [usize; 4],
    margins: ConstraintMargins,
    feasible: bool,
}

fn layout_report(
    terrain: &TerrainConfig,
    constraints: &LayoutConstraints,
    x: &[f64],
) -> anyhow::Result<LayoutReport> {
    let layout = terrain.decode(x)?;
    let margins = constraints.evaluate(&layout);
    Ok(LayoutReport {
        quadrant_counts: constraints.quadrant_counts(&layout),
        feasible: margins.is_feasible(),
        margins,
        positions: layout.positions().to_vec(),
    })
}

pub(crate) fn run(arg: &LayoutArg) -> anyhow::Result<()> {
    let LayoutArg {
        config,
        vectors,
        output,
    } = arg;
    let HarnessConfig {
        terrain,
        constraints,
        ..
    } = HarnessConfig::load(config.as_deref())?;
    let vectors = vectors.vectors()?;

    eprintln!(
        "Decoding {} layout(s) of {} turbines on a {} x {} terrain",
        vectors.len(),
        terrain.turbine_count,
        terrain.side_length,
        terrain.side_length
    );
    let reports = vectors
        .iter()
        .enumerate()
        .map(|(i, x)| {
            layout_report(&terrain, &constraints, x)
                .with_context(|| format!("Failed to decode layout #{i}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let feasible = reports.iter().filter(|r| r.feasible).count();
    eprintln!("  Feasible: {feasible}/{}", reports.len());

    Output::save_json(&reports, output.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_report() {
        let terrain = TerrainConfig {
            side_length: 2000.0,
            turbine_count: 2,
        };
        let report =
            layout_report(&terrain, &LayoutConstraints::default(), &[0.0, 0.0, 1.0, 0.5]).unwrap();
        assert_eq!(report.positions, [[0.0, 0.0], [2000.0, 1000.0]]);
        // (2000, 1000) lies on the split line and belongs to no quadrant
        assert_eq!(report.quadrant_counts, [0, 0, 1, 0]);
        assert!(layout_report(&terrain, &LayoutConstraints::default(), &[0.5; 3]).is_err());
    }
}
