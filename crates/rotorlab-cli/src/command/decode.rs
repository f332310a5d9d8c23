use std::path::PathBuf;

use anyhow::{Context as _, bail};
use rotorlab_design::{
    airframe::{AirframeEncoding, SymmetricEncoding, SymmetryPlane, UnconstrainedEncoding},
    robot::RobotParameter,
};
use serde::Serialize;

use crate::{
    config::HarnessConfig,
    util::{Output, VectorArg},
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum EncodingKind {
    #[default]
    Symmetric,
    Unconstrained,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DecodeArg {
    /// Airframe encoding: symmetric or unconstrained
    #[arg(long, default_value = "symmetric")]
    encoding: EncodingKind,
    /// Number of rotors (even for the symmetric encoding)
    #[arg(long, default_value_t = 6)]
    rotors: usize,
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
struct DecodedAirframe {
    x: Vec<f64>,
    robot: RobotParameter,
    total_mass: f64,
    hover_command: Vec<f64>,
}

fn encoding(kind: EncodingKind, rotors: usize) -> anyhow::Result<AirframeEncoding> {
    let encoding: AirframeEncoding = match kind {
        EncodingKind::Symmetric => {
            if rotors % 2 != 0 {
                bail!("The symmetric encoding needs an even rotor count, got {rotors}");
            }
            SymmetricEncoding::new(rotors / 2, SymmetryPlane::Y)?.into()
        }
        EncodingKind::Unconstrained => UnconstrainedEncoding::new(rotors)?.into(),
    };
    Ok(encoding)
}

pub(crate) fn run(arg: &DecodeArg) -> anyhow::Result<()> {
    let DecodeArg {
        encoding: kind,
        rotors,
        config,
        vectors,
        output,
    } = arg;
    let config = HarnessConfig::load(config.as_deref())?;
    let encoding = encoding(*kind, *rotors)?;
    let vectors = vectors.vectors()?;

    eprintln!(
        "Decoding {} vector(s) with the {kind:?} encoding ({} rotors, dim {})",
        vectors.len(),
        encoding.rotor_count(),
        encoding.dim()
    );
    let decoded = vectors
        .into_iter()
        .enumerate()
        .map(|(i, x)| {
            let robot = encoding
                .decode(&x, &config.robot)
                .with_context(|| format!("Failed to decode vector #{i}"))?;
            Ok(DecodedAirframe {
                total_mass: robot.total_mass(),
                hover_command: robot.hover_command(),
                robot,
                x,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Output::save_json(&decoded, output.clone())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_dims() {
        assert_eq!(encoding(EncodingKind::Symmetric, 6).unwrap().dim(), 15);
        assert_eq!(encoding(EncodingKind::Unconstrained, 4).unwrap().dim(), 24);
        assert!(encoding(EncodingKind::Symmetric, 5).is_err());
        assert!(encoding(EncodingKind::Unconstrained, 0).is_err());
    }

    #[test]
    fn test_encoding_kind_parses_lowercase() {
        assert_eq!(
            "unconstrained".parse::<EncodingKind>().unwrap(),
            EncodingKind::Unconstrained
        );
    }
}
