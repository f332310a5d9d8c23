use std::path::Path;

use rotorlab_design::{constraint::LayoutConstraints, robot::RobotDefaults, turbine::TerrainConfig};
use rotorlab_eval::{problem::DEFAULT_TARGET, worker::WorkerCommand};
use serde::{Deserialize, Serialize};

use crate::util;

/// Harness settings loaded with `--config`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct HarnessConfig {
    pub(crate) robot: RobotDefaults,
    pub(crate) terrain: TerrainConfig,
    pub(crate) constraints: LayoutConstraints,
    /// Target point of the airframe flight task.
    pub(crate) target: [f64; 3],
    /// Worker used when `--worker` is not given.
    pub(crate) worker: Option<WorkerCommand>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            robot: RobotDefaults::default(),
            terrain: TerrainConfig::default(),
            constraints: LayoutConstraints::default(),
            target: DEFAULT_TARGET,
            worker: None,
        }
    }
}

impl HarnessConfig {
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let config: Self = util::read_json_file("config", path)?;
        tracing::debug!(path = %path.display(), ?config, "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use rotorlab_design::constraint::ForbiddenZoneMode;

    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config: HarnessConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.target, [2.3, 0.75, 1.5]);
    }

    #[test]
    fn test_partial_override() {
        let config: HarnessConfig = serde_json::from_str(
            r#"{
                "terrain": {"turbine_count": 4},
                "constraints": {"forbidden_zone_mode": "declared", "min_distance": 250.0},
                "worker": {"program": "python3", "args": ["windflo_worker.py"]}
            }"#,
        )
        .unwrap();
        assert_eq!(config.terrain.turbine_count, 4);
        assert_eq!(config.terrain.side_length, 2000.0);
        assert_eq!(config.constraints.min_distance, 250.0);
        assert_eq!(config.constraints.hole_diameter, 400.0);
        assert_eq!(
            config.constraints.forbidden_zone_mode,
            ForbiddenZoneMode::Declared
        );
        assert_eq!(config.worker.unwrap().args, ["windflo_worker.py"]);
    }
}
