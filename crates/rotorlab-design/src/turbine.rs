//! Wind turbine layouts on a square terrain.

use serde::{Deserialize, Serialize};

use crate::{
    DesignError,
    bounds::{self, Bounds},
};

pub const DEFAULT_SIDE_LENGTH: f64 = 2000.0;
pub const DEFAULT_TURBINE_COUNT: usize = 10;

/// Square terrain `[0, side_length]²` holding a fixed number of turbines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub side_length: f64,
    pub turbine_count: usize,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            side_length: DEFAULT_SIDE_LENGTH,
            turbine_count: DEFAULT_TURBINE_COUNT,
        }
    }
}

impl TerrainConfig {
    /// Length of the design vector: two coordinates per turbine.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.turbine_count * 2
    }

    /// Decodes a normalized vector `[x_0, y_0, x_1, y_1, ...]` into turbine positions.
    ///
    /// Both axes share the bounds `[0, side_length]`.
    ///
    /// ```
    /// use rotorlab_design::turbine::TerrainConfig;
    ///
    /// let terrain = TerrainConfig { side_length: 2000.0, turbine_count: 2 };
    /// let layout = terrain.decode(&[0.0, 0.5, 1.0, 0.25]).unwrap();
    /// assert_eq!(layout.positions(), &[[0.0, 1000.0], [2000.0, 500.0]]);
    /// ```
    pub fn decode(&self, x: &[f64]) -> Result<TurbineLayout, DesignError> {
        bounds::validate_length(x, self.dim())?;
        let bounds = Bounds::new(0.0, self.side_length)?;
        let coords = bounds.map_slice(x)?;
        let positions = coords.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
        Ok(TurbineLayout { positions })
    }
}

/// Turbine positions in terrain units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineLayout {
    positions: Vec<[f64; 2]>,
}

impl TurbineLayout {
    /// Builds a layout from explicit positions.
    #[must_use]
    pub fn from_positions(positions: Vec<[f64; 2]>) -> Self {
        Self { positions }
    }

    #[must_use]
    pub fn positions(&self) -> &[[f64; 2]] {
        &self.positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_terrain() {
        let terrain = TerrainConfig::default();
        assert_eq!(terrain.dim(), 20);
        let layout = terrain.decode(&[0.5; 20]).unwrap();
        assert_eq!(layout.len(), 10);
        assert!(layout.positions().iter().all(|p| *p == [1000.0, 1000.0]));
    }

    #[test]
    fn test_decode_order_is_x_then_y() {
        let terrain = TerrainConfig {
            side_length: 100.0,
            turbine_count: 3,
        };
        let layout = terrain
            .decode(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6])
            .unwrap();
        let expected = [[10.0, 20.0], [30.0, 40.0], [50.0, 60.0]];
        for (p, e) in layout.positions().iter().zip(expected) {
            assert!((p[0] - e[0]).abs() < 1e-9 && (p[1] - e[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let terrain = TerrainConfig::default();
        assert!(matches!(
            terrain.decode(&[0.5; 19]),
            Err(DesignError::InvalidLength {
                expected: 20,
                actual: 19
            })
        ));
        let mut x = vec![0.5; 20];
        x[3] = -0.01;
        assert!(matches!(
            terrain.decode(&x),
            Err(DesignError::OutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_empty_layout() {
        let terrain = TerrainConfig {
            side_length: 2000.0,
            turbine_count: 0,
        };
        let layout = terrain.decode(&[]).unwrap();
        assert!(layout.is_empty());
    }
}
