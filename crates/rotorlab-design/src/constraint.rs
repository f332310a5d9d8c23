//! Geometric feasibility margins for turbine layouts.
//!
//! [`LayoutConstraints::evaluate`] computes three independent margins. Each margin is
//! positive when the constraint holds and non-positive when it is violated:
//!
//! | margin | definition |
//! |--------|------------|
//! | separation | `min_{i≠j} |p_i - p_j| - min_distance` |
//! | quadrant balance | `N * max_quadrant_share - max(quadrant counts)` |
//! | forbidden zone | `min_{zone} min_{turbine} |t - c| - hole_diameter` |
//!
//! # Quadrant Boundaries
//!
//! Quadrants are open: a turbine lying exactly on the vertical or horizontal split line is
//! counted in no quadrant at all.
//!
//! # Forbidden Zones
//!
//! The default terrain declares sixteen forbidden-zone centers. In
//! [`ForbiddenZoneMode::Literal`] (the default) every one of them is replaced with
//! `(1350, 750)` before measuring, so only that single center is effectively tested.
//! [`ForbiddenZoneMode::Declared`] measures against the declared centers instead. The two
//! modes give materially different feasible regions.

use serde::{Deserialize, Serialize};

use crate::turbine::TurbineLayout;

/// Center that replaces every declared forbidden-zone center in
/// [`ForbiddenZoneMode::Literal`].
pub const LITERAL_ZONE_CENTER: [f64; 2] = [1350.0, 750.0];

/// Declared forbidden-zone centers of the default terrain.
pub const DEFAULT_HOLE_CENTERS: [[f64; 2]; 16] = [
    [708.890_582_891_184_6, 1260.477_163_992_826_5],
    [989.311_987_512_188_4, 660.784_549_111_762_3],
    [1987.104_282_428_962, 305.092_382_405_310_7],
    [929.196_111_708_641_6, 1395.345_379_560_932_3],
    [307.033_626_023_978_57, 1563.844_485_285_779_7],
    [1417.749_994_037_235_9, 621.637_183_149_044_4],
    [564.845_493_570_659_3, 849.559_142_403_129_3],
    [1359.735_659_219_757_7, 606.894_587_154_017],
    [249.217_419_104_360_57, 1852.908_347_601_767],
    [997.889_903_797_751_3, 735.779_531_746_288_7],
    [1432.192_207_065_307_5, 730.300_277_261_731_5],
    [1406.887_168_762_474_2, 1525.401_811_750_595],
    [1291.708_677_307_500_2, 519.869_844_321_955_2],
    [1056.747_807_336_964_1, 913.261_538_410_334_4],
    [1104.896_945_787_265_8, 337.968_718_051_068_9],
    [1794.404_718_074_354_8, 367.324_021_312_008_6],
];

/// How declared forbidden-zone centers are interpreted.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenZoneMode {
    /// Every declared center is replaced with [`LITERAL_ZONE_CENTER`].
    #[default]
    Literal,
    /// Declared centers are used as given.
    Declared,
}

/// Parameters of the three layout constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstraints {
    /// Minimum distance between any two turbines.
    pub min_distance: f64,
    /// Point splitting the terrain into four quadrants.
    pub quadrant_split: [f64; 2],
    /// Largest fraction of turbines allowed in a single quadrant.
    pub max_quadrant_share: f64,
    /// Required clearance from every forbidden-zone center.
    pub hole_diameter: f64,
    pub hole_centers: Vec<[f64; 2]>,
    pub forbidden_zone_mode: ForbiddenZoneMode,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            min_distance: 300.0,
            quadrant_split: [1000.0, 1000.0],
            max_quadrant_share: 1.0 / 3.0,
            hole_diameter: 400.0,
            hole_centers: DEFAULT_HOLE_CENTERS.to_vec(),
            forbidden_zone_mode: ForbiddenZoneMode::Literal,
        }
    }
}

/// The three layout margins. Positive means satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintMargins {
    pub separation: f64,
    pub quadrant_balance: f64,
    pub forbidden_zone: f64,
}

impl ConstraintMargins {
    pub const COUNT: usize = 3;

    #[must_use]
    pub fn as_array(&self) -> [f64; Self::COUNT] {
        [self.separation, self.quadrant_balance, self.forbidden_zone]
    }

    /// Returns `true` if every margin is strictly positive.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.as_array().iter().all(|&m| m > 0.0)
    }
}

impl LayoutConstraints {
    #[must_use]
    pub fn evaluate(&self, layout: &TurbineLayout) -> ConstraintMargins {
        ConstraintMargins {
            separation: self.separation_margin(layout),
            quadrant_balance: self.quadrant_balance_margin(layout),
            forbidden_zone: self.forbidden_zone_margin(layout),
        }
    }

    /// Smallest pairwise distance minus `min_distance`, or `+∞` for fewer than two turbines.
    #[must_use]
    pub fn separation_margin(&self, layout: &TurbineLayout) -> f64 {
        let positions = layout.positions();
        let mut margin = f64::INFINITY;
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                margin = margin.min(distance(*a, *b) - self.min_distance);
            }
        }
        margin
    }

    /// Turbine count in each open quadrant: `[+x+y, -x+y, -x-y, +x-y]`.
    #[must_use]
    pub fn quadrant_counts(&self, layout: &TurbineLayout) -> [usize; 4] {
        let [cx, cy] = self.quadrant_split;
        let mut counts = [0; 4];
        for &[x, y] in layout.positions() {
            if x > cx && y > cy {
                counts[0] += 1;
            }
            if x < cx && y > cy {
                counts[1] += 1;
            }
            if x < cx && y < cy {
                counts[2] += 1;
            }
            if x > cx && y < cy {
                counts[3] += 1;
            }
        }
        counts
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn quadrant_balance_margin(&self, layout: &TurbineLayout) -> f64 {
        let max_count = self
            .quadrant_counts(layout)
            .into_iter()
            .max()
            .unwrap_or(0);
        layout.len() as f64 * self.max_quadrant_share - max_count as f64
    }

    /// Clearance of the closest turbine to the closest effective zone center, minus
    /// `hole_diameter`. `+∞` when there are no zones or no turbines.
    #[must_use]
    pub fn forbidden_zone_margin(&self, layout: &TurbineLayout) -> f64 {
        let mut margin = f64::INFINITY;
        for center in self.effective_hole_centers() {
            for &p in layout.positions() {
                margin = margin.min(distance(p, center) - self.hole_diameter);
            }
        }
        margin
    }

    /// Zone centers after applying [`ForbiddenZoneMode`].
    pub fn effective_hole_centers(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.hole_centers
            .iter()
            .map(|&center| match self.forbidden_zone_mode {
                ForbiddenZoneMode::Literal => LITERAL_ZONE_CENTER,
                ForbiddenZoneMode::Declared => center,
            })
    }
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}
