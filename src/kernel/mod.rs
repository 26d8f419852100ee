pub mod network;

use rand::Rng;
use rand::RngCore;

use crate::distributions::{Distribution, VonMises};
use crate::error::{PopsError, Result};
use crate::geometry::Cell;
use network::NetworkKernel;

/// Tags which sub-kernel produced a dispersal result. Only meaningful when
/// the kernel is a [`DispersalKernel::Composite`]; base kernels report
/// whichever tag they were configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    Natural,
    Anthropogenic,
}

/// Fixed 4- or 8-connected compass direction for [`DispersalKernel::DeterministicNeighbor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl Direction {
    fn offset(self) -> (i64, i64) {
        match self {
            Direction::N => (-1, 0),
            Direction::S => (1, 0),
            Direction::E => (0, 1),
            Direction::W => (0, -1),
            Direction::Ne => (-1, 1),
            Direction::Nw => (-1, -1),
            Direction::Se => (1, 1),
            Direction::Sw => (1, -1),
        }
    }
}

/// A precomputed probability matrix over cell offsets, integrated from a
/// radial PDF, for [`DispersalKernel::Deterministic`].
#[derive(Debug, Clone)]
pub struct DeterministicTable {
    /// `(row_offset, col_offset, cumulative_weight)`, cumulative weights
    /// monotonically increasing and summing to 1.0 in the last entry.
    offsets: Vec<(i64, i64, f64)>,
}

impl DeterministicTable {
    /// Build by integrating `distribution`'s density over each cell offset
    /// within `max_radius` cells of the origin, scaled by `(ew_res, ns_res)`.
    pub fn from_radial(distribution: Distribution, max_radius: i64, ew_res: f64, ns_res: f64) -> Self {
        let mut weights = Vec::new();
        let mut total = 0.0;
        for dr in -max_radius..=max_radius {
            for dc in -max_radius..=max_radius {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let dx = dc as f64 * ew_res;
                let dy = dr as f64 * ns_res;
                let distance = (dx * dx + dy * dy).sqrt();
                // Approximate the cell's probability mass via the density
                // of the radial distribution at its center distance.
                let weight = radial_density_at(distribution, distance);
                total += weight;
                weights.push((dr, dc, weight));
            }
        }
        let mut cumulative = 0.0;
        let mut offsets = Vec::with_capacity(weights.len());
        for (dr, dc, w) in weights {
            let normalized = if total > 0.0 { w / total } else { 0.0 };
            cumulative += normalized;
            offsets.push((dr, dc, cumulative));
        }
        Self { offsets }
    }

    fn pick(&self, u: f64) -> (i64, i64) {
        for &(dr, dc, cumulative) in &self.offsets {
            if u <= cumulative {
                return (dr, dc);
            }
        }
        self.offsets.last().map_or((0, 0), |&(dr, dc, _)| (dr, dc))
    }
}

/// Approximates a radial distribution's relative density at a given
/// distance from the origin, used to build [`DeterministicTable`] weights.
/// Uses the distribution's own icdf curve inverted numerically is overkill
/// here; instead the PDF is approximated via a finite-difference of the CDF
/// (icdf's inverse), which is cheap and accurate enough for a weighting
/// table that only needs relative, not absolute, mass.
fn radial_density_at(distribution: Distribution, distance: f64) -> f64 {
    if distance < 0.0 {
        return 0.0;
    }
    // distance as a quantile position: find u such that icdf(u) ~= distance
    // via bisection over [0, 1), then use a local finite difference of
    // icdf (its derivative is 1/pdf) to recover an approximate density.
    let mut lo = 0.0;
    let mut hi = 1.0 - 1e-9;
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        if distribution.icdf(mid) < distance {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let u = 0.5 * (lo + hi);
    let eps = 1e-5;
    let u_lo = (u - eps).max(1e-9);
    let u_hi = (u + eps).min(1.0 - 1e-9);
    let derivative = (distribution.icdf(u_hi) - distribution.icdf(u_lo)) / (u_hi - u_lo);
    if derivative.abs() < 1e-12 {
        0.0
    } else {
        (1.0 / derivative).abs()
    }
}

/// A polymorphic dispersal kernel mapping a source cell and RNG state to a
/// target cell. All variants handle the off-grid case by returning the
/// coordinates anyway; callers classify the result via
/// [`crate::raster::Raster::is_outside`] / [`Cell::is_outside`].
#[derive(Debug, Clone)]
pub enum DispersalKernel {
    /// Distance from a radial distribution, angle from Von Mises, tagged
    /// `kind` for composite bookkeeping.
    Radial {
        distance: Distribution,
        angle: VonMises,
        ew_res: f64,
        ns_res: f64,
        kind: KernelKind,
    },
    DeterministicNeighbor { direction: Direction, kind: KernelKind },
    Deterministic { table: DeterministicTable, kind: KernelKind },
    Network { kernel: NetworkKernel, kind: KernelKind },
    UniformRandom { rows: usize, cols: usize, kind: KernelKind },
    Composite {
        natural: Box<DispersalKernel>,
        anthropogenic: Box<DispersalKernel>,
        p_anthro: f64,
    },
}

impl DispersalKernel {
    pub fn composite(natural: DispersalKernel, anthropogenic: DispersalKernel, p_anthro: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p_anthro) {
            return Err(PopsError::InvalidArgument(format!(
                "percent_natural_dispersal complement p_anthro must be in [0,1], got {p_anthro}"
            )));
        }
        Ok(DispersalKernel::Composite {
            natural: Box::new(natural),
            anthropogenic: Box::new(anthropogenic),
            p_anthro,
        })
    }

    pub fn sample(&self, from: Cell, rng: &mut dyn RngCore) -> (Cell, KernelKind) {
        match self {
            DispersalKernel::Radial {
                distance,
                angle,
                ew_res,
                ns_res,
                kind,
            } => {
                let d = distance.sample(rng).max(0.0);
                let theta = angle.sample(rng);
                let dx = d * theta.cos();
                let dy = d * theta.sin();
                let dcol = (dx / ew_res).round() as i64;
                let drow = (dy / ns_res).round() as i64;
                (Cell::new(from.row + drow, from.col + dcol), *kind)
            }
            DispersalKernel::DeterministicNeighbor { direction, kind } => {
                let (dr, dc) = direction.offset();
                (Cell::new(from.row + dr, from.col + dc), *kind)
            }
            DispersalKernel::Deterministic { table, kind } => {
                let u: f64 = rng.random_range(0.0..1.0);
                let (dr, dc) = table.pick(u);
                (Cell::new(from.row + dr, from.col + dc), *kind)
            }
            DispersalKernel::Network { kernel, kind } => (kernel.sample(from, rng), *kind),
            DispersalKernel::UniformRandom { rows, cols, kind } => {
                let row = rng.random_range(0..*rows) as i64;
                let col = rng.random_range(0..*cols) as i64;
                (Cell::new(row, col), *kind)
            }
            DispersalKernel::Composite {
                natural,
                anthropogenic,
                p_anthro,
            } => {
                let u: f64 = rng.random_range(0.0..1.0);
                if u < *p_anthro {
                    anthropogenic.sample(from, rng)
                } else {
                    natural.sample(from, rng)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn deterministic_neighbor_east_is_fixed() {
        let kernel = DispersalKernel::DeterministicNeighbor {
            direction: Direction::E,
            kind: KernelKind::Natural,
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let (to, _) = kernel.sample(Cell::new(2, 2), &mut rng);
        assert_eq!(to, Cell::new(2, 3));
    }

    #[test]
    fn uniform_random_stays_in_domain() {
        let kernel = DispersalKernel::UniformRandom {
            rows: 5,
            cols: 5,
            kind: KernelKind::Natural,
        };
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let (to, _) = kernel.sample(Cell::new(2, 2), &mut rng);
            assert!(!to.is_outside(5, 5));
        }
    }

    #[test]
    fn kernel_can_return_off_grid_cell() {
        let kernel = DispersalKernel::DeterministicNeighbor {
            direction: Direction::N,
            kind: KernelKind::Natural,
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let (to, _) = kernel.sample(Cell::new(0, 0), &mut rng);
        assert_eq!(to, Cell::new(-1, 0));
        assert!(to.is_outside(5, 5));
    }

    #[test]
    fn composite_picks_anthropogenic_branch_when_forced() {
        let natural = DispersalKernel::DeterministicNeighbor {
            direction: Direction::N,
            kind: KernelKind::Natural,
        };
        let anthro = DispersalKernel::DeterministicNeighbor {
            direction: Direction::S,
            kind: KernelKind::Anthropogenic,
        };
        let composite = DispersalKernel::composite(natural, anthro, 1.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let (to, kind) = composite.sample(Cell::new(2, 2), &mut rng);
        assert_eq!(to, Cell::new(3, 2));
        assert_eq!(kind, KernelKind::Anthropogenic);
    }

    #[test]
    fn composite_rejects_out_of_range_weight() {
        let natural = DispersalKernel::UniformRandom {
            rows: 1,
            cols: 1,
            kind: KernelKind::Natural,
        };
        let anthro = natural.clone();
        assert!(DispersalKernel::composite(natural, anthro, 1.5).is_err());
    }

    #[test]
    fn deterministic_table_weights_sum_to_one() {
        let distance = Distribution::exponential(2.0).unwrap();
        let table = DeterministicTable::from_radial(distance, 3, 1.0, 1.0);
        let last = table.offsets.last().unwrap().2;
        assert!((last - 1.0).abs() < 1e-6);
    }
}
