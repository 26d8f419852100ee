use rand::RngCore;

use crate::geometry::Cell;
use crate::host::HostPool;
use crate::kernel::DispersalKernel;
use crate::pest::PestPool;

struct PlannedMove {
    from: Cell,
    target: Cell,
    leaving: i64,
}

/// Forces bulk infected→susceptible / susceptible→infected transfers out of
/// cells whose infected fraction exceeds a threshold. All source
/// decrements are computed from the same pre-action snapshot and applied
/// before any target increment, so a cell processed later in the same
/// call never sees an already-mutated neighbor.
pub struct OverpopulationMovementAction {
    pub overpopulation_percentage: f64,
    pub leaving_percentage: f64,
}

impl OverpopulationMovementAction {
    pub fn new(overpopulation_percentage: f64, leaving_percentage: f64) -> Self {
        Self {
            overpopulation_percentage,
            leaving_percentage,
        }
    }

    pub fn apply(&self, host: &mut HostPool, kernel: &DispersalKernel, pests: &mut PestPool, rng: &mut dyn RngCore) {
        let rows = host.rows();
        let cols = host.cols();
        let cells: Vec<Cell> = host.suitable_cells().iter().collect();

        let mut moves = Vec::new();
        for cell in &cells {
            let row = cell.row as usize;
            let col = cell.col as usize;
            let infected = host.infected_at(row, col);
            let total = host.total_hosts_at(row, col);
            if total <= 0 {
                continue;
            }
            if (infected as f64 / total as f64) < self.overpopulation_percentage {
                continue;
            }
            let leaving = (infected as f64 * self.leaving_percentage).floor() as i64;
            if leaving <= 0 {
                continue;
            }
            let (target, _kind) = kernel.sample(*cell, rng);
            moves.push(PlannedMove {
                from: *cell,
                target,
                leaving,
            });
        }

        for mv in &moves {
            host.move_infected_to_susceptible_at(mv.from.row as usize, mv.from.col as usize, mv.leaving);
        }

        for mv in &moves {
            if mv.target.is_outside(rows, cols) {
                for _ in 0..mv.leaving {
                    pests.add_outside(mv.target, rows, cols);
                }
            } else {
                host.move_susceptible_to_infected_at(mv.target.row as usize, mv.target.col as usize, mv.leaving);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelType;
    use crate::kernel::{Direction, KernelKind};
    use crate::raster::Raster;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn east_kernel() -> DispersalKernel {
        DispersalKernel::DeterministicNeighbor {
            direction: Direction::E,
            kind: KernelKind::Natural,
        }
    }

    #[test]
    fn overpopulated_cell_moves_surplus_to_neighbor() {
        let mut host = HostPool::new(
            ModelType::Si,
            Raster::from_rows(vec![vec![20, 10], vec![20, 15]]),
            Raster::from_rows(vec![vec![16, 0], vec![0, 0]]),
            0,
            1.0,
        )
        .unwrap();
        let mut pests = PestPool::new(2, 2);
        let kernel = east_kernel();
        let action = OverpopulationMovementAction::new(0.75, 0.5);
        let mut rng = SmallRng::seed_from_u64(0);

        action.apply(&mut host, &kernel, &mut pests, &mut rng);

        assert_eq!(host.infected_at(0, 0), 8);
        assert_eq!(host.infected_at(0, 1), 8);
        assert_eq!(host.infected_at(1, 0), 0);
        assert_eq!(host.infected_at(1, 1), 0);
        assert!(pests.outside_dispersers().is_empty());
    }

    #[test]
    fn repeated_overflow_pushes_surplus_outside_grid() {
        let mut host = HostPool::new(
            ModelType::Si,
            Raster::from_rows(vec![vec![20, 10], vec![20, 15]]),
            Raster::from_rows(vec![vec![16, 0], vec![0, 0]]),
            0,
            1.0,
        )
        .unwrap();
        let mut pests = PestPool::new(2, 2);
        let kernel = east_kernel();
        let action = OverpopulationMovementAction::new(0.75, 0.5);
        let mut rng = SmallRng::seed_from_u64(0);

        action.apply(&mut host, &kernel, &mut pests, &mut rng);
        action.apply(&mut host, &kernel, &mut pests, &mut rng);

        assert_eq!(host.infected_at(0, 0), 8);
        assert_eq!(host.infected_at(0, 1), 4);
        assert_eq!(pests.outside_dispersers().len(), 4);
    }
}
