use rand::RngCore;

use crate::environment::Environment;
use crate::error::{PopsError, Result};
use crate::geometry::Cell;
use crate::host::HostPool;
use crate::kernel::{DispersalKernel, KernelKind};
use crate::multi_host::MultiHostPool;
use crate::pest::{PestPool, SoilPool};

/// Moves each cell's pending dispersers: a fraction is routed into the
/// soil reservoir (if active), the rest are dispersed via the kernel and
/// offered to the composed host pools; the soil reservoir then emits its
/// own dispersers and attempts establishment in place.
pub struct SpreadAction {
    pub use_soils: bool,
    pub stochastic: bool,
    pub deterministic_probability: f64,
}

impl SpreadAction {
    pub fn new(use_soils: bool, stochastic: bool, deterministic_probability: f64) -> Self {
        Self {
            use_soils,
            stochastic,
            deterministic_probability,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        pests: &mut PestPool,
        soil: Option<&mut SoilPool>,
        hosts: &mut [HostPool],
        multi: &MultiHostPool,
        env: &Environment,
        kernel: &DispersalKernel,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let &first = multi
            .host_indices()
            .first()
            .ok_or_else(|| PopsError::LogicState("MultiHostPool has no composed hosts".to_string()))?;
        let rows = hosts[first].rows();
        let cols = hosts[first].cols();
        let cells: Vec<Cell> = hosts[first].suitable_cells().iter().collect();
        let mut soil = soil;

        for cell in cells {
            let row = cell.row as usize;
            let col = cell.col as usize;

            let mut count = pests.dispersers_from(row, col);
            if count <= 0 {
                continue;
            }

            if self.use_soils {
                if let Some(soil) = soil.as_deref_mut() {
                    count -= soil.deposit(count, row, col);
                }
            }

            for _ in 0..count {
                let (target, kind) = kernel.sample(cell, rng);
                if target.is_outside(rows, cols) {
                    pests.add_outside(target, rows, cols);
                    continue;
                }
                let trow = target.row as usize;
                let tcol = target.col as usize;
                pests.add_landed(trow, tcol);
                let total_population = env.total_population_at(trow, tcol, hosts.iter().map(|h| h.total_hosts_at(trow, tcol) as f64));
                let weather = env.weather_coefficient_at(trow, tcol).ok();
                let established = multi.disperser_to(
                    trow,
                    tcol,
                    hosts,
                    total_population,
                    weather,
                    self.stochastic,
                    self.deterministic_probability,
                    rng,
                );
                if established > 0 {
                    pests.add_established(cell, target, kind);
                }
            }

            if self.use_soils {
                if let Some(soil) = soil.as_deref_mut() {
                    let emitted = soil.emit(row, col, rng)?;
                    for _ in 0..emitted {
                        let total_population = env.total_population_at(row, col, hosts.iter().map(|h| h.total_hosts_at(row, col) as f64));
                        let weather = env.weather_coefficient_at(row, col).ok();
                        let established = multi.disperser_to(
                            row,
                            col,
                            hosts,
                            total_population,
                            weather,
                            self.stochastic,
                            self.deterministic_probability,
                            rng,
                        );
                        if established > 0 {
                            pests.add_established(cell, cell, KernelKind::Natural);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelType;
    use crate::environment::WeatherType;
    use crate::kernel::Direction;
    use crate::raster::Raster;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn disperser_lands_and_establishes_deterministically() {
        let host = HostPool::new(
            ModelType::Si,
            Raster::from_rows(vec![vec![10, 10]]),
            Raster::from_rows(vec![vec![0, 0]]),
            0,
            1.0,
        )
        .unwrap();
        let mut hosts = vec![host];
        let multi = MultiHostPool::new(vec![0], false);
        let mut pests = PestPool::new(1, 2);
        pests.add_dispersers_at(0, 0, 3);
        let env = Environment::new(1, 2, WeatherType::None);
        let kernel = DispersalKernel::DeterministicNeighbor {
            direction: Direction::E,
            kind: KernelKind::Natural,
        };
        let action = SpreadAction::new(false, false, 1.0);
        let mut rng = SmallRng::seed_from_u64(0);

        action.apply(&mut pests, None, &mut hosts, &multi, &env, &kernel, &mut rng).unwrap();

        assert_eq!(hosts[0].infected_at(0, 1), 3);
        assert_eq!(pests.established_at(0, 1), 3);
        assert_eq!(pests.dispersers_at(0, 0), 0);
    }

    #[test]
    fn disperser_off_grid_is_recorded_outside() {
        let host = HostPool::new(
            ModelType::Si,
            Raster::from_rows(vec![vec![10, 10]]),
            Raster::from_rows(vec![vec![0, 0]]),
            0,
            1.0,
        )
        .unwrap();
        let mut hosts = vec![host];
        let multi = MultiHostPool::new(vec![0], false);
        let mut pests = PestPool::new(1, 2);
        pests.add_dispersers_at(0, 1, 2);
        let env = Environment::new(1, 2, WeatherType::None);
        let kernel = DispersalKernel::DeterministicNeighbor {
            direction: Direction::E,
            kind: KernelKind::Natural,
        };
        let action = SpreadAction::new(false, false, 1.0);
        let mut rng = SmallRng::seed_from_u64(0);

        action.apply(&mut pests, None, &mut hosts, &multi, &env, &kernel, &mut rng).unwrap();

        assert_eq!(pests.outside_dispersers().len(), 2);
        assert_eq!(hosts[0].infected_at(0, 0), 0);
        assert_eq!(hosts[0].infected_at(0, 1), 0);
    }
}
