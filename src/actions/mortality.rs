use crate::geometry::Cell;
use crate::host::HostPool;

/// Ages the mortality-tracker ring into `died` at every suitable cell.
pub struct MortalityAction {
    pub mortality_rate: f64,
}

impl MortalityAction {
    pub fn new(mortality_rate: f64) -> Self {
        Self { mortality_rate }
    }

    pub fn apply(&self, host: &mut HostPool) -> i64 {
        let cells: Vec<Cell> = host.suitable_cells().iter().collect();
        let mut total_died = 0i64;
        for cell in cells {
            let row = cell.row as usize;
            let col = cell.col as usize;
            total_died += host.apply_mortality_at(row, col, self.mortality_rate);
        }
        total_died
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelType;
    use crate::raster::Raster;

    #[test]
    fn fresh_cohort_only_loses_the_rate_scaled_share() {
        let mut host = HostPool::new(
            ModelType::Si,
            Raster::from_rows(vec![vec![10, 5], vec![5, 3]]),
            Raster::from_rows(vec![vec![0, 0], vec![0, 0]]),
            1,
            1.0,
        )
        .unwrap();
        for _ in 0..3 {
            host.add_disperser_at(0, 0);
        }
        assert_eq!(host.infected_at(0, 0), 3);

        let action = MortalityAction::new(0.5);
        let died = action.apply(&mut host);
        // The newest cohort (not yet aged to the oldest slot) only loses a
        // rate-scaled share: round(0.5 * 3) = 2.
        assert_eq!(died, 2);
        assert_eq!(host.died_at(0, 0), 2);
        assert_eq!(host.infected_at(0, 0), 1);
    }
}
