use crate::environment::Environment;
use crate::error::Result;
use crate::geometry::Cell;
use crate::host::HostPool;

/// Kills off all infection at cells that dropped below the host's lethal
/// temperature threshold. Runs on its own cadence, independent of any
/// other action.
pub struct LethalTemperatureAction {
    pub threshold: f64,
}

impl LethalTemperatureAction {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn apply(&self, host: &mut HostPool, env: &Environment) -> Result<()> {
        let cells: Vec<Cell> = host.suitable_cells().iter().collect();
        for cell in cells {
            let row = cell.row as usize;
            let col = cell.col as usize;
            if env.temperature_at(row, col)? < self.threshold {
                host.remove_all_infected_at(row, col);
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
    use crate::raster::Raster;

    #[test]
    fn cells_below_threshold_lose_all_infection() {
        let mut host = HostPool::new(
            ModelType::Si,
            Raster::from_rows(vec![vec![10, 10]]),
            Raster::from_rows(vec![vec![4, 4]]),
            0,
            1.0,
        )
        .unwrap();
        let mut env = Environment::new(1, 2, WeatherType::None);
        env.update_temperature(Raster::from_rows(vec![vec![-30.0, 5.0]])).unwrap();

        let action = LethalTemperatureAction::new(-20.0);
        action.apply(&mut host, &env).unwrap();

        assert_eq!(host.infected_at(0, 0), 0);
        assert_eq!(host.susceptible_at(0, 0), 10);
        assert_eq!(host.infected_at(0, 1), 4);
    }
}
