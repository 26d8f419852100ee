use rand::RngCore;

use crate::error::Result;
use crate::geometry::Cell;
use crate::host::HostPool;
use crate::raster::Raster;

/// Trims infected, exposed, and mortality-tracker cohorts at each cell down
/// to a per-cell survival fraction, returning the rest to susceptible.
pub struct SurvivalRateAction;

impl SurvivalRateAction {
    pub fn apply(&self, host: &mut HostPool, survival_rate: &Raster<f64>, rng: &mut dyn RngCore) -> Result<()> {
        let cells: Vec<Cell> = host.suitable_cells().iter().collect();
        for cell in cells {
            let row = cell.row as usize;
            let col = cell.col as usize;
            host.remove_percentage_at(row, col, survival_rate.get(row, col), rng)?;
        }
        Ok(())
    }
}
