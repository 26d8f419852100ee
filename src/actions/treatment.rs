use rand::RngCore;

use crate::error::Result;
use crate::geometry::Cell;
use crate::host::HostPool;
use crate::raster::Raster;

/// Applies and later reverts pesticide treatment. `apply` and `end` are
/// driven independently by the schedule, once at the treatment's start
/// date and once at its end-of-effect date; the treatment raster (cell
/// intensity in `[0, 1]`, zero meaning untreated) is shared between both
/// calls.
pub struct PesticideTreatmentAction;

impl PesticideTreatmentAction {
    pub fn apply(&self, host: &mut HostPool, treatment: &Raster<f64>, rng: &mut dyn RngCore) -> Result<()> {
        let cells: Vec<Cell> = host.suitable_cells().iter().collect();
        for cell in cells {
            let row = cell.row as usize;
            let col = cell.col as usize;
            let intensity = treatment.get(row, col);
            if intensity > 0.0 {
                host.apply_treatment_at(row, col, intensity, rng)?;
            }
        }
        Ok(())
    }

    pub fn end(&self, host: &mut HostPool, treatment: &Raster<f64>) {
        let cells: Vec<Cell> = host.suitable_cells().iter().collect();
        for cell in cells {
            let row = cell.row as usize;
            let col = cell.col as usize;
            if treatment.get(row, col) > 0.0 {
                host.end_treatment_at(row, col);
            }
        }
    }
}
